// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Paths of actions, functions and batch requests.

use crate::csdl::qualified_name::simple_name;
use crate::csdl::Element;
use crate::csdl::Kind;
use crate::openapi::context::Context;
use crate::openapi::extensions;
use crate::openapi::naming::normalise_tag;
use crate::openapi::paths::ByKey;
use crate::openapi::paths::Paths;
use crate::openapi::paths::Segment;
use crate::openapi::query_options::PROTOCOL;
use crate::openapi::responses::custom_parameters;
use crate::openapi::responses::error_response_reference;
use crate::openapi::responses::Countable;
use crate::openapi::schema::Usage;
use crate::openapi::Generator;
use crate::openapi::SchemaSuffix;
use crate::vocabulary::annotations::is_truthy;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::capabilities::BatchSupport;
use crate::vocabulary::capabilities::OperationRestrictions;
use crate::vocabulary::CapabilitiesTerm;
use crate::vocabulary::CoreTerm;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

/// Parameter names that need an `@` prefix to not be taken for system
/// query options.
const SYSTEM_QUERY_OPTIONS: &[&str] = &[
    "compute",
    "expand",
    "select",
    "filter",
    "search",
    "count",
    "orderby",
    "skip",
    "top",
    "format",
    "index",
    "schemaversion",
    "skiptoken",
    "apply",
];

const LITERALS: &str = "https://docs.oasis-open.org/odata/odata/v4.01/odata-v4.01-part2-url-conventions.html#sec_ComplexandCollectionLiterals";

/// Action or function import the operation is invoked through.
#[derive(Clone, Copy)]
struct Invocation<'a> {
    prefix_parameters: &'a [Value],
    source_name: Option<&'a str>,
    import: Option<&'a Element>,
}

fn append_description(parameter: &mut Map<String, Value>, text: &str) {
    match parameter.get_mut("description") {
        Some(Value::String(description)) => {
            description.push_str("  \n");
            description.push_str(text);
        }
        _ => {
            parameter.insert("description".into(), text.into());
        }
    }
}

/// Parameters of an overload without the binding parameter.
fn unbound_parameters(overload: &Element) -> &[Element] {
    let parameters = overload.parameters();
    if overload.is_bound() {
        parameters.get(1..).unwrap_or_default()
    } else {
        parameters
    }
}

impl<'a> Generator<'a> {
    /// Paths of the actions and functions bound to a resource.
    pub(crate) fn bound_operations(
        &self,
        ctx: &mut Context,
        paths: &mut Paths,
        segment: &Segment<'_>,
        by_key: ByKey,
    ) {
        let element = segment.element;
        if element.kind() == Kind::NavigationProperty {
            return;
        }
        let Some(type_name) = element.type_name() else {
            return;
        };
        let binding = if !by_key.into_inner() && element.is_collection() {
            format!("{type_name}-c")
        } else {
            type_name.to_string()
        };
        let invocation = Invocation {
            prefix_parameters: &segment.parameters,
            source_name: Some(segment.source_name.as_str()),
            import: None,
        };
        for (name, overload) in self.model.bound_overloads(&binding) {
            let prefix = format!("{}/{name}", segment.prefix);
            if overload.kind() == Kind::Action {
                self.action_path_item(ctx, paths, prefix, name, overload, invocation);
            } else {
                self.function_path_item(ctx, paths, &prefix, name, overload, invocation);
            }
        }
    }

    pub(crate) fn action_import(&self, ctx: &mut Context, paths: &mut Paths, name: &str, import: &Element) {
        let Some(action) = import.action() else {
            return;
        };
        let overload = self
            .model
            .overloads(action)
            .and_then(|overloads| overloads.iter().find(|o| !o.is_bound()));
        let Some(overload) = overload else {
            debug!(name, action, "Unknown action in action import");
            return;
        };
        let invocation = Invocation {
            prefix_parameters: &[],
            source_name: import.entity_set(),
            import: Some(import),
        };
        self.action_path_item(ctx, paths, format!("/{name}"), action, overload, invocation);
    }

    pub(crate) fn function_import(&self, ctx: &mut Context, paths: &mut Paths, name: &str, import: &Element) {
        let Some(function) = import.function() else {
            return;
        };
        let Some(overloads) = self.model.overloads(function) else {
            debug!(name, function, "Unknown function in function import");
            return;
        };
        let invocation = Invocation {
            prefix_parameters: &[],
            source_name: import.entity_set(),
            import: Some(import),
        };
        let prefix = format!("/{name}");
        for overload in overloads.iter().filter(|o| !o.is_bound()) {
            self.function_path_item(ctx, paths, &prefix, function, overload, invocation);
        }
    }

    /// Summary and description of an invocation. Annotations of the
    /// import take precedence over those of the overload.
    fn invocation_texts(&self, overload: &Element, import: Option<&Element>) -> (Option<String>, Option<String>) {
        let summary = import
            .and_then(|i| i.description(self.voc))
            .or_else(|| overload.description(self.voc))
            .map(ToString::to_string);
        let description = import
            .and_then(|i| i.long_description(self.voc))
            .or_else(|| overload.long_description(self.voc))
            .map(ToString::to_string);
        (summary, description)
    }

    fn invocation_tags(&self, overload: &Element, source_name: Option<&str>) -> Value {
        let tag = overload
            .label(self.voc)
            .or(source_name)
            .unwrap_or("Service Operations");
        json!([normalise_tag(tag)])
    }

    fn action_path_item(
        &self,
        ctx: &mut Context,
        paths: &mut Paths,
        prefix: String,
        action_name: &str,
        overload: &Element,
        invocation: Invocation<'_>,
    ) {
        let name = simple_name(action_name);
        let restrictions: OperationRestrictions = overload
            .term_record(self.voc, CapabilitiesTerm::OperationRestrictions)
            .unwrap_or_default();
        let (summary, description) = self.invocation_texts(overload, invocation.import);
        let responses = match overload.return_type() {
            Some(return_type) => self.response(
                ctx,
                200,
                "Success",
                Some(return_type),
                restrictions.details.error_responses(),
                Countable::new(true),
            ),
            None => self.response(
                ctx,
                204,
                "Success",
                None,
                restrictions.details.error_responses(),
                Countable::new(true),
            ),
        };

        let mut operation = Map::new();
        operation.insert(
            "summary".into(),
            summary.unwrap_or_else(|| format!("Invokes action {name}")).into(),
        );
        operation.insert("tags".into(), self.invocation_tags(overload, invocation.source_name));
        operation.insert("responses".into(), responses.into());
        operation.extend(extensions::extensions(overload.annotations()));
        if let Some(description) = description {
            operation.insert("description".into(), description.into());
        }
        if !invocation.prefix_parameters.is_empty() {
            operation.insert("parameters".into(), invocation.prefix_parameters.to_vec().into());
        }
        let parameters = unbound_parameters(overload);
        let request_body = if parameters.is_empty() {
            json!({
                "required": false,
                "content": { "application/json": { "schema": { "type": "object" } } }
            })
        } else {
            let properties: Map<String, Value> = parameters
                .iter()
                .map(|p| {
                    (
                        p.name().to_string(),
                        self.schema(ctx, p, SchemaSuffix::Read, Usage::Value),
                    )
                })
                .collect();
            json!({
                "description": "Action parameters",
                "content": {
                    "application/json": {
                        "schema": { "type": "object", "properties": properties }
                    }
                }
            })
        };
        operation.insert("requestBody".into(), request_body);
        custom_parameters(&mut operation, &restrictions.details);

        let mut item = Map::new();
        item.insert("post".into(), operation.into());
        paths.insert(prefix, item);
    }

    fn function_path_item(
        &self,
        ctx: &mut Context,
        paths: &mut Paths,
        prefix: &str,
        function_name: &str,
        overload: &Element,
        invocation: Invocation<'_>,
    ) {
        let name = simple_name(function_name);
        let parameters = unbound_parameters(overload);
        let is_optional = |p: &Element| {
            p.term(self.voc, CoreTerm::OptionalParameter)
                .is_some_and(is_truthy)
        };
        let implicit_aliases = self.version() > "4.0" || parameters.iter().any(is_optional);
        let escape_system_names = implicit_aliases && self.version() != "2.0";

        let mut segments = Vec::new();
        let mut function_parameters = Vec::new();
        for p in parameters {
            let p_name = p.name();
            let system_name = escape_system_names
                && SYSTEM_QUERY_OPTIONS.contains(&p_name.to_lowercase().as_str());
            let type_name = p.type_name().unwrap_or("Edm.String");
            let t = self.model.element(type_name);
            let structured = p.is_collection()
                || type_name == "Edm.Stream"
                || t.is_some_and(|t| {
                    t.kind().is_structured() || t.underlying_type() == Some("Edm.Stream")
                });

            let mut parameter = Map::new();
            if let Some(description) = p.any_description(self.voc) {
                parameter.insert("description".into(), description.into());
            }
            parameter.insert(
                "required".into(),
                (!implicit_aliases || !is_optional(p)).into(),
            );
            if structured {
                let parameter_name = if system_name {
                    format!("@{p_name}")
                } else if implicit_aliases {
                    p_name.to_string()
                } else {
                    segments.push(format!("{p_name}=@{p_name}"));
                    format!("@{p_name}")
                };
                parameter.insert("in".into(), "query".into());
                parameter.insert("name".into(), parameter_name.into());
                parameter.insert("schema".into(), json!({ "type": "string" }));
                let collection = p.is_collection();
                append_description(
                    &mut parameter,
                    &format!(
                        "This is {}URL-encoded JSON {}of type {}, see [Complex and Collection Literals]({LITERALS})",
                        if collection { "a " } else { "" },
                        if collection { "array with items " } else { "" },
                        self.model.namespace_qualified_name(type_name),
                    ),
                );
                parameter.insert("example".into(), if collection { "[]" } else { "{}" }.into());
            } else {
                if implicit_aliases {
                    parameter.insert("in".into(), "query".into());
                } else {
                    segments.push(format!("{p_name}={{{p_name}}}"));
                    parameter.insert("in".into(), "path".into());
                }
                let parameter_name = if system_name {
                    format!("@{p_name}")
                } else {
                    p_name.to_string()
                };
                parameter.insert("name".into(), parameter_name.into());
                let string_literal = matches!(p.type_name(), None | Some("Edm.String"))
                    || t.is_some_and(|t| matches!(t.type_name(), None | Some("Edm.String")));
                if string_literal {
                    append_description(&mut parameter, "String value needs to be enclosed in single quotes");
                }
                parameter.insert(
                    "schema".into(),
                    self.schema(ctx, p, SchemaSuffix::Read, Usage::FunctionParameter),
                );
            }
            function_parameters.push(Value::Object(parameter));
        }

        let restrictions: OperationRestrictions = overload
            .term_record(self.voc, CapabilitiesTerm::OperationRestrictions)
            .unwrap_or_default();
        let (summary, description) = self.invocation_texts(overload, invocation.import);
        let mut all_parameters = invocation.prefix_parameters.to_vec();
        all_parameters.extend(function_parameters);

        let mut operation = Map::new();
        operation.insert(
            "summary".into(),
            summary.unwrap_or_else(|| format!("Invokes function {name}")).into(),
        );
        operation.insert("tags".into(), self.invocation_tags(overload, invocation.source_name));
        operation.insert("parameters".into(), all_parameters.into());
        operation.insert(
            "responses".into(),
            self.response(
                ctx,
                200,
                "Success",
                overload.return_type(),
                restrictions.details.error_responses(),
                Countable::new(true),
            )
            .into(),
        );
        operation.extend(extensions::extensions(overload.annotations()));
        if let Some(description) = description {
            operation.insert("description".into(), description.into());
        }
        custom_parameters(&mut operation, &restrictions.details);

        let path = if implicit_aliases {
            prefix.to_string()
        } else {
            format!("{prefix}({})", segments.join(","))
        };
        let mut item = Map::new();
        item.insert("get".into(), operation.into());
        paths.insert(path, item);
    }

    /// Path of batch requests unless the container disables them.
    pub(crate) fn batch(&self, paths: &mut Paths, container: &Element) {
        let support: BatchSupport = container
            .term_record(self.voc, CapabilitiesTerm::BatchSupport)
            .unwrap_or_default();
        let supported = !container.term_is_false(self.voc, CapabilitiesTerm::BatchSupported)
            && support.supported != Some(false);
        if !supported {
            return;
        }
        let first_entity_set = container
            .elements()
            .find(|(_, child)| child.is_collection())
            .map_or("", |(name, _)| name.as_str());
        let summary = support
            .description(self.voc)
            .unwrap_or("Sends a group of requests");
        let description = support.long_description(self.voc).map_or_else(
            || {
                format!(
                    "Group multiple requests into a single request payload, see \
                     [Batch Requests]({PROTOCOL}#sec_BatchRequests)."
                )
            },
            ToString::to_string,
        );
        let success = if self.version() < "4.0" { "202" } else { "200" };

        let mut responses = Map::new();
        responses.insert(
            success.into(),
            json!({
                "description": "Batch response",
                "content": {
                    "multipart/mixed": {
                        "schema": { "type": "string" },
                        "example": "--response-separator\nContent-Type: application/http\n\nHTTP/1.1 200 OK\nContent-Type: application/json\n\n{...}\n--response-separator--"
                    }
                }
            }),
        );
        responses.insert("4XX".into(), error_response_reference());
        let operation = json!({
            "summary": summary,
            "description": format!("{description}\n\n*Please note that \"Try it out\" is not supported for this request.*"),
            "tags": [normalise_tag("Batch Requests")],
            "requestBody": {
                "required": true,
                "description": "Batch request",
                "content": {
                    "multipart/mixed;boundary=request-separator": {
                        "schema": { "type": "string" },
                        "example": format!(
                            "--request-separator\nContent-Type: application/http\nContent-Transfer-Encoding: binary\n\n\
                             GET {first_entity_set} HTTP/1.1\nAccept: application/json\n\n\n--request-separator--"
                        )
                    }
                }
            },
            "responses": responses
        });
        let mut item = Map::new();
        item.insert("post".into(), operation);
        paths.insert("/$batch".into(), item);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Options;
    use crate::openapi::test::generate;
    use crate::openapi::test::generate_with;
    use pretty_assertions::assert_eq;

    fn service(version: &str) -> Value {
        json!({
            "$Version": version,
            "$EntityContainer": "self.Container",
            "self": {
                "Order": {
                    "$Kind": "EntityType",
                    "$Key": ["ID"],
                    "ID": { "$Type": "Edm.Int32" }
                },
                "Address": { "$Kind": "ComplexType", "street": {} },
                "approve": [{
                    "$Kind": "Action",
                    "$IsBound": true,
                    "$Parameter": [
                        { "$Name": "in", "$Type": "self.Order" },
                        { "$Name": "comment" }
                    ]
                }],
                "reset": [{ "$Kind": "Action" }],
                "find": [{
                    "$Kind": "Function",
                    "$Parameter": [
                        { "$Name": "name" },
                        { "$Name": "top", "$Type": "Edm.Int32" },
                        { "$Name": "address", "$Type": "self.Address" }
                    ],
                    "$ReturnType": { "$Type": "self.Order", "$Collection": true }
                }],
                "Container": {
                    "$Kind": "EntityContainer",
                    "Orders": { "$Collection": true, "$Type": "self.Order" },
                    "Reset": { "$Action": "self.reset" },
                    "Find": { "$Function": "self.find", "$EntitySet": "Orders" }
                }
            }
        })
    }

    #[test]
    fn test_bound_action() {
        let openapi = generate(&service("4.01"));
        let post = &openapi["paths"]["/Orders({ID})/self.approve"]["post"];
        assert_eq!(post["summary"], "Invokes action approve");
        assert_eq!(post["tags"], json!(["Orders"]));
        assert_eq!(post["parameters"][0]["name"], "ID");
        assert_eq!(
            post["requestBody"]["content"]["application/json"]["schema"]["properties"]["comment"],
            json!({ "type": "string" })
        );
        assert_eq!(post["responses"]["204"], json!({ "description": "Success" }));
    }

    #[test]
    fn test_action_import_without_parameters() {
        let openapi = generate(&service("4.01"));
        let post = &openapi["paths"]["/Reset"]["post"];
        assert_eq!(post["tags"], json!(["Service Operations"]));
        assert_eq!(post["requestBody"]["required"], false);
    }

    #[test]
    fn test_function_import_implicit_aliases() {
        let openapi = generate(&service("4.01"));
        let get = &openapi["paths"]["/Find"]["get"];
        assert_eq!(get["tags"], json!(["Orders"]));
        let parameters = get["parameters"].as_array().expect("parameters");
        assert_eq!(parameters[0]["in"], "query");
        assert_eq!(parameters[0]["name"], "name");
        assert_eq!(parameters[0]["description"], "String value needs to be enclosed in single quotes");
        assert_eq!(parameters[1]["name"], "@top");
        assert_eq!(parameters[2]["name"], "address");
        assert_eq!(parameters[2]["example"], "{}");
    }

    #[test]
    fn test_function_import_path_parameters() {
        let options = Options {
            odata_version: "4.0".into(),
            ..Options::default()
        };
        let openapi = generate_with(&service("4.0"), &options);
        let paths = openapi["paths"].as_object().expect("paths");
        assert!(paths.contains_key("/Find(name={name},top={top},address=@address)"));
        let get = &paths["/Find(name={name},top={top},address=@address)"]["get"];
        assert_eq!(get["parameters"][0]["in"], "path");
        assert_eq!(get["parameters"][2]["name"], "@address");
    }

    #[test]
    fn test_batch() {
        let openapi = generate(&service("4.01"));
        let post = &openapi["paths"]["/$batch"]["post"];
        assert_eq!(post["tags"], json!(["Batch Requests"]));
        let responses: Vec<_> = post["responses"]
            .as_object()
            .expect("responses")
            .keys()
            .cloned()
            .collect();
        assert_eq!(responses, ["200", "4XX"]);
        let example = post["requestBody"]["content"]["multipart/mixed;boundary=request-separator"]["example"]
            .as_str()
            .expect("example");
        assert!(example.contains("GET Orders HTTP/1.1"));
    }
}
