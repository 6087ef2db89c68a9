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

//! Single pass over the document that prepares the model for
//! generation.
//!
//! Order matters: aliases of all references and schemas are known
//! before the vocabulary index is built, out-of-line annotations are
//! merged before the indexes are built so that indexed overloads carry
//! their annotations.

use crate::csdl::element::Element;
use crate::csdl::element::Kind;
use crate::csdl::element::Member;
use crate::csdl::model::BoundOverload;
use crate::csdl::model::Model;
use crate::csdl::qualified_name::QualifiedName;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::CoreTerm;
use crate::vocabulary::VocabularyIndex;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

pub(crate) fn run(model: &mut Model) {
    register_references(model);
    register_schemas(model);
    model.voc = VocabularyIndex::new(&model.aliases);
    merge_annotations(model);
    build_indexes(model);
}

fn register_references(model: &mut Model) {
    for (url, reference) in &model.document.references {
        for include in &reference.includes {
            let qualifier = include.qualifier().to_string();
            let namespace = include.namespace.clone();
            model.aliases.insert(namespace.clone(), qualifier.clone());
            model.namespaces.insert(qualifier, namespace.clone());
            model.namespaces.insert(namespace.clone(), namespace.clone());
            model.namespace_urls.insert(namespace, url.clone());
        }
    }
}

fn register_schemas(model: &mut Model) {
    for (namespace, schema) in &model.document.schemas {
        let qualifier = schema.alias().unwrap_or(namespace).to_string();
        model.aliases.insert(namespace.clone(), qualifier.clone());
        model.namespaces.insert(qualifier, namespace.clone());
        model.namespaces.insert(namespace.clone(), namespace.clone());
    }
}

fn merge_annotations(model: &mut Model) {
    let targets: Vec<(String, Map<String, Value>)> = model
        .document
        .schemas
        .values()
        .filter_map(Element::out_of_line_annotations)
        .flat_map(|annotations| {
            annotations.iter().filter_map(|(target, annotations)| {
                annotations
                    .as_object()
                    .map(|annotations| (target.clone(), annotations.clone()))
            })
        })
        .collect();
    for (target, annotations) in targets {
        if !apply_annotations(model, &target, &annotations) {
            debug!(%target, "Invalid annotation target");
        }
    }
}

/// Merge annotations onto the target. Returns `false` if the target
/// cannot be found.
fn apply_annotations(model: &mut Model, target: &str, annotations: &Map<String, Value>) -> bool {
    let segments: Vec<&str> = target.split('/').collect();
    if segments.len() > 2 {
        debug!(%target, "More than two annotation target path segments");
        return true;
    }
    let first = segments[0];
    let (qualified_name, overload_args) = first
        .find('(')
        .map_or((first, None), |open| {
            let args = first[open + 1..].strip_suffix(')').unwrap_or(&first[open + 1..]);
            (&first[..open], Some(args))
        });
    let qname = QualifiedName::parse(qualified_name);
    let Some(schema_key) = model.schema_key(qname.qualifier).map(ToString::to_string) else {
        return false;
    };
    let Some(member) = model
        .document
        .schemas
        .get_mut(&schema_key)
        .and_then(|schema| schema.member_mut(qname.name))
    else {
        return false;
    };
    let second = segments.get(1).copied();
    match (member, overload_args) {
        (Member::Element(element), None) => apply_to_element(element, second, annotations),
        (Member::Overloads(overloads), None) => overloads
            .iter_mut()
            .fold(false, |found, overload| {
                apply_to_element(overload, second, annotations) || found
            }),
        (Member::Overloads(overloads), Some(args)) => overloads
            .iter_mut()
            .find(|overload| overload_matches(overload, args))
            .is_some_and(|overload| apply_to_element(overload, second, annotations)),
        (Member::Element(_) | Member::Value(_), _) => false,
    }
}

fn apply_to_element(
    element: &mut Element,
    segment: Option<&str>,
    annotations: &Map<String, Value>,
) -> bool {
    let Some(segment) = segment else {
        element.merge_annotations(annotations);
        return true;
    };
    let target = if element.kind().is_operation() {
        if segment == "$ReturnType" {
            element.return_type_mut()
        } else {
            element.parameter_mut(segment)
        }
    } else {
        match element.member_mut(segment) {
            Some(Member::Element(e)) => Some(e),
            _ => None,
        }
    };
    target.map_or(false, |target| {
        target.merge_annotations(annotations);
        true
    })
}

/// Overload selected by the parenthesized parameter type list of an
/// annotation target.
fn overload_matches(overload: &Element, args: &str) -> bool {
    let is_action = overload.kind() == Kind::Action;
    if is_action && !overload.is_bound() && args.is_empty() {
        return true;
    }
    if is_action
        && overload
            .parameters()
            .first()
            .is_some_and(|binding| parameter_type(binding, "") == args)
    {
        return true;
    }
    overload
        .parameters()
        .iter()
        .map(|p| parameter_type(p, "Edm.String"))
        .collect::<Vec<_>>()
        .join(",")
        == args
}

fn parameter_type(parameter: &Element, default: &str) -> String {
    let type_name = parameter.type_name().unwrap_or(default);
    if parameter.is_collection() {
        format!("Collection({type_name})")
    } else {
        type_name.to_string()
    }
}

fn build_indexes(model: &mut Model) {
    let mut bound_overloads: Vec<(String, BoundOverload)> = Vec::new();
    let mut derived_types: Vec<(String, String)> = Vec::new();
    for (namespace, schema) in &model.document.schemas {
        let qualifier = schema.alias().unwrap_or(namespace);
        let is_default_namespace = schema.has_term(&model.voc, CoreTerm::DefaultNamespace);
        for (name, member) in schema.members() {
            let qualified_name = format!("{qualifier}.{name}");
            match member {
                Member::Overloads(overloads) => {
                    for (index, overload) in overloads.iter().enumerate() {
                        let Some(binding) = overload
                            .parameters()
                            .first()
                            .filter(|_| overload.is_bound())
                        else {
                            continue;
                        };
                        let binding_type = format!(
                            "{}{}",
                            binding.type_name().unwrap_or_default(),
                            if binding.is_collection() { "-c" } else { "" }
                        );
                        bound_overloads.push((
                            model.binding_key(&binding_type),
                            BoundOverload {
                                name: if is_default_namespace {
                                    name.clone()
                                } else {
                                    qualified_name.clone()
                                },
                                schema: namespace.clone(),
                                member: name.clone(),
                                index,
                            },
                        ));
                    }
                }
                Member::Element(element) => {
                    if let Some(base) = element.base_type() {
                        derived_types.push((model.namespace_qualified_name(base), qualified_name));
                    }
                }
                Member::Value(_) => (),
            }
        }
    }
    for (key, bound) in bound_overloads {
        model.bound_overloads.entry(key).or_default().push(bound);
    }
    for (base, derived) in derived_types {
        model.derived_types.entry(base).or_default().push(derived);
    }
}

#[cfg(test)]
mod test {
    use crate::csdl::document::Document;
    use crate::csdl::model::Model;
    use crate::vocabulary::annotations::Annotations as _;
    use serde_json::json;
    use serde_json::Value;

    fn model(csdl: &Value) -> Model {
        Model::new(Document::parse(csdl))
    }

    #[test]
    fn test_annotations_merged_onto_targets() {
        let m = model(&json!({
            "$Reference": {
                "core.json": { "$Include": [{ "$Namespace": "Org.OData.Core.V1", "$Alias": "Core" }] }
            },
            "n": {
                "$Alias": "self",
                "Order": { "$Kind": "EntityType", "ID": {} },
                "Container": { "$Kind": "EntityContainer", "Orders": { "$Collection": true, "$Type": "n.Order" } },
                "$Annotations": {
                    "self.Order": { "@Core.Description": "Order" },
                    "n.Order/ID": { "@Core.Computed": true },
                    "n.Container/Orders": { "@Core.LongDescription": "All orders" },
                    "n.Order/ID/deeper": { "@Core.Immutable": true },
                    "n.Missing": { "@Core.Immutable": true },
                }
            }
        }));
        let voc = m.voc();
        let order = m.element("n.Order").expect("order");
        assert_eq!(order.description(voc), Some("Order"));
        assert!(order.element("ID").is_some_and(|id| id.annotation("@Core.Computed").is_some()));
        assert!(order.element("ID").is_some_and(|id| id.annotation("@Core.Immutable").is_none()));
        let orders = m
            .element("n.Container")
            .and_then(|c| c.element("Orders"))
            .expect("orders");
        assert_eq!(orders.long_description(voc), Some("All orders"));
    }

    #[test]
    fn test_annotations_on_overloads() {
        let m = model(&json!({
            "n": {
                "Order": { "$Kind": "EntityType" },
                "approve": [
                    { "$Kind": "Action", "$IsBound": true, "$Parameter": [{ "$Name": "in", "$Type": "n.Order" }, { "$Name": "note" }] },
                    { "$Kind": "Action", "$Parameter": [{ "$Name": "note" }] },
                ],
                "top": [
                    { "$Kind": "Function", "$Parameter": [{ "$Name": "n", "$Type": "Edm.Int32" }], "$ReturnType": { "$Type": "n.Order", "$Collection": true } },
                ],
                "$Annotations": {
                    "n.approve(n.Order)": { "@Core.Description": "Bound" },
                    "n.approve()": { "@Core.Description": "Unbound" },
                    "n.approve(n.Order)/note": { "@Core.Description": "Note" },
                    "n.top(Edm.Int32)/$ReturnType": { "@Core.Description": "Top orders" },
                    "n.top/n": { "@Core.LongDescription": "Number of orders" },
                }
            }
        }));
        let approve = m.overloads("n.approve").expect("approve");
        assert_eq!(approve[0].annotation("@Core.Description"), Some(&json!("Bound")));
        assert_eq!(approve[1].annotation("@Core.Description"), Some(&json!("Unbound")));
        assert_eq!(
            approve[0].parameters()[1].annotation("@Core.Description"),
            Some(&json!("Note"))
        );
        let top = &m.overloads("n.top").expect("top")[0];
        assert_eq!(
            top.return_type()
                .and_then(|r| r.annotation("@Core.Description")),
            Some(&json!("Top orders"))
        );
        assert_eq!(
            top.parameters()[0].annotation("@Core.LongDescription"),
            Some(&json!("Number of orders"))
        );
    }

    #[test]
    fn test_bound_overload_index() {
        let m = model(&json!({
            "$Reference": {
                "core.json": { "$Include": [{ "$Namespace": "Org.OData.Core.V1", "$Alias": "Core" }] }
            },
            "n": {
                "$Alias": "self",
                "Order": { "$Kind": "EntityType" },
                "cancel": [{ "$Kind": "Action", "$IsBound": true, "$Parameter": [{ "$Name": "in", "$Type": "self.Order" }] }],
                "count": [{ "$Kind": "Function", "$IsBound": true, "$Parameter": [{ "$Name": "in", "$Type": "n.Order", "$Collection": true }] }],
            },
            "d": {
                "@Core.DefaultNamespace": true,
                "close": [{ "$Kind": "Action", "$IsBound": true, "$Parameter": [{ "$Name": "in", "$Type": "n.Order" }] }],
            }
        }));
        let single: Vec<_> = m.bound_overloads("n.Order").map(|(name, _)| name).collect();
        assert_eq!(single, ["self.cancel", "close"]);
        let collection: Vec<_> = m
            .bound_overloads("self.Order-c")
            .map(|(name, _)| name)
            .collect();
        assert_eq!(collection, ["self.count"]);
    }
}
