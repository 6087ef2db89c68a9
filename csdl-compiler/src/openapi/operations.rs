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

//! Read, create, update and delete operations of a path.

use crate::csdl::Element;
use crate::openapi::context::Context;
use crate::openapi::naming::camel_case_to_words;
use crate::openapi::naming::normalise_tag;
use crate::openapi::naming::singular;
use crate::openapi::paths::ByKey;
use crate::openapi::paths::Segment;
use crate::openapi::responses::custom_parameters;
use crate::openapi::responses::Countable;
use crate::openapi::Generator;
use crate::openapi::SchemaSuffix;
use crate::vocabulary::annotations::is_truthy;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::capabilities::ChangeTracking;
use crate::vocabulary::capabilities::CountRestrictions;
use crate::vocabulary::capabilities::DeleteRestrictions;
use crate::vocabulary::capabilities::InsertRestrictions;
use crate::vocabulary::capabilities::NavigationPropertyRestriction;
use crate::vocabulary::capabilities::ReadRestrictions;
use crate::vocabulary::capabilities::UpdateRestrictions;
use crate::vocabulary::CapabilitiesTerm;
use crate::vocabulary::CoreTerm;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

/// Summary of an operation, e.g. `Retrieves a single order of a customer.`
pub(crate) fn summary(verb: &str, name: &str, source_name: &str, level: usize, collection: bool, by_key: bool) -> String {
    let lname = camel_case_to_words(name);
    let sname = camel_case_to_words(source_name);
    let article = if by_key {
        "a single "
    } else if collection {
        "a list of "
    } else {
        ""
    };
    let object = if by_key { singular(&lname) } else { lname };
    let of = match level {
        0 => String::new(),
        1 if sname == "me" => " of me".into(),
        _ => format!(" of a {}", singular(&sname)),
    };
    format!("{verb} {article}{object}{of}.")
}

impl Generator<'_> {
    /// Count property in responses unless the target is not countable.
    fn countable(&self, target: Option<&Element>) -> Countable {
        Countable::new(
            !self
                .target_record::<CountRestrictions>(target, CapabilitiesTerm::CountRestrictions)
                .is_some_and(|r| r.is_not_countable()),
        )
    }

    fn push_target_tag(operation: &mut Map<String, Value>, segment: &Segment<'_>) {
        let Some(target_name) = &segment.target_name else {
            return;
        };
        if *target_name == segment.source_name {
            return;
        }
        if let Some(Value::Array(tags)) = operation.get_mut("tags") {
            tags.push(normalise_tag(target_name).into());
        }
    }

    pub(crate) fn operation_read(
        &self,
        ctx: &mut Context,
        item: &mut Map<String, Value>,
        segment: &Segment<'_>,
        restrictions: &NavigationPropertyRestriction,
        by_key: ByKey,
        non_expandable: &[String],
    ) {
        let by_key = by_key.into_inner();
        let element = segment.element;
        let target = segment.target;
        let target_read: Option<ReadRestrictions> =
            self.target_record(target, CapabilitiesTerm::ReadRestrictions);
        let read = restrictions
            .read_restrictions
            .clone()
            .or_else(|| target_read.clone())
            .unwrap_or_default();
        let read_by_key = read.read_by_key_restrictions.as_deref();
        let readable = match read_by_key.and_then(|r| r.readable) {
            Some(readable) if by_key => readable,
            _ => read.readable.unwrap_or(true),
        };
        if !readable {
            return;
        }

        let descriptions = if segment.level == 0 {
            target_read
        } else {
            restrictions.read_restrictions.clone()
        }
        .unwrap_or_default();
        let descriptions = if by_key {
            descriptions
                .read_by_key_restrictions
                .map(|r| *r)
                .unwrap_or_default()
        } else {
            descriptions
        };
        let details = if by_key {
            read_by_key.map_or(&read.details, |r| &r.details)
        } else {
            &read.details
        };
        let errors = if by_key {
            read_by_key.and_then(|r| r.details.error_responses())
        } else {
            read.details.error_responses()
        };

        let name = segment.name();
        let lname = camel_case_to_words(name);
        let collection = !by_key && element.is_collection();
        let payload = Element::typed(element.type_name(), collection);
        let read_summary = descriptions.details.description().map_or_else(
            || summary("Retrieves", name, &segment.source_name, segment.level, element.is_collection(), by_key),
            ToString::to_string,
        );
        let retrieved = if by_key { singular(&lname) } else { lname };
        let mut responses = self.response(
            ctx,
            200,
            &format!("Retrieved {retrieved}"),
            Some(&payload),
            errors,
            self.countable(target),
        );
        let delta_supported = element
            .term_record::<ChangeTracking, _>(self.voc, CapabilitiesTerm::ChangeTracking)
            .and_then(|r| r.supported)
            .unwrap_or(false);
        if !by_key && delta_supported {
            let properties = responses
                .get_mut("200")
                .and_then(|r| r.pointer_mut("/content/application~1json/schema/properties"))
                .and_then(Value::as_object_mut);
            match properties {
                Some(properties) => {
                    properties.insert(
                        "@odata.deltaLink".into(),
                        json!({
                            "type": "string",
                            "example": format!(
                                "{}/{name}?$deltatoken=opaque server-generated token for fetching the delta",
                                self.options.base_path
                            )
                        }),
                    );
                }
                None => debug!(name, "Change tracking on a resource without collection response"),
            }
        }

        let mut operation = Map::new();
        operation.insert("summary".into(), read_summary.into());
        operation.insert("tags".into(), json!([normalise_tag(&segment.source_name)]));
        operation.insert("parameters".into(), Value::Array(Vec::new()));
        operation.insert("responses".into(), responses.into());
        if let Some(description) = descriptions.details.long_description() {
            operation.insert("description".into(), description.into());
        }
        if target.is_some() {
            Self::push_target_tag(&mut operation, segment);
        }
        custom_parameters(&mut operation, details);

        if let Some(Value::Array(parameters)) = operation.get_mut("parameters") {
            if collection {
                self.option_top(parameters, target, restrictions);
                self.option_skip(parameters, target, restrictions);
                if self.version() >= "4.0" {
                    self.option_search(parameters, target, restrictions);
                }
                self.option_filter(parameters, target, restrictions);
                self.option_count(parameters, target);
                self.option_orderby(parameters, element, target, restrictions);
            }
            self.option_select(parameters, element, target, restrictions);
            self.option_expand(parameters, element, target, non_expandable);
        }
        item.insert("get".into(), operation.into());
    }

    pub(crate) fn operation_create(
        &self,
        ctx: &mut Context,
        item: &mut Map<String, Value>,
        segment: &Segment<'_>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let target = segment.target;
        let insert: InsertRestrictions = restrictions
            .insert_restrictions
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::InsertRestrictions))
            .unwrap_or_default();
        if insert.insertable == Some(false) {
            return;
        }
        let Some(type_name) = segment.element.type_name() else {
            debug!(path = segment.prefix, "Untyped collection is not insertable");
            return;
        };
        let name = segment.name();
        let lname = singular(&camel_case_to_words(name));
        let request_description = self
            .model
            .element(type_name)
            .and_then(|t| t.description(self.voc))
            .map_or_else(|| format!("New {lname}"), ToString::to_string);
        let payload = Element::typed(Some(type_name), false);

        let mut operation = Map::new();
        operation.insert(
            "summary".into(),
            insert
                .details
                .description()
                .map_or_else(
                    || summary("Creates", name, &segment.source_name, segment.level, true, true),
                    ToString::to_string,
                )
                .into(),
        );
        operation.insert("tags".into(), json!([normalise_tag(&segment.source_name)]));
        operation.insert(
            "requestBody".into(),
            json!({
                "description": request_description,
                "required": true,
                "content": {
                    "application/json": {
                        "schema": self.reference(ctx, type_name, SchemaSuffix::Create)
                    }
                }
            }),
        );
        operation.insert(
            "responses".into(),
            self.response(
                ctx,
                201,
                &format!("Created {lname}"),
                Some(&payload),
                insert.details.error_responses(),
                self.countable(target),
            )
            .into(),
        );
        if let Some(description) = insert.details.long_description() {
            operation.insert("description".into(), description.into());
        }
        Self::push_target_tag(&mut operation, segment);
        custom_parameters(&mut operation, &insert.details);
        item.insert("post".into(), operation.into());
    }

    pub(crate) fn operation_update(
        &self,
        ctx: &mut Context,
        item: &mut Map<String, Value>,
        segment: &Segment<'_>,
        restrictions: &NavigationPropertyRestriction,
        by_key: ByKey,
    ) {
        let element = segment.element;
        let target = segment.target;
        let update: UpdateRestrictions = restrictions
            .update_restrictions
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::UpdateRestrictions))
            .unwrap_or_default();
        let immutable = element
            .term(self.voc, CoreTerm::Immutable)
            .is_some_and(is_truthy);
        if update.updatable == Some(false) || immutable {
            return;
        }
        let Some(type_name) = element.type_name() else {
            debug!(path = segment.prefix, "Untyped resource is not updatable");
            return;
        };
        let request_description = self
            .model
            .element(type_name)
            .and_then(|t| t.description(self.voc))
            .unwrap_or("New property values");

        let mut operation = Map::new();
        operation.insert(
            "summary".into(),
            update
                .details
                .description()
                .map_or_else(
                    || {
                        summary(
                            "Changes",
                            segment.name(),
                            &segment.source_name,
                            segment.level,
                            element.is_collection(),
                            by_key.into_inner(),
                        )
                    },
                    ToString::to_string,
                )
                .into(),
        );
        operation.insert("tags".into(), json!([normalise_tag(&segment.source_name)]));
        operation.insert(
            "requestBody".into(),
            json!({
                "description": request_description,
                "required": true,
                "content": {
                    "application/json": {
                        "schema": self.reference(ctx, type_name, SchemaSuffix::Update)
                    }
                }
            }),
        );
        operation.insert(
            "responses".into(),
            self.response(
                ctx,
                204,
                "Success",
                None,
                update.details.error_responses(),
                self.countable(target),
            )
            .into(),
        );
        if let Some(description) = update.details.long_description() {
            operation.insert("description".into(), description.into());
        }
        custom_parameters(&mut operation, &update.details);
        item.insert(update.method(), operation.into());
    }

    pub(crate) fn operation_delete(
        &self,
        ctx: &mut Context,
        item: &mut Map<String, Value>,
        segment: &Segment<'_>,
        restrictions: &NavigationPropertyRestriction,
        by_key: ByKey,
    ) {
        let target = segment.target;
        let delete: DeleteRestrictions = restrictions
            .delete_restrictions
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::DeleteRestrictions))
            .unwrap_or_default();
        if delete.deletable == Some(false) {
            return;
        }
        let mut operation = Map::new();
        operation.insert(
            "summary".into(),
            delete
                .details
                .description()
                .map_or_else(
                    || {
                        summary(
                            "Deletes",
                            segment.name(),
                            &segment.source_name,
                            segment.level,
                            segment.element.is_collection(),
                            by_key.into_inner(),
                        )
                    },
                    ToString::to_string,
                )
                .into(),
        );
        operation.insert("tags".into(), json!([normalise_tag(&segment.source_name)]));
        operation.insert(
            "responses".into(),
            self.response(
                ctx,
                204,
                "Success",
                None,
                delete.details.error_responses(),
                self.countable(target),
            )
            .into(),
        );
        if let Some(description) = delete.details.long_description() {
            operation.insert("description".into(), description.into());
        }
        custom_parameters(&mut operation, &delete.details);
        item.insert("delete".into(), operation.into());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::openapi::test::generate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary() {
        assert_eq!(
            summary("Retrieves", "SalesOrders", "SalesOrders", 0, true, false),
            "Retrieves a list of sales orders."
        );
        assert_eq!(
            summary("Retrieves", "SalesOrders", "SalesOrders", 0, true, true),
            "Retrieves a single sales order."
        );
        assert_eq!(
            summary("Changes", "items", "Orders", 1, true, true),
            "Changes a single item of a order."
        );
        assert_eq!(
            summary("Retrieves", "profile", "me", 1, false, false),
            "Retrieves profile of me."
        );
    }

    fn service(annotations: Value) -> Value {
        let mut container = json!({
            "$Kind": "EntityContainer",
            "Orders": { "$Collection": true, "$Type": "self.Order" }
        });
        if let (Some(container), Some(annotations)) = (container.as_object_mut(), annotations.as_object()) {
            for (key, value) in annotations {
                container.insert(key.clone(), value.clone());
            }
        }
        json!({
            "$Version": "4.01",
            "$EntityContainer": "self.Container",
            "$Reference": {
                "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Capabilities.V1.json": {
                    "$Include": [{ "$Namespace": "Org.OData.Capabilities.V1", "$Alias": "Capabilities" }]
                }
            },
            "self": {
                "Order": {
                    "$Kind": "EntityType",
                    "$Key": ["ID"],
                    "ID": { "$Type": "Edm.Int32" },
                    "note": {}
                },
                "Container": container
            }
        })
    }

    #[test]
    fn test_crud_operations() {
        let openapi = generate(&service(json!({})));
        let collection = &openapi["paths"]["/Orders"];
        assert_eq!(collection["get"]["summary"], "Retrieves a list of orders.");
        assert_eq!(collection["post"]["summary"], "Creates a single order.");
        assert_eq!(collection["post"]["requestBody"]["description"], "New order");
        assert_eq!(
            collection["post"]["requestBody"]["content"]["application/json"]["schema"],
            json!({ "$ref": "#/components/schemas/self.Order-create" })
        );
        let single = &openapi["paths"]["/Orders({ID})"];
        assert_eq!(single["get"]["summary"], "Retrieves a single order.");
        assert_eq!(single["patch"]["summary"], "Changes a single order.");
        assert_eq!(single["delete"]["summary"], "Deletes a single order.");
        assert_eq!(
            single["patch"]["responses"]["204"],
            json!({ "description": "Success" })
        );
    }

    #[test]
    fn test_restricted_operations() {
        let openapi = generate(&service(json!({
            "Orders": {
                "$Collection": true,
                "$Type": "self.Order",
                "@Capabilities.InsertRestrictions": { "Insertable": false },
                "@Capabilities.UpdateRestrictions": { "UpdateMethod": "PUT" },
                "@Capabilities.DeleteRestrictions": { "Deletable": false },
                "@Capabilities.ReadRestrictions": {
                    "Description": "List orders",
                    "ReadByKeyRestrictions": { "Description": "Get one order" }
                }
            }
        })));
        let collection = &openapi["paths"]["/Orders"];
        assert_eq!(collection["get"]["summary"], "List orders");
        assert!(collection.get("post").is_none());
        let single = &openapi["paths"]["/Orders({ID})"];
        assert_eq!(single["get"]["summary"], "Get one order");
        assert!(single.get("put").is_some());
        assert!(single.get("patch").is_none());
        assert!(single.get("delete").is_none());
    }

    #[test]
    fn test_collection_query_options() {
        let openapi = generate(&service(json!({})));
        let names: Vec<Value> = openapi["paths"]["/Orders"]["get"]["parameters"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|p| p.get("name").or_else(|| p.get("$ref")).cloned().unwrap_or(Value::Null))
            .collect();
        assert_eq!(
            names,
            [
                json!("#/components/parameters/top"),
                json!("#/components/parameters/skip"),
                json!("#/components/parameters/search"),
                json!("$filter"),
                json!("#/components/parameters/count"),
                json!("$orderby"),
                json!("$select"),
            ]
        );
    }

    #[test]
    fn test_delta_link() {
        let openapi = generate(&service(json!({
            "Orders": {
                "$Collection": true,
                "$Type": "self.Order",
                "@Capabilities.ChangeTracking": { "Supported": true }
            }
        })));
        let properties =
            &openapi["paths"]["/Orders"]["get"]["responses"]["200"]["content"]["application/json"]["schema"]["properties"];
        assert_eq!(properties["@odata.deltaLink"]["type"], "string");
        assert_eq!(
            properties["@odata.deltaLink"]["example"],
            "/service-root/Orders?$deltatoken=opaque server-generated token for fetching the delta"
        );
    }
}
