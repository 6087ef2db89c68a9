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

//! Schema Objects of the `components/schemas` section.

use crate::csdl::Element;
use crate::csdl::Kind;
use crate::openapi::context::Context;
use crate::openapi::extensions;
use crate::openapi::schema::local_reference;
use crate::openapi::schema::Usage;
use crate::openapi::Generator;
use crate::openapi::SchemaSuffix;
use crate::vocabulary::annotations::is_truthy;
use crate::vocabulary::annotations::record;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::capabilities::CountRestrictions;
use crate::vocabulary::capabilities::ExpandRestrictions;
use crate::vocabulary::capabilities::Expression;
use crate::vocabulary::CapabilitiesTerm;
use crate::vocabulary::CommonTerm;
use crate::vocabulary::CoreTerm;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;

impl Generator<'_> {
    /// Schemas of all types reachable from the paths, sorted by name,
    /// followed by the inline schemas.
    pub(crate) fn schemas(&self, ctx: &mut Context) -> Map<String, Value> {
        let mut unordered = BTreeMap::new();
        let mut index = 0;
        while let Some(required) = ctx.required(index).cloned() {
            index += 1;
            let qualified_name = format!("{}.{}", required.namespace, required.name);
            let Some(t) = self.model.element(&qualified_name) else {
                continue;
            };
            match t.kind() {
                Kind::EntityType | Kind::ComplexType => {
                    let schema = self.structured_type_schema(ctx, &required.namespace, &required.name, t, required.suffix);
                    unordered.insert(format!("{qualified_name}{}", required.suffix.as_str()), schema);
                }
                Kind::EnumType => {
                    unordered.insert(qualified_name, self.enum_type_schema(&required.name, t));
                }
                Kind::TypeDefinition => {
                    let schema = self.type_definition_schema(ctx, &required.name, t);
                    unordered.insert(qualified_name, schema);
                }
                _ => (),
            }
        }

        for (namespace, schema) in self.model.schemas() {
            for (name, t) in schema.elements().filter(|(_, t)| t.kind().is_structured()) {
                let extensions = extensions::extensions(t.annotations());
                if extensions.is_empty() {
                    continue;
                }
                let entry = unordered
                    .entry(format!("{namespace}.{name}"))
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(entry) = entry {
                    entry.extend(extensions);
                }
            }
        }

        let mut ordered: Map<String, Value> = unordered.into_iter().collect();
        if ctx.inline_geo_point {
            ordered.insert(
                "geoPoint".into(),
                json!({
                    "type": "object",
                    "properties": {
                        "coordinates": local_reference("geoPosition"),
                        "type": { "type": "string", "enum": ["Point"], "default": "Point" }
                    },
                    "required": ["type", "coordinates"]
                }),
            );
            ordered.insert(
                "geoPosition".into(),
                json!({ "type": "array", "minItems": 2, "items": { "type": "number" } }),
            );
        }
        if self.container.is_some() {
            ordered.insert("count".into(), count_schema());
            ordered.insert("error".into(), self.error_schema());
        }
        ordered
    }

    fn is_countable(&self, namespace: &str, name: &str) -> bool {
        let target = format!("{namespace}.EntityContainer/{name}");
        let not_countable = self
            .model
            .schema(namespace)
            .and_then(Element::out_of_line_annotations)
            .and_then(|annotations| annotations.get(&target))
            .and_then(Value::as_object)
            .and_then(|annotations| {
                annotations.term_record::<CountRestrictions, _>(self.voc, CapabilitiesTerm::CountRestrictions)
            })
            .is_some_and(|r| r.is_not_countable());
        !not_countable
    }

    fn is_mandatory(&self, property: &Element) -> bool {
        property
            .term(self.voc, CommonTerm::FieldControl)
            .map(record::<Expression>)
            .is_some_and(|e| e.member() == "Mandatory")
    }

    fn is_read_only(&self, property: &Element) -> bool {
        property
            .term(self.voc, CoreTerm::Permissions)
            .map(record::<Expression>)
            .is_some_and(|e| e.member() == "Read")
    }

    fn structured_type_schema(
        &self,
        ctx: &mut Context,
        namespace: &str,
        name: &str,
        t: &Element,
        suffix: SchemaSuffix,
    ) -> Value {
        let voc = self.voc;
        let keys: Vec<&str> = if t.kind() == Kind::EntityType {
            self.model
                .key_of(t)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .collect()
        } else {
            Vec::new()
        };
        let mut required: Vec<&str> = keys.clone();
        let countable = self.is_countable(namespace, name);
        let non_expandable: Vec<String> = t
            .term_record::<ExpandRestrictions, _>(voc, CapabilitiesTerm::ExpandRestrictions)
            .map(|r| {
                r.non_expandable_properties
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let count_suffix = if self.version() == "4.0" {
            "@odata.count"
        } else {
            "@count"
        };

        let mut properties = Map::new();
        for (property_name, property) in self.model.properties(t) {
            if non_expandable.iter().any(|p| p == property_name) {
                continue;
            }
            if suffix == SchemaSuffix::Read {
                properties.insert(
                    property_name.into(),
                    self.schema(ctx, property, SchemaSuffix::Read, Usage::Value),
                );
            }
            if self.is_mandatory(property) {
                required.push(property_name);
            }
            let read_only = self.is_read_only(property);
            let computed = property.has_term(voc, CoreTerm::Computed);
            let immutable = property.has_term(voc, CoreTerm::Immutable);
            if property.kind() == Kind::NavigationProperty {
                if property.is_collection() && suffix == SchemaSuffix::Read && countable {
                    properties.insert(
                        format!("{property_name}{count_suffix}"),
                        local_reference("count"),
                    );
                }
                let deep = property.contains_target() || property.on_delete() == Some("Cascade");
                let writable = !read_only && !computed && deep;
                if writable && (suffix == SchemaSuffix::Create || suffix == SchemaSuffix::Update && !immutable) {
                    properties.insert(
                        property_name.into(),
                        self.schema(ctx, property, SchemaSuffix::Create, Usage::Value),
                    );
                }
            } else {
                if read_only || computed || property.has_term(voc, CoreTerm::ComputedDefaultValue) {
                    required.retain(|r| *r != property_name);
                }
                if !(read_only || computed) {
                    if suffix == SchemaSuffix::Create {
                        properties.insert(
                            property_name.into(),
                            self.schema(ctx, property, SchemaSuffix::Create, Usage::Value),
                        );
                    }
                    if suffix == SchemaSuffix::Update && !keys.contains(&property_name) && !immutable {
                        properties.insert(
                            property_name.into(),
                            self.schema(ctx, property, SchemaSuffix::Update, Usage::Value),
                        );
                    }
                }
            }
        }

        let mut schema = Map::new();
        let title = t.description(voc).unwrap_or(name);
        schema.insert("title".into(), format!("{title}{}", suffix.title()).into());
        schema.insert("type".into(), "object".into());
        if !properties.is_empty() {
            schema.insert("properties".into(), properties.into());
        }
        if suffix == SchemaSuffix::Read {
            if let Some(root) = t.annotation(extensions::ODM_ROOT).filter(|v| is_truthy(v)) {
                schema.insert("x-sap-root-entity".into(), root.clone());
            }
        }
        extensions::odm(t, &mut schema);
        extensions::entity_relationship(t, &mut schema);
        if suffix == SchemaSuffix::Create && !required.is_empty() {
            let mut unique: Vec<&str> = Vec::with_capacity(required.len());
            for r in required {
                if !unique.contains(&r) {
                    unique.push(r);
                }
            }
            schema.insert("required".into(), unique.into());
        }
        if let Some(description) = t.long_description(voc) {
            schema.insert("description".into(), description.into());
        }
        let derived = self.model.derived_types(&format!("{namespace}.{name}"));
        if !derived.is_empty() {
            let mut any_of: Vec<Value> = derived
                .iter()
                .map(|d| self.reference(ctx, d, suffix))
                .collect();
            if !t.is_abstract() {
                any_of.push(json!({}));
            }
            schema.insert("anyOf".into(), any_of.into());
        }
        Value::Object(schema)
    }

    fn enum_type_schema(&self, name: &str, t: &Element) -> Value {
        let members: Vec<&str> = t.members().map(|(member, _)| member.as_str()).collect();
        let mut schema = Map::new();
        schema.insert("type".into(), "string".into());
        schema.insert("title".into(), name.into());
        schema.insert("enum".into(), members.into());
        if let Some(description) = t.long_description(self.voc) {
            schema.insert("description".into(), description.into());
        }
        Value::Object(schema)
    }

    fn type_definition_schema(&self, ctx: &mut Context, name: &str, t: &Element) -> Value {
        let mut definition = t.clone();
        if definition.type_name().is_none() {
            if let Some(underlying) = t.underlying_type() {
                definition.set_attribute("$Type", underlying.into());
            }
        }
        let mut schema = self.schema(ctx, &definition, SchemaSuffix::Read, Usage::Value);
        if let Value::Object(s) = &mut schema {
            s.insert("title".into(), name.into());
            if let Some(description) = t.long_description(self.voc) {
                s.insert("description".into(), description.into());
            }
        }
        schema
    }

    fn error_schema(&self) -> Value {
        let mut error = json!({
            "type": "object",
            "required": ["error"],
            "properties": {
                "error": {
                    "type": "object",
                    "required": ["code", "message"],
                    "properties": {
                        "code": { "type": "string" },
                        "message": { "type": "string" },
                        "target": { "type": "string" },
                        "details": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["code", "message"],
                                "properties": {
                                    "code": { "type": "string" },
                                    "message": { "type": "string" },
                                    "target": { "type": "string" }
                                }
                            }
                        },
                        "innererror": {
                            "type": "object",
                            "description": "The structure of this object is service-specific"
                        }
                    }
                }
            }
        });
        if self.version() < "4.0" {
            let properties = json!({
                "code": { "type": "string" },
                "message": {
                    "type": "object",
                    "properties": {
                        "lang": { "type": "string" },
                        "value": { "type": "string" }
                    },
                    "required": ["lang", "value"]
                },
                "innererror": {
                    "type": "object",
                    "description": "The structure of this object is service-specific"
                }
            });
            error["properties"]["error"]["properties"] = properties;
        }
        error
    }
}

fn count_schema() -> Value {
    json!({
        "anyOf": [{ "type": "number" }, { "type": "string" }],
        "description": "The number of entities in the collection. Available when using the [$count](http://docs.oasis-open.org/odata/odata/v4.01/odata-v4.01-part1-protocol.html#sec_SystemQueryOptioncount) query option."
    })
}

#[cfg(test)]
mod test {
    use crate::openapi::test::generate;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use serde_json::Value;

    fn service(types: Value) -> Value {
        let mut schema = types;
        schema["Service"] = json!({
            "$Kind": "EntityContainer",
            "Items": { "$Collection": true, "$Type": "n.Item" }
        });
        json!({
            "$Version": "4.01",
            "$Reference": {
                "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Core.V1.json": {
                    "$Include": [{ "$Namespace": "Org.OData.Core.V1", "$Alias": "Core" }]
                }
            },
            "$EntityContainer": "n.Service",
            "n": schema
        })
    }

    #[test]
    fn test_create_and_update_schemas() {
        let doc = generate(&service(json!({
            "Item": {
                "$Kind": "EntityType",
                "$Key": ["ID"],
                "ID": {},
                "name": { "@Common.FieldControl": "Mandatory" },
                "created": { "@Core.Computed": true },
                "code": { "@Core.Immutable": true }
            }
        })));
        let schemas = &doc["components"]["schemas"];
        assert_eq!(schemas["n.Item-create"]["required"], json!(["ID", "name"]));
        assert_eq!(schemas["n.Item-create"]["title"], "Item (for create)");
        let create: Vec<_> = schemas["n.Item-create"]["properties"]
            .as_object()
            .expect("properties")
            .keys()
            .cloned()
            .collect();
        assert_eq!(create, ["ID", "name", "code"]);
        let update: Vec<_> = schemas["n.Item-update"]["properties"]
            .as_object()
            .expect("properties")
            .keys()
            .cloned()
            .collect();
        assert_eq!(update, ["name"]);
        assert!(schemas["n.Item"]["properties"].get("created").is_some());
    }

    #[test]
    fn test_derived_types() {
        let doc = generate(&service(json!({
            "Item": { "$Kind": "EntityType", "$Key": ["ID"], "ID": {}, "pet": { "$Type": "n.Animal" } },
            "Animal": { "$Kind": "ComplexType", "$Abstract": true, "name": {} },
            "Dog": { "$Kind": "ComplexType", "$BaseType": "n.Animal", "barks": { "$Type": "Edm.Boolean" } }
        })));
        let schemas = &doc["components"]["schemas"];
        assert_eq!(
            schemas["n.Animal"]["anyOf"],
            json!([{ "$ref": "#/components/schemas/n.Dog" }])
        );
        let dog: Vec<_> = schemas["n.Dog"]["properties"]
            .as_object()
            .expect("properties")
            .keys()
            .cloned()
            .collect();
        assert_eq!(dog, ["name", "barks"]);
    }

    #[test]
    fn test_concrete_base_type_accepts_untyped_alternative() {
        let doc = generate(&service(json!({
            "Item": { "$Kind": "EntityType", "$Key": ["ID"], "ID": {}, "pet": { "$Type": "n.Animal" } },
            "Animal": { "$Kind": "ComplexType", "name": {} },
            "Dog": { "$Kind": "ComplexType", "$BaseType": "n.Animal", "barks": { "$Type": "Edm.Boolean" } },
            "Cat": { "$Kind": "ComplexType", "$BaseType": "n.Animal" }
        })));
        let schemas = &doc["components"]["schemas"];
        assert_eq!(
            schemas["n.Animal"]["anyOf"],
            json!([
                { "$ref": "#/components/schemas/n.Dog" },
                { "$ref": "#/components/schemas/n.Cat" },
                {}
            ])
        );
        assert!(schemas.get("n.Cat").is_some());
    }

    #[test]
    fn test_schemas_sorted_then_inline() {
        let doc = generate(&service(json!({
            "Item": {
                "$Kind": "EntityType",
                "$Key": ["ID"],
                "ID": {},
                "location": { "$Type": "Edm.GeographyPoint" },
                "status": { "$Type": "n.Status" },
                "size": { "$Type": "n.Size" }
            },
            "Status": { "$Kind": "EnumType", "open": 0, "closed": 1 },
            "Size": { "$Kind": "TypeDefinition", "$UnderlyingType": "Edm.Int32", "@Core.LongDescription": "Size in cm" }
        })));
        let schemas = doc["components"]["schemas"].as_object().expect("schemas");
        let names: Vec<_> = schemas.keys().cloned().collect();
        assert_eq!(
            names,
            [
                "n.Item",
                "n.Item-create",
                "n.Item-update",
                "n.Size",
                "n.Status",
                "geoPoint",
                "geoPosition",
                "count",
                "error"
            ]
        );
        assert_eq!(
            schemas["n.Status"],
            json!({ "type": "string", "title": "Status", "enum": ["open", "closed"] })
        );
        assert_eq!(
            schemas["n.Size"],
            json!({ "type": "integer", "format": "int32", "title": "Size", "description": "Size in cm" })
        );
    }

    #[test]
    fn test_schema_extensions() {
        let doc = generate(&service(json!({
            "Item": {
                "$Kind": "EntityType",
                "$Key": ["ID"],
                "ID": {},
                "@OpenAPI.Extensions.odm-semantic-key": ["name"],
                "@ODM.root": true,
                "@ODM.entityName": "Item"
            }
        })));
        let item = &doc["components"]["schemas"]["n.Item"];
        assert_eq!(item["x-sap-root-entity"], true);
        assert_eq!(item["x-sap-odm-entity-name"], "Item");
        assert_eq!(item["x-sap-odm-semantic-key"], json!(["name"]));
    }
}
