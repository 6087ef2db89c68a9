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

//! Specification extensions (`x-` keys) taken from CDS annotations.
//!
//! These annotations are written by the CDS compiler with fixed keys,
//! they don't belong to a referenced vocabulary.

use crate::csdl::Element;
use crate::vocabulary::annotations::is_truthy;
use crate::vocabulary::annotations::Annotations as _;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

const EXTENSIONS_PREFIX: &str = "@OpenAPI.Extensions";

/// `@ODM.root` marks the root entity of an ODM entity.
pub(crate) const ODM_ROOT: &str = "@ODM.root";

const ODM_ANNOTATIONS: &[(&str, &str)] = &[
    ("@ODM.entityName", "x-sap-odm-entity-name"),
    ("@ODM.oid", "x-sap-odm-oid"),
];

const ODM_OID_REFERENCE: &str = "@ODM.oidReference";

const ENTITY_RELATIONSHIP_ANNOTATIONS: &[(&str, &str)] = &[
    ("@EntityRelationship.entityType", "x-entity-relationship-entity-type"),
    ("@EntityRelationship.entityIds", "x-entity-relationship-entity-ids"),
    ("@EntityRelationship.propertyType", "x-entity-relationship-property-type"),
    ("@EntityRelationship.reference", "x-entity-relationship-reference"),
    (
        "@EntityRelationship.compositeReferences",
        "x-entity-relationship-composite-references",
    ),
    ("@EntityRelationship.temporalIds", "x-entity-relationship-temporal-ids"),
    (
        "@EntityRelationship.temporalReferences",
        "x-entity-relationship-temporal-references",
    ),
    (
        "@EntityRelationship.referencesWithConstantIds",
        "x-entity-relationship-references-with-constant-ids",
    ),
];

/// Extensions with a closed set of values and the replacement for
/// values outside of it. Without replacement the extension is dropped.
const ENUM_EXTENSIONS: &[(&str, &[&str], Option<&str>)] = &[
    (
        "x-sap-compliance-level",
        &["sap:base:v1", "sap:core:v1", "sap:core:v2"],
        None,
    ),
    ("x-sap-api-type", &["ODATA", "ODATAV4", "REST", "SOAP"], None),
    ("x-sap-direction", &["inbound", "outbound", "mixed"], Some("inbound")),
    (
        "x-sap-dpp-entity-semantics",
        &["sap:DataSubject", "sap:DataSubjectDetails", "sap:Other"],
        None,
    ),
    (
        "x-sap-dpp-field-semantics",
        &[
            "sap:DataSubjectID",
            "sap:ConsentID",
            "sap:PurposeID",
            "sap:ContractRelatedID",
            "sap:LegalEntityID",
            "sap:DataControllerID",
            "sap:UserID",
            "sap:EndOfBusinessDate",
            "sap:BlockingDate",
            "sap:EndOfRetentionDate",
        ],
        None,
    ),
];

/// Extensions with a closed set of fields (for objects) or items (for
/// arrays).
const STRUCTURED_EXTENSIONS: &[(&str, &[&str])] = &[
    (
        "x-sap-stateInfo",
        &["state", "deprecationDate", "decomissionedDate", "link"],
    ),
    ("x-sap-ext-overview", &["name", "values"]),
    (
        "x-sap-deprecated-operation",
        &["deprecationDate", "successorOperationRef", "successorOperationId"],
    ),
    ("x-sap-odm-semantic-key", &["name", "values"]),
];

fn extension_name(name: &str) -> String {
    if name.starts_with("x-sap-") {
        name.to_string()
    } else if name.starts_with("sap-") {
        format!("x-{name}")
    } else {
        format!("x-sap-{name}")
    }
}

/// Extensions from `@OpenAPI.Extensions.<name>[.<field>...]`
/// annotations. Dotted names build nested objects.
pub(crate) fn extensions(annotations: &Map<String, Value>) -> Map<String, Value> {
    let mut result = Map::new();
    for (key, value) in annotations {
        let Some(rest) = key.strip_prefix(EXTENSIONS_PREFIX) else {
            continue;
        };
        let path = rest.strip_prefix('.').unwrap_or_default();
        let mut keys = path.split('.');
        let name = extension_name(keys.next().unwrap_or_default());
        let fields: Vec<&str> = keys.collect();
        let Some((last, parents)) = fields.split_last() else {
            result.insert(name, value.clone());
            continue;
        };
        let mut node = Some(
            result
                .entry(name)
                .or_insert_with(|| Value::Object(Map::new())),
        );
        for field in parents {
            node = node.and_then(|parent| match parent {
                Value::Object(object) => Some(
                    object
                        .entry((*field).to_string())
                        .or_insert_with(|| Value::Object(Map::new())),
                ),
                _ => None,
            });
        }
        match node {
            Some(Value::Object(object)) => {
                object.insert((*last).to_string(), value.clone());
            }
            _ => debug!(key, "extension conflicts with a plain extension value"),
        }
    }
    check_enums(&mut result);
    check_structures(&mut result);
    result
}

fn check_enums(extensions: &mut Map<String, Value>) {
    for (name, allowed, default) in ENUM_EXTENSIONS {
        let Some(value) = extensions.get(*name) else {
            continue;
        };
        if value.as_str().is_some_and(|v| allowed.contains(&v)) {
            continue;
        }
        debug!(name, %value, "invalid extension value");
        match default {
            Some(default) => {
                extensions.insert((*name).to_string(), (*default).into());
            }
            None => {
                *extensions = std::mem::take(extensions)
                    .into_iter()
                    .filter(|(key, _)| key.as_str() != *name)
                    .collect();
            }
        }
    }
}

fn check_structures(extensions: &mut Map<String, Value>) {
    for (name, allowed) in STRUCTURED_EXTENSIONS {
        match extensions.get_mut(*name) {
            Some(Value::Array(items)) => {
                items.retain(|item| item.as_str().is_some_and(|v| allowed.contains(&v)));
            }
            Some(Value::Object(fields)) => {
                *fields = std::mem::take(fields)
                    .into_iter()
                    .filter(|(field, _)| allowed.contains(&field.as_str()))
                    .collect();
            }
            _ => (),
        }
    }
}

fn copy_annotations(element: &Element, mapping: &[(&str, &str)], schema: &mut Map<String, Value>) {
    for (annotation, extension) in mapping {
        if let Some(value) = element.annotation(annotation).filter(|v| is_truthy(v)) {
            schema.insert((*extension).to_string(), value.clone());
        }
    }
}

/// ODM extensions of a structured type schema.
pub(crate) fn odm(element: &Element, schema: &mut Map<String, Value>) {
    copy_annotations(element, ODM_ANNOTATIONS, schema);
}

/// Entity relationship extensions of a schema.
pub(crate) fn entity_relationship(element: &Element, schema: &mut Map<String, Value>) {
    copy_annotations(element, ENTITY_RELATIONSHIP_ANNOTATIONS, schema);
}

/// Entity referenced by an ODM object identifier property.
pub(crate) fn odm_reference(element: &Element, schema: &mut Map<String, Value>) {
    if let Some(entity_name) = element
        .annotation(ODM_OID_REFERENCE)
        .and_then(|r| r.get("entityName"))
        .filter(|v| is_truthy(v))
    {
        schema.insert(
            "x-sap-odm-oid-reference-entity-name".into(),
            entity_name.clone(),
        );
    }
}
