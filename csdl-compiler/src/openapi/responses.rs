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

use crate::csdl::qualified_name::simple_name;
use crate::csdl::Element;
use crate::openapi::context::Context;
use crate::openapi::schema::local_reference;
use crate::openapi::schema::Usage;
use crate::openapi::Generator;
use crate::openapi::SchemaSuffix;
use crate::vocabulary::capabilities::CustomParameter;
use crate::vocabulary::capabilities::ErrorResponse;
use crate::vocabulary::capabilities::OperationDetails;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tagged_types::TaggedType;

/// Collection responses carry a count property.
pub type Countable = TaggedType<bool, CountableTag>;
#[doc(hidden)]
#[derive(tagged_types::Tag)]
#[implement(Clone, Copy)]
#[transparent(Debug)]
#[capability(inner_access)]
pub enum CountableTag {}

/// Reference to the shared error response.
pub(crate) fn error_response_reference() -> Value {
    json!({ "$ref": "#/components/responses/error" })
}

fn custom_parameter(custom: &CustomParameter, location: &str) -> Value {
    let mut parameter = Map::new();
    parameter.insert("name".into(), custom.name.clone().into());
    parameter.insert("in".into(), location.into());
    parameter.insert("required".into(), custom.required.unwrap_or(false).into());
    if let Some(description) = custom.description.as_deref().filter(|d| !d.is_empty()) {
        parameter.insert("description".into(), description.into());
    }
    let mut schema = Map::new();
    schema.insert("type".into(), "string".into());
    if let Some(url) = custom.documentation_url.as_deref().filter(|u| !u.is_empty()) {
        schema.insert("externalDocs".into(), json!({ "url": url }));
    }
    parameter.insert("schema".into(), schema.into());
    Value::Object(parameter)
}

/// Append custom headers and custom query options to the parameters
/// of an operation.
pub(crate) fn custom_parameters(operation: &mut Map<String, Value>, details: &OperationDetails) {
    let customs: Vec<Value> = details
        .custom_headers
        .iter()
        .map(|custom| custom_parameter(custom, "header"))
        .chain(
            details
                .custom_query_options
                .iter()
                .map(|custom| custom_parameter(custom, "query")),
        )
        .collect();
    if customs.is_empty() {
        return;
    }
    if let Value::Array(parameters) = operation
        .entry("parameters")
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        parameters.extend(customs);
    }
}

/// Primitive single values are wrapped in a `value` property.
fn is_wrapped_primitive(type_name: Option<&str>) -> bool {
    type_name.map_or(true, |t| {
        t.starts_with("Edm.") && !matches!(t, "Edm.Stream" | "Edm.EntityType" | "Edm.ComplexType")
    })
}

impl Generator<'_> {
    /// Responses Object with one success response and the error
    /// responses. Without declared error responses a `4XX` reference to
    /// the shared error response is added.
    pub(crate) fn response(
        &self,
        ctx: &mut Context,
        code: u16,
        description: &str,
        payload: Option<&Element>,
        errors: Option<&[ErrorResponse]>,
        countable: Countable,
    ) -> Map<String, Value> {
        let mut success = Map::new();
        success.insert("description".into(), description.into());
        if code != 204 {
            let untyped = Element::typed(None, false);
            let payload = payload.unwrap_or(&untyped);
            let s = self.schema(ctx, payload, SchemaSuffix::Read, Usage::Value);
            let schema = if payload.is_collection() {
                let mut properties = Map::new();
                if countable.into_inner() {
                    let count = if self.version() > "4.0" {
                        "@count"
                    } else {
                        "@odata.count"
                    };
                    properties.insert(count.into(), local_reference("count"));
                }
                properties.insert("value".into(), s);
                json!({
                    "type": "object",
                    "title": format!("Collection of {}", simple_name(payload.type_name().unwrap_or("Edm.String"))),
                    "properties": properties
                })
            } else if is_wrapped_primitive(payload.type_name()) {
                json!({ "type": "object", "properties": { "value": s } })
            } else {
                s
            };
            success.insert(
                "content".into(),
                json!({ "application/json": { "schema": schema } }),
            );
        }

        let mut responses = Map::new();
        responses.insert(code.to_string(), success.into());
        match errors {
            Some(errors) => {
                for error in errors {
                    let mut response = Map::new();
                    if let Some(description) = &error.description {
                        response.insert("description".into(), description.clone().into());
                    }
                    response.insert(
                        "content".into(),
                        json!({ "application/json": { "schema": local_reference("error") } }),
                    );
                    responses.insert(error.status_code(), response.into());
                }
            }
            None => {
                responses.insert("4XX".into(), error_response_reference());
            }
        }
        responses
    }
}
