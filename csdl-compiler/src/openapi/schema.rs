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

//! Schema Objects for properties, parameters and return types.

use crate::csdl::qualified_name::QualifiedName;
use crate::csdl::Element;
use crate::openapi::context::Context;
use crate::openapi::extensions;
use crate::openapi::Generator;
use crate::openapi::SchemaSuffix;
use crate::vocabulary::annotations::is_truthy;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::CoreTerm;
use crate::vocabulary::JsonTerm;
use crate::vocabulary::ValidationTerm;
use serde_json::json;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use tracing::debug;

/// Where the described value appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Usage {
    /// Property, payload or action parameter.
    Value,
    /// Key parameter in a path. Descriptions go to the parameter.
    Parameter,
    /// Function parameter written as URL literal. Descriptions go to
    /// the parameter.
    FunctionParameter,
}

/// Reference to a schema of this document.
pub(crate) fn local_reference(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

/// JSON number, integral values without fraction.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn number(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        Value::from(v as i64)
    } else {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

/// `10^exponent`, `None` when it is not representable as a normal
/// `f64`.
fn power_of_ten(exponent: i64) -> Option<f64> {
    i32::try_from(exponent)
        .ok()
        .map(|e| 10f64.powi(e))
        .filter(|v| v.is_normal())
}

/// Length of the base64url encoding of `len` bytes.
#[allow(clippy::cast_precision_loss)]
fn base64url_length(len: u64) -> Value {
    let encoded = (u128::from(len) * 4).div_ceil(3);
    u64::try_from(encoded).map_or_else(|_| number(encoded as f64), Value::from)
}

// Fractional seconds of Edm.DateTimeOffset have at most 12 digits.
const MAX_FRACTION_DIGITS: usize = 12;

fn is_number_schema(schema: &Map<String, Value>) -> bool {
    matches!(schema.get("type").and_then(Value::as_str), Some("number" | "integer"))
}

fn is_string_schema(schema: &Map<String, Value>) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("string")
}

/// Reference objects get wrapped so that siblings can be added.
fn wrap_reference(schema: Map<String, Value>) -> Map<String, Value> {
    if schema.contains_key("$ref") {
        let mut wrapped = Map::new();
        wrapped.insert("allOf".into(), Value::Array(vec![Value::Object(schema)]));
        wrapped
    } else {
        schema
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(v) => v,
        _ => Map::new(),
    }
}

const UNQUOTED_KEY_TYPES: &[&str] = &[
    "Edm.Int64",
    "Edm.Int32",
    "Edm.Int16",
    "Edm.SByte",
    "Edm.Byte",
    "Edm.Double",
    "Edm.Single",
    "Edm.Date",
    "Edm.DateTimeOffset",
    "Edm.Guid",
];

impl Generator<'_> {
    /// Quote around URL literals of the type.
    pub(crate) fn literal_quote(&self, type_name: Option<&str>) -> &'static str {
        if self.key_as_segment || type_name.is_some_and(|t| UNQUOTED_KEY_TYPES.contains(&t)) {
            ""
        } else {
            "'"
        }
    }

    /// Reference to the schema of a type. Schemas of types defined in
    /// this document are recorded as required; types of referenced
    /// documents point to the OpenAPI document generated for them.
    pub(crate) fn reference(&self, ctx: &mut Context, type_name: &str, suffix: SchemaSuffix) -> Value {
        let qname = QualifiedName::parse(type_name);
        if qname.qualifier.is_empty() {
            return local_reference(&format!("{type_name}{}", suffix.as_str()));
        }
        let namespace = self.model.namespace(qname.qualifier).unwrap_or(qname.qualifier);
        let url = self.model.namespace_url(namespace);
        if url.is_empty() {
            ctx.require(namespace, qname.name, suffix);
        }
        let url = url
            .strip_suffix(".xml")
            .map_or_else(|| url.to_string(), |base| format!("{base}.openapi3.json"));
        json!({
            "$ref": format!("{url}#/components/schemas/{namespace}.{}{}", qname.name, suffix.as_str())
        })
    }

    /// Schema Object describing values of a property, parameter or
    /// return type.
    pub(crate) fn schema(
        &self,
        ctx: &mut Context,
        element: &Element,
        suffix: SchemaSuffix,
        usage: Usage,
    ) -> Value {
        let voc = self.voc;
        let mut s = self.type_schema(ctx, element, suffix);

        if let Some(Value::Array(values)) = element.term(voc, ValidationTerm::AllowedValues) {
            s = wrap_reference(s);
            let values = values
                .iter()
                .map(|v| v.get("Value").cloned().unwrap_or(Value::Null))
                .collect();
            s.insert("enum".into(), Value::Array(values));
        }
        if element.is_nullable() {
            s = wrap_reference(s);
            s.insert("nullable".into(), Value::Bool(true));
        }
        if let Some(default) = element.default_value() {
            s = wrap_reference(s);
            s.insert("default".into(), default.clone());
        }
        if let Some(example) = element.term(voc, CoreTerm::Example).filter(|v| is_truthy(v)) {
            s = wrap_reference(s);
            if let Some(value) = example.get("Value") {
                s.insert("example".into(), value.clone());
            }
        }
        if usage == Usage::FunctionParameter {
            self.function_literal(&mut s, element);
        }
        s = self.limit(s, element, ValidationTerm::Maximum, "maximum", "exclusiveMaximum");
        s = self.limit(s, element, ValidationTerm::Minimum, "minimum", "exclusiveMinimum");

        if element.is_collection() {
            s = object(json!({ "type": "array", "items": s }));
        }
        if usage == Usage::Value {
            if let Some(description) = element.any_description(voc) {
                s = wrap_reference(s);
                s.insert("description".into(), description.into());
            }
        }
        extensions::odm_reference(element, &mut s);
        extensions::entity_relationship(element, &mut s);
        Value::Object(s)
    }

    fn type_schema(&self, ctx: &mut Context, element: &Element, suffix: SchemaSuffix) -> Map<String, Value> {
        let schema = match element.type_name() {
            Some(
                "Edm.AnnotationPath"
                | "Edm.ModelElementPath"
                | "Edm.NavigationPropertyPath"
                | "Edm.PropertyPath",
            ) => json!({ "type": "string" }),
            Some("Edm.Binary") => {
                let mut s = json!({ "type": "string", "format": "base64url" });
                if let Some(len) = element.max_length().filter(|len| *len > 0) {
                    s["maxLength"] = base64url_length(len);
                }
                s
            }
            Some("Edm.Boolean") => json!({ "type": "boolean" }),
            Some("Edm.Byte") => json!({ "type": "integer", "format": "uint8" }),
            Some("Edm.Date") => json!({ "type": "string", "format": "date", "example": "2017-04-13" }),
            Some("Edm.DateTime" | "Edm.DateTimeOffset") => {
                let fraction = match element.precision() {
                    Some(p) if p > 0 => {
                        let digits = usize::try_from(p).map_or(MAX_FRACTION_DIGITS, |p| p.min(MAX_FRACTION_DIGITS));
                        format!(".{}", "0".repeat(digits))
                    }
                    _ => String::new(),
                };
                json!({
                    "type": "string",
                    "format": "date-time",
                    "example": format!("2017-04-13T15:51:04{fraction}Z"),
                })
            }
            Some("Edm.Decimal") => Self::decimal(element),
            Some("Edm.Double") => json!({
                "anyOf": [{ "type": "number", "format": "double" }, { "type": "string" }],
                "example": 3.14,
            }),
            Some("Edm.Duration") => json!({ "type": "string", "format": "duration", "example": "P4DT15H51M04S" }),
            Some("Edm.GeographyPoint" | "Edm.GeometryPoint") => {
                ctx.inline_geo_point = true;
                local_reference("geoPoint")
            }
            Some("Edm.Guid") => json!({
                "type": "string",
                "format": "uuid",
                "example": "01234567-89ab-cdef-0123-456789abcdef",
            }),
            Some("Edm.Int16") => json!({ "type": "integer", "format": "int16" }),
            Some("Edm.Int32") => json!({ "type": "integer", "format": "int32" }),
            Some("Edm.Int64") => json!({
                "anyOf": [{ "type": "integer", "format": "int64" }, { "type": "string" }],
                "example": "42",
            }),
            Some("Edm.PrimitiveType") => json!({
                "anyOf": [{ "type": "boolean" }, { "type": "number" }, { "type": "string" }]
            }),
            Some("Edm.SByte") => json!({ "type": "integer", "format": "int8" }),
            Some("Edm.Single") => json!({
                "anyOf": [{ "type": "number", "format": "float" }, { "type": "string" }],
                "example": 3.14,
            }),
            Some("Edm.Stream") => self.stream(element),
            None | Some("Edm.String") => {
                let mut s = json!({ "type": "string" });
                if let Some(len) = element.max_length().filter(|len| *len > 0) {
                    s["maxLength"] = len.into();
                }
                if let Some(pattern) = element.term_str(self.voc, ValidationTerm::Pattern) {
                    s["pattern"] = pattern.into();
                }
                s
            }
            Some("Edm.TimeOfDay") => json!({ "type": "string", "format": "time", "example": "15:51:04" }),
            Some(type_name) if QualifiedName::parse(type_name).is_edm() => {
                debug!(type_name, "Unknown type");
                json!({})
            }
            Some(type_name) => {
                let structured = self
                    .model
                    .element(type_name)
                    .is_some_and(|t| t.kind().is_structured());
                let suffix = if structured { suffix } else { SchemaSuffix::Read };
                let s = self.reference(ctx, type_name, suffix);
                match element.max_length().filter(|len| *len > 0) {
                    Some(len) => json!({ "allOf": [s], "maxLength": len }),
                    None => s,
                }
            }
        };
        object(schema)
    }

    fn decimal(element: &Element) -> Value {
        let precision = element.precision();
        let scale = element.scale();
        let mut decimal = Map::new();
        decimal.insert("type".into(), "number".into());
        decimal.insert("format".into(), "decimal".into());
        let multiple_of = scale.and_then(|scale| {
            if scale <= 0 {
                power_of_ten(scale.checked_neg()?)
            } else {
                power_of_ten(scale).map(|p| 1.0 / p)
            }
        });
        if let Some(multiple_of) = multiple_of {
            decimal.insert("multipleOf".into(), number(multiple_of));
        }
        // Bounds that don't fit into f64 are left out.
        let maximum = precision.filter(|p| *p < 16).and_then(|precision| {
            let scale = scale.unwrap_or(0);
            let upper = power_of_ten(precision.checked_sub(scale)?)?;
            let step = power_of_ten(scale.checked_neg()?)?;
            Some(upper - step)
        });
        if let Some(maximum) = maximum {
            decimal.insert("maximum".into(), number(maximum));
            decimal.insert("minimum".into(), number(-maximum));
        }
        let mut s = Map::new();
        s.insert(
            "anyOf".into(),
            json!([Value::Object(decimal), { "type": "string" }]),
        );
        s.insert("example".into(), 0.into());
        if let Some(precision) = precision {
            s.insert("x-sap-precision".into(), precision.into());
        }
        if let Some(scale) = scale {
            s.insert("x-sap-scale".into(), scale.into());
        }
        Value::Object(s)
    }

    fn stream(&self, element: &Element) -> Value {
        let base64url = json!({ "type": "string", "format": "base64url" });
        match element.term(self.voc, JsonTerm::Schema) {
            Some(Value::String(text)) if !text.is_empty() => {
                serde_json::from_str::<Map<String, Value>>(text).map_or_else(
                    |err| {
                        debug!(%err, "JSON schema of stream is not a JSON object");
                        base64url
                    },
                    Value::Object,
                )
            }
            Some(Value::Object(schema)) => Value::Object(schema.clone()),
            _ => base64url,
        }
    }

    /// Adjust schema of a function parameter to the URL literal form:
    /// strings are enclosed in single quotes and `null` is allowed for
    /// nullable parameters.
    fn function_literal(&self, s: &mut Map<String, Value>, element: &Element) {
        let quote = self.literal_quote(element.type_name());
        if let Some(Value::String(example)) = s.get_mut("example") {
            *example = format!("{quote}{example}{quote}");
        }
        if is_string_schema(s) {
            match s.get_mut("pattern") {
                Some(Value::String(pattern)) => {
                    if let Some(rest) = pattern.strip_prefix('^') {
                        *pattern = format!("^{quote}({rest}");
                    }
                    if let Some(rest) = pattern.strip_suffix('$') {
                        *pattern = format!("{rest}){quote}$");
                    }
                }
                _ => {
                    if matches!(element.type_name(), None | Some("Edm.String")) {
                        s.insert("pattern".into(), "^'([^']|'')*'$".into());
                    }
                }
            }
        }
        if element.is_nullable() {
            s.insert("default".into(), "null".into());
            if is_string_schema(s) {
                if let Some(Value::String(pattern)) = s.get_mut("pattern") {
                    if let Some(rest) = pattern.strip_prefix('^') {
                        *pattern = format!("^(null|{rest}");
                    }
                    if let Some(rest) = pattern.strip_suffix('$') {
                        *pattern = format!("{rest})$");
                    }
                }
            }
        }
    }

    fn limit(
        &self,
        s: Map<String, Value>,
        element: &Element,
        term: ValidationTerm,
        keyword: &str,
        exclusive_keyword: &str,
    ) -> Map<String, Value> {
        let Some(limit) = element.term(self.voc, term).filter(|v| !v.is_null()) else {
            return s;
        };
        let mut s = wrap_reference(s);
        if let Some(Value::Array(any_of)) = s.get_mut("anyOf") {
            if let Some(first) = any_of
                .first_mut()
                .filter(|first| first.as_object().is_some_and(is_number_schema))
            {
                first[keyword] = limit.clone();
            }
        } else if is_number_schema(&s) {
            s.insert(keyword.into(), limit.clone());
        }
        let exclusive = self
            .voc
            .nested_key(term, ValidationTerm::Exclusive)
            .and_then(|key| element.annotation(&key))
            .is_some_and(is_truthy);
        if exclusive {
            s.insert(exclusive_keyword.into(), Value::Bool(true));
        }
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Options;
    use crate::csdl::Document;
    use crate::csdl::Model;

    const VOCABULARIES: &str = r#"{
        "$Reference": {
            "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Core.V1.json": {
                "$Include": [{ "$Namespace": "Org.OData.Core.V1", "$Alias": "Core" }]
            },
            "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Validation.V1.json": {
                "$Include": [{ "$Namespace": "Org.OData.Validation.V1", "$Alias": "Validation" }]
            },
            "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.JSON.V1.json": {
                "$Include": [{ "$Namespace": "Org.OData.JSON.V1", "$Alias": "JSON" }]
            }
        },
        "n": {}
    }"#;

    fn property_schema(property: Value, usage: Usage) -> Value {
        let csdl: Value = serde_json::from_str(VOCABULARIES).expect("csdl");
        let model = Model::new(Document::parse(&csdl));
        let options = Options::default();
        let generator = Generator::new(&model, &options);
        let property = Element::parse(
            crate::csdl::element::Scope::Structure,
            property.as_object().expect("object"),
        );
        let mut ctx = Context::default();
        generator.schema(&mut ctx, &property, SchemaSuffix::Read, usage)
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(100.0), json!(100));
        assert_eq!(number(0.01), json!(0.01));
        assert_eq!(number(-999.99), json!(-999.99));
    }

    #[test]
    fn test_decimal() {
        let s = property_schema(
            json!({ "$Type": "Edm.Decimal", "$Precision": 5, "$Scale": 2 }),
            Usage::Value,
        );
        assert_eq!(
            s,
            json!({
                "anyOf": [
                    { "type": "number", "format": "decimal", "multipleOf": 0.01, "maximum": 999.99, "minimum": -999.99 },
                    { "type": "string" }
                ],
                "example": 0,
                "x-sap-precision": 5,
                "x-sap-scale": 2
            })
        );
    }

    #[test]
    fn test_string_and_binary() {
        assert_eq!(
            property_schema(json!({ "$MaxLength": 10 }), Usage::Value),
            json!({ "type": "string", "maxLength": 10 })
        );
        assert_eq!(
            property_schema(json!({ "$Type": "Edm.Binary", "$MaxLength": 10 }), Usage::Value),
            json!({ "type": "string", "format": "base64url", "maxLength": 14 })
        );
    }

    #[test]
    fn test_huge_facets_do_not_overflow() {
        assert_eq!(
            property_schema(
                json!({ "$Type": "Edm.Binary", "$MaxLength": 18_446_744_073_709_551_615_u64 }),
                Usage::Value
            ),
            json!({ "type": "string", "format": "base64url", "maxLength": 24_595_658_764_946_068_820_f64 })
        );
        let s = property_schema(
            json!({ "$Type": "Edm.Decimal", "$Precision": 5, "$Scale": i64::MIN }),
            Usage::Value,
        );
        assert_eq!(
            s["anyOf"][0],
            json!({ "type": "number", "format": "decimal" })
        );
        assert_eq!(s["x-sap-scale"], json!(i64::MIN));
        let s = property_schema(
            json!({ "$Type": "Edm.Decimal", "$Precision": 5, "$Scale": 400 }),
            Usage::Value,
        );
        assert_eq!(
            s["anyOf"][0],
            json!({ "type": "number", "format": "decimal" })
        );
        let s = property_schema(
            json!({ "$Type": "Edm.DateTimeOffset", "$Precision": i64::MAX }),
            Usage::Value,
        );
        assert_eq!(s["example"], "2017-04-13T15:51:04.000000000000Z");
    }

    #[test]
    fn test_date_time_precision() {
        let s = property_schema(
            json!({ "$Type": "Edm.DateTimeOffset", "$Precision": 3 }),
            Usage::Value,
        );
        assert_eq!(s["example"], "2017-04-13T15:51:04.000Z");
    }

    #[test]
    fn test_nullable_reference_is_wrapped() {
        let s = property_schema(
            json!({ "$Type": "n.Address", "$Nullable": true, "@Core.Description": "Home" }),
            Usage::Value,
        );
        assert_eq!(
            s,
            json!({
                "allOf": [{ "$ref": "#/components/schemas/n.Address" }],
                "nullable": true,
                "description": "Home"
            })
        );
    }

    #[test]
    fn test_collection_and_parameter_description() {
        let s = property_schema(
            json!({ "$Type": "Edm.Int32", "$Collection": true, "@Core.Description": "Numbers" }),
            Usage::Parameter,
        );
        assert_eq!(
            s,
            json!({ "type": "array", "items": { "type": "integer", "format": "int32" } })
        );
    }

    #[test]
    fn test_maximum_on_any_of() {
        let s = property_schema(
            json!({
                "$Type": "Edm.Int64",
                "@Validation.Maximum": 10,
                "@Validation.Maximum@Validation.Exclusive": true
            }),
            Usage::Value,
        );
        assert_eq!(s["anyOf"][0]["maximum"], 10);
        assert_eq!(s["exclusiveMaximum"], true);
    }

    #[test]
    fn test_function_parameter_literal() {
        let s = property_schema(json!({ "$Nullable": true }), Usage::FunctionParameter);
        assert_eq!(s["pattern"], "^(null|'([^']|'')*')$");
        assert_eq!(s["default"], "null");
        let s = property_schema(
            json!({ "@Validation.Pattern": "^[A-Z]+$" }),
            Usage::FunctionParameter,
        );
        assert_eq!(s["pattern"], "^'([A-Z]+)'$");
        let s = property_schema(json!({ "$Type": "Edm.Date" }), Usage::FunctionParameter);
        assert_eq!(s["example"], "2017-04-13");
    }

    #[test]
    fn test_stream_json_schema() {
        let s = property_schema(
            json!({ "$Type": "Edm.Stream", "@JSON.Schema": "{\"type\":\"object\"}" }),
            Usage::Value,
        );
        assert_eq!(s, json!({ "type": "object" }));
        let s = property_schema(
            json!({ "$Type": "Edm.Stream", "@JSON.Schema": "not json" }),
            Usage::Value,
        );
        assert_eq!(s, json!({ "type": "string", "format": "base64url" }));
    }
}
