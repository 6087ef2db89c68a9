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

//! OpenAPI 3.0 document generation.
//!
//! [`Generator`] walks a preprocessed [`Model`] and produces the
//! OpenAPI document as a JSON value. Generation never fails on model
//! content: unresolvable references and unknown constructs are reported
//! with `tracing` at debug level and skipped. The only errors come from
//! options.

mod context;
mod diagram;
mod document;
mod extensions;
mod invocations;
/// Text helpers for tags, summaries and descriptions.
pub mod naming;
mod operations;
mod paths;
mod query_options;
mod responses;
mod schema;
mod security;
mod structured;

use crate::config::Options;
use crate::csdl::qualified_name::simple_name;
use crate::csdl::Element;
use crate::csdl::Model;
use crate::vocabulary::annotations::is_truthy;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::CapabilitiesTerm;
use crate::vocabulary::VocabularyIndex;
use context::Context;
use serde_json::Error as JsonError;
use serde_json::Map;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Version of the generated documents.
pub const OPENAPI_VERSION: &str = "3.0.2";

/// Error of OpenAPI generation.
#[derive(Debug)]
pub enum Error {
    /// `servers` option is not valid JSON.
    InvalidServers(JsonError),
    /// `servers` option is valid JSON but not a non-empty array.
    ServersNotArray,
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidServers(err) => Some(err),
            Self::ServersNotArray => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::InvalidServers(_) => write!(f, "The input server object is invalid."),
            Self::ServersNotArray => write!(f, "The input server object should be an array."),
        }
    }
}

/// Variant of a structured type schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaSuffix {
    Read,
    Create,
    Update,
}

impl SchemaSuffix {
    /// Suffix of the schema name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "",
            Self::Create => "-create",
            Self::Update => "-update",
        }
    }

    /// Suffix of the schema title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Read => "",
            Self::Create => " (for create)",
            Self::Update => " (for update)",
        }
    }
}

const CDS_AUTOEXPOSE: &str = "@cds.autoexpose";
const CDS_AUTOEXPOSED: &str = "@cds.autoexposed";

/// OpenAPI document generator for one model.
pub struct Generator<'a> {
    model: &'a Model,
    voc: &'a VocabularyIndex,
    options: &'a Options,
    container: Option<&'a Element>,
    container_schema: Option<&'a Element>,
    /// Prefix of system query option names: `$` up to version 4.01.
    query_prefix: &'static str,
    key_as_segment: bool,
    /// Container children exposed only because their type is
    /// auto-exposed. They are read-only.
    auto_exposed: HashSet<&'a str>,
}

impl<'a> Generator<'a> {
    #[must_use]
    pub fn new(model: &'a Model, options: &'a Options) -> Self {
        let container = model.entity_container();
        let container_schema = model.container_schema();
        let voc = model.voc();
        let key_as_segment =
            container.is_some_and(|c| c.has_term(voc, CapabilitiesTerm::KeyAsSegmentSupported));
        let query_prefix = if options.odata_version.as_str() <= "4.01" {
            "$"
        } else {
            ""
        };
        Self {
            model,
            voc,
            options,
            container,
            container_schema,
            query_prefix,
            key_as_segment,
            auto_exposed: Self::auto_exposed(container, container_schema),
        }
    }

    fn auto_exposed(
        container: Option<&'a Element>,
        container_schema: Option<&'a Element>,
    ) -> HashSet<&'a str> {
        let (Some(container), Some(schema)) = (container, container_schema) else {
            return HashSet::new();
        };
        container
            .elements()
            .filter_map(|(name, child)| {
                let type_name = simple_name(child.type_name()?);
                let t = schema.element(type_name)?;
                let exposed = [CDS_AUTOEXPOSE, CDS_AUTOEXPOSED]
                    .iter()
                    .any(|key| t.annotation(key).is_some_and(is_truthy));
                (exposed && container.member(type_name).is_none()).then_some(name.as_str())
            })
            .collect()
    }

    /// Protocol version the document describes.
    fn version(&self) -> &str {
        &self.options.odata_version
    }

    /// Generate the document.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidServers` if the `servers` option is not JSON
    /// - `Error::ServersNotArray` if the `servers` option is not a non-empty array
    pub fn generate(&self) -> Result<Value, Error> {
        let mut ctx = Context::default();
        let servers = self.servers()?;
        let mut openapi = Map::new();
        openapi.insert("openapi".into(), OPENAPI_VERSION.into());
        openapi.insert("info".into(), self.info().into());
        openapi.insert("x-sap-api-type".into(), "ODATAV4".into());
        openapi.insert("x-odata-version".into(), self.version().into());
        openapi.insert("x-sap-shortText".into(), self.short_text().into());
        if self.container.is_some() {
            openapi.insert("servers".into(), servers);
            openapi.insert("tags".into(), self.tags().into());
        }
        openapi.insert("paths".into(), self.paths(&mut ctx).into());
        openapi.insert("components".into(), self.components(&mut ctx).into());
        if let Some(external_docs) = self.external_docs() {
            openapi.insert("externalDocs".into(), external_docs.into());
        }
        if let Some(schema) = self.container_schema {
            for (key, value) in extensions::extensions(schema.annotations()) {
                openapi.insert(key, value);
            }
        }
        if let Some(security) = self.security() {
            openapi.insert("security".into(), security.into());
        }
        Ok(Value::Object(openapi))
    }

    fn components(&self, ctx: &mut Context) -> Map<String, Value> {
        let mut components = Map::new();
        components.insert("schemas".into(), self.schemas(ctx).into());
        if self.container.is_some() {
            components.insert("parameters".into(), self.component_parameters().into());
            components.insert(
                "responses".into(),
                serde_json::json!({
                    "error": {
                        "description": "Error",
                        "content": {
                            "application/json": {
                                "schema": schema::local_reference("error")
                            }
                        }
                    }
                }),
            );
        }
        if let Some(security_schemes) = self.security_schemes() {
            components.insert("securitySchemes".into(), security_schemes.into());
        }
        components
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::csdl::Document;
    use serde_json::json;

    pub(crate) fn generate_with(csdl: &Value, options: &Options) -> Value {
        let model = Model::new(Document::parse(csdl));
        Generator::new(&model, options)
            .generate()
            .expect("generated document")
    }

    pub(crate) fn generate(csdl: &Value) -> Value {
        generate_with(csdl, &Options::default())
    }

    #[test]
    fn test_document_key_order() {
        let doc = generate(&json!({
            "$Version": "4.0",
            "$EntityContainer": "n.Service",
            "n": { "Service": { "$Kind": "EntityContainer" } }
        }));
        let keys: Vec<_> = doc.as_object().expect("object").keys().cloned().collect();
        assert_eq!(
            keys,
            [
                "openapi",
                "info",
                "x-sap-api-type",
                "x-odata-version",
                "x-sap-shortText",
                "servers",
                "tags",
                "paths",
                "components"
            ]
        );
        assert_eq!(doc["x-odata-version"], "4.01");
    }

    #[test]
    fn test_no_container() {
        let doc = generate(&json!({
            "$Version": "4.0",
            "n": { "T": { "$Kind": "ComplexType", "a": {} } }
        }));
        assert!(doc.get("servers").is_none());
        assert!(doc.get("tags").is_none());
        assert_eq!(doc["paths"], json!({}));
        assert_eq!(doc["info"]["description"], "");
        let components = doc["components"].as_object().expect("components");
        assert!(components.get("parameters").is_none());
        assert!(components["schemas"].get("n.T").is_none());
    }

    #[test]
    fn test_auto_exposed_is_read_only() {
        let doc = generate(&json!({
            "$EntityContainer": "n.Service",
            "n": {
                "Code": {
                    "$Kind": "EntityType",
                    "@cds.autoexpose": true,
                    "$Key": ["code"],
                    "code": {}
                },
                "Service": {
                    "$Kind": "EntityContainer",
                    "Codes": { "$Collection": true, "$Type": "n.Code" }
                }
            }
        }));
        let paths = doc["paths"].as_object().expect("paths");
        assert!(paths["/Codes"].get("get").is_some());
        assert!(paths["/Codes"].get("post").is_none());
        let by_key = &paths["/Codes('{code}')"];
        assert!(by_key.get("get").is_some());
        assert!(by_key.get("patch").is_none());
        assert!(by_key.get("delete").is_none());
    }

    #[test]
    fn test_version_prefix() {
        let csdl = json!({
            "$EntityContainer": "n.Service",
            "n": {
                "T": { "$Kind": "EntityType", "$Key": ["id"], "id": {} },
                "Service": { "$Kind": "EntityContainer", "S": { "$Collection": true, "$Type": "n.T" } }
            }
        });
        let options = Options {
            odata_version: "4.02".into(),
            ..Options::default()
        };
        let doc = generate_with(&csdl, &options);
        let parameters = doc["paths"]["/S"]["get"]["parameters"]
            .as_array()
            .expect("parameters");
        assert!(parameters.iter().any(|p| p["name"] == "filter"));
        assert!(!parameters.iter().any(|p| p["name"] == "$filter"));
    }
}
