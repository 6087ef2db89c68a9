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

//! Document level objects: info, servers, tags and external docs.

use crate::openapi::naming::compare_tags;
use crate::openapi::naming::normalise_tag;
use crate::openapi::Error;
use crate::openapi::Generator;
use crate::vocabulary::annotations::non_empty_str;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::CoreTerm;
use indexmap::IndexMap;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;

const NO_DESCRIPTION: &str =
    "Use @Core.LongDescription: '...' or @Core.Description: '...' on your CDS service to provide a meaningful description.";
const NO_TITLE: &str = "Use @title: '...' on your CDS service to provide a meaningful title.";
const NO_SHORT_TEXT: &str =
    "Use @Core.Description: '...' on your CDS service to provide a meaningful short text.";

impl Generator<'_> {
    /// Info Object. Annotations of the container take precedence over
    /// those of its schema.
    pub(crate) fn info(&self) -> Map<String, Value> {
        let voc = self.voc;
        let container = self.container;
        let schema = self.container_schema;
        let title = container
            .and_then(|c| c.label(voc))
            .unwrap_or(NO_TITLE);
        let description = match container {
            Some(c) => {
                let mut description = c
                    .long_description(voc)
                    .or_else(|| schema.and_then(|s| s.long_description(voc)))
                    .or_else(|| c.description(voc))
                    .or_else(|| schema.and_then(|s| s.description(voc)))
                    .unwrap_or(NO_DESCRIPTION)
                    .to_string();
                if self.options.diagram {
                    description.push_str(&self.diagram(c));
                }
                description
            }
            None => String::new(),
        };
        let version = schema
            .and_then(|s| s.term_str(voc, CoreTerm::SchemaVersion))
            .unwrap_or_default();

        let mut info = Map::new();
        info.insert("title".into(), title.into());
        info.insert("description".into(), description.into());
        info.insert("version".into(), version.into());
        info
    }

    pub(crate) fn short_text(&self) -> &str {
        self.container
            .and_then(|c| c.description(self.voc))
            .or_else(|| self.container_schema.and_then(|s| s.description(self.voc)))
            .unwrap_or(NO_SHORT_TEXT)
    }

    /// Servers from the `servers` option, or the service root.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidServers` if the option is not JSON
    /// - `Error::ServersNotArray` if the option is not a non-empty array
    pub(crate) fn servers(&self) -> Result<Value, Error> {
        let Some(servers) = &self.options.servers else {
            return Ok(json!([{ "url": self.options.service_root() }]));
        };
        let servers: Value = serde_json::from_str(servers).map_err(Error::InvalidServers)?;
        if servers.as_array().is_some_and(|list| !list.is_empty()) {
            Ok(servers)
        } else {
            Err(Error::ServersNotArray)
        }
    }

    /// One tag per entity set or singleton, named by the label of its
    /// type. Resources sharing a label share a tag.
    pub(crate) fn tags(&self) -> Vec<Value> {
        let Some(container) = self.container else {
            return Vec::new();
        };
        let mut tags: IndexMap<&str, Option<&str>> = IndexMap::new();
        for (name, child) in container.elements() {
            let Some(type_name) = child.type_name() else {
                continue;
            };
            let t = self.model.element(type_name);
            let tag = t.and_then(|t| t.label(self.voc)).unwrap_or(name);
            let description = child
                .description(self.voc)
                .or_else(|| t.and_then(|t| t.description(self.voc)));
            tags.insert(tag, description);
        }
        let mut tags: Vec<(String, Option<&str>)> = tags
            .into_iter()
            .map(|(name, description)| (normalise_tag(name), description))
            .collect();
        tags.sort_by(|(a, _), (b, _)| compare_tags(a, b));
        tags.into_iter()
            .map(|(name, description)| {
                let mut tag = Map::new();
                tag.insert("name".into(), name.into());
                if let Some(description) = description {
                    tag.insert("description".into(), description.into());
                }
                Value::Object(tag)
            })
            .collect()
    }

    /// External Documentation Object from annotations of the container
    /// schema.
    pub(crate) fn external_docs(&self) -> Option<Map<String, Value>> {
        let schema = self.container_schema?;
        let mut docs = Map::new();
        for (key, field) in [
            ("@OpenAPI.externalDocs.description", "description"),
            ("@OpenAPI.externalDocs.url", "url"),
        ] {
            if let Some(value) = schema.annotation(key).and_then(non_empty_str) {
                docs.insert(field.into(), value.into());
            }
        }
        (!docs.is_empty()).then_some(docs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Options;
    use crate::csdl::Document;
    use crate::csdl::Model;
    use crate::openapi::test::generate;
    use pretty_assertions::assert_eq;

    fn service() -> Value {
        json!({
            "$EntityContainer": "self.Container",
            "$Reference": {
                "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Core.V1.json": {
                    "$Include": [{ "$Namespace": "Org.OData.Core.V1", "$Alias": "Core" }]
                },
                "https://sap.github.io/odata-vocabularies/vocabularies/Common.json": {
                    "$Include": [{ "$Namespace": "com.sap.vocabularies.Common.v1", "$Alias": "Common" }]
                }
            },
            "self": {
                "@Core.SchemaVersion": "1.2.0",
                "@Core.Description": "Schema description",
                "@OpenAPI.externalDocs.url": "https://example.org/docs",
                "Order": { "$Kind": "EntityType", "@Common.Label": "Sales_Order" },
                "Item": { "$Kind": "EntityType", "@Core.Description": "Line item" },
                "Container": {
                    "$Kind": "EntityContainer",
                    "@Common.Label": "Sales",
                    "Orders": { "$Collection": true, "$Type": "self.Order" },
                    "OpenOrders": { "$Collection": true, "$Type": "self.Order", "@Core.Description": "Open" },
                    "items": { "$Collection": true, "$Type": "self.Item" }
                }
            }
        })
    }

    #[test]
    fn test_info() {
        let openapi = generate(&service());
        assert_eq!(
            openapi["info"],
            json!({ "title": "Sales", "description": "Schema description", "version": "1.2.0" })
        );
        assert_eq!(openapi["x-sap-shortText"], "Schema description");
        assert_eq!(openapi["externalDocs"], json!({ "url": "https://example.org/docs" }));
    }

    #[test]
    fn test_tags() {
        let openapi = generate(&service());
        assert_eq!(
            openapi["tags"],
            json!([
                { "name": "items", "description": "Line item" },
                { "name": "Sales Order", "description": "Open" }
            ])
        );
    }

    #[test]
    fn test_servers() {
        let model = Model::new(Document::parse(&service()));
        let mut options = Options {
            url: Some("https://api.example.org/v1".into()),
            ..Options::default()
        };
        let servers = Generator::new(&model, &options).servers().expect("servers");
        assert_eq!(servers, json!([{ "url": "https://api.example.org/v1" }]));

        options.servers = Some(r#"[{ "url": "https://a" }, { "url": "https://b" }]"#.into());
        let servers = Generator::new(&model, &options).servers().expect("servers");
        assert_eq!(servers[1]["url"], "https://b");

        options.servers = Some("{ not json".into());
        assert!(matches!(
            Generator::new(&model, &options).servers(),
            Err(Error::InvalidServers(_))
        ));
        options.servers = Some(r#"{ "url": "https://a" }"#.into());
        assert!(matches!(
            Generator::new(&model, &options).servers(),
            Err(Error::ServersNotArray)
        ));
        options.servers = Some("[]".into());
        assert!(matches!(
            Generator::new(&model, &options).servers(),
            Err(Error::ServersNotArray)
        ));
    }
}
