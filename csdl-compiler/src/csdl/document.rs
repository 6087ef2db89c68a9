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

//! CSDL JSON document.

use crate::csdl::element::Element;
use crate::csdl::element::Scope;
use crate::csdl::qualified_name::is_identifier;
use crate::vocabulary::annotations::record;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// `$Include` entry of a reference.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Include {
    #[serde(rename = "$Namespace")]
    pub namespace: String,
    #[serde(rename = "$Alias")]
    pub alias: Option<String>,
}

impl Include {
    /// Alias if the include defines one, namespace otherwise.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.namespace)
    }
}

/// Reference to an external document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Reference {
    #[serde(rename = "$Include")]
    pub includes: Vec<Include>,
}

/// Parsed CSDL JSON document.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// `$Version` as written in the document.
    pub version: Option<String>,
    /// Qualified name of the entity container.
    pub entity_container: Option<String>,
    /// References keyed by document URL.
    pub references: IndexMap<String, Reference>,
    /// Schemas keyed by namespace.
    pub schemas: IndexMap<String, Element>,
}

impl Document {
    /// Parse document from JSON value. Anything that is not a CSDL
    /// construct is skipped, so parsing never fails.
    #[must_use]
    pub fn parse(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            debug!("CSDL document is not a JSON object");
            return Self::default();
        };
        let mut document = Self::default();
        for (key, value) in object {
            match key.as_str() {
                "$Version" => document.version = value.as_str().map(Into::into),
                "$EntityContainer" => {
                    document.entity_container = value.as_str().map(Into::into);
                }
                "$Reference" => {
                    document.references = value
                        .as_object()
                        .into_iter()
                        .flatten()
                        .map(|(url, reference)| (url.clone(), record(reference)))
                        .collect();
                }
                namespace if is_identifier(namespace) => match value.as_object() {
                    Some(schema) => {
                        document
                            .schemas
                            .insert(namespace.into(), Element::parse(Scope::Namespace, schema));
                    }
                    None => debug!(namespace, "schema is not a JSON object"),
                },
                _ => (),
            }
        }
        document
    }
}
