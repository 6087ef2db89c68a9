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

//! Preprocessed model of one CSDL document.
//!
//! The model resolves qualified names written with either namespaces
//! or aliases, and owns the indexes built once when the document is
//! loaded: bound overloads by binding type and derived types by base
//! type.

use crate::csdl::document::Document;
use crate::csdl::element::Element;
use crate::csdl::element::Member;
use crate::csdl::preprocess;
use crate::csdl::qualified_name::QualifiedName;
use crate::csdl::qualified_name::EDM;
use crate::vocabulary::VocabularyIndex;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::HashSet;

/// Position of a bound overload in the document.
#[derive(Clone, Debug)]
pub struct BoundOverload {
    /// Name used as path segment: the simple name in a default
    /// namespace, the alias-qualified name otherwise.
    pub name: String,
    pub(crate) schema: String,
    pub(crate) member: String,
    pub(crate) index: usize,
}

/// Preprocessed CSDL document.
#[derive(Debug)]
pub struct Model {
    pub(crate) document: Document,
    /// Namespace to the qualifier used for it (alias or namespace).
    pub(crate) aliases: HashMap<String, String>,
    /// Namespace or alias to namespace.
    pub(crate) namespaces: HashMap<String, String>,
    /// Namespace to the URL of the referenced document.
    pub(crate) namespace_urls: HashMap<String, String>,
    pub(crate) voc: VocabularyIndex,
    /// Binding type (`-c` suffix for collection binding) to bound
    /// overloads.
    pub(crate) bound_overloads: HashMap<String, Vec<BoundOverload>>,
    /// Namespace-qualified base type to derived types.
    pub(crate) derived_types: HashMap<String, Vec<String>>,
}

impl Model {
    /// Build the model: register references and aliases, merge
    /// out-of-line annotations onto their targets and build indexes.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let mut model = Self {
            document,
            aliases: HashMap::new(),
            namespaces: HashMap::from([(EDM.to_string(), EDM.to_string())]),
            namespace_urls: HashMap::new(),
            voc: VocabularyIndex::default(),
            bound_overloads: HashMap::new(),
            derived_types: HashMap::new(),
        };
        preprocess::run(&mut model);
        model
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub const fn voc(&self) -> &VocabularyIndex {
        &self.voc
    }

    /// All schemas in document order.
    pub fn schemas(&self) -> impl Iterator<Item = (&String, &Element)> {
        self.document.schemas.iter()
    }

    /// Schema by namespace or alias.
    #[must_use]
    pub fn schema(&self, qualifier: &str) -> Option<&Element> {
        self.schema_key(qualifier)
            .and_then(|key| self.document.schemas.get(key))
    }

    pub(crate) fn schema_key<'a>(&'a self, qualifier: &'a str) -> Option<&'a str> {
        if self.document.schemas.contains_key(qualifier) {
            Some(qualifier)
        } else {
            self.namespaces
                .get(qualifier)
                .map(String::as_str)
                .filter(|ns| self.document.schemas.contains_key(*ns))
        }
    }

    /// Model element or overloads by qualified name.
    #[must_use]
    pub fn member(&self, qualified_name: &str) -> Option<&Member> {
        let qname = QualifiedName::parse(qualified_name);
        self.schema(qname.qualifier)
            .and_then(|schema| schema.member(qname.name))
    }

    /// Model element (not an overload set) by qualified name.
    #[must_use]
    pub fn element(&self, qualified_name: &str) -> Option<&Element> {
        self.member(qualified_name).and_then(Member::as_element)
    }

    /// Overloads of an action or a function by qualified name.
    #[must_use]
    pub fn overloads(&self, qualified_name: &str) -> Option<&[Element]> {
        self.member(qualified_name).and_then(Member::as_overloads)
    }

    /// Namespace of a namespace or an alias.
    #[must_use]
    pub fn namespace(&self, qualifier: &str) -> Option<&str> {
        self.namespaces.get(qualifier).map(String::as_str)
    }

    /// Qualified name with the alias replaced by its namespace. Unknown
    /// qualifiers are kept.
    #[must_use]
    pub fn namespace_qualified_name(&self, qualified_name: &str) -> String {
        let qname = QualifiedName::parse(qualified_name);
        let namespace = self.namespace(qname.qualifier).unwrap_or(qname.qualifier);
        format!("{namespace}.{}", qname.name)
    }

    /// URL of the document that defines the namespace, empty for
    /// namespaces of this document.
    #[must_use]
    pub fn namespace_url(&self, namespace: &str) -> &str {
        self.namespace_urls
            .get(namespace)
            .map_or("", String::as_str)
    }

    /// Entity container of the document.
    #[must_use]
    pub fn entity_container(&self) -> Option<&Element> {
        self.document
            .entity_container
            .as_deref()
            .and_then(|name| self.element(name))
    }

    /// Schema that defines the entity container.
    #[must_use]
    pub fn container_schema(&self) -> Option<&Element> {
        self.document
            .entity_container
            .as_deref()
            .and_then(|name| self.schema(QualifiedName::parse(name).qualifier))
    }

    /// Overloads bound to a type. The key is the qualified binding
    /// type, with `-c` appended for collection binding.
    pub fn bound_overloads<'a>(
        &'a self,
        binding: &str,
    ) -> impl Iterator<Item = (&'a str, &'a Element)> + 'a {
        self.bound_overloads
            .get(&self.binding_key(binding))
            .into_iter()
            .flatten()
            .filter_map(move |bound| {
                self.document
                    .schemas
                    .get(&bound.schema)
                    .and_then(|schema| schema.member(&bound.member))
                    .and_then(Member::as_overloads)
                    .and_then(|overloads| overloads.get(bound.index))
                    .map(|overload| (bound.name.as_str(), overload))
            })
    }

    pub(crate) fn binding_key(&self, binding: &str) -> String {
        binding.strip_suffix("-c").map_or_else(
            || self.namespace_qualified_name(binding),
            |t| format!("{}-c", self.namespace_qualified_name(t)),
        )
    }

    /// Alias-qualified names of types directly derived from the type.
    #[must_use]
    pub fn derived_types(&self, qualified_name: &str) -> &[String] {
        self.derived_types
            .get(&self.namespace_qualified_name(qualified_name))
            .map_or(&[], Vec::as_slice)
    }

    /// Properties and navigation properties of a structured type
    /// including inherited ones. Base type properties come first;
    /// a property redefined in a derived type keeps the position of the
    /// base type property.
    #[must_use]
    pub fn properties<'a>(&'a self, structured_type: &'a Element) -> IndexMap<&'a str, &'a Element> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(structured_type);
        while let Some(t) = current {
            if !visited.insert(std::ptr::from_ref(t)) {
                break;
            }
            chain.push(t);
            current = t.base_type().and_then(|base| self.element(base));
        }
        chain
            .into_iter()
            .rev()
            .flat_map(Element::elements)
            .map(|(name, property)| (name.as_str(), property))
            .collect()
    }

    /// `$Key` of an entity type, inherited from the nearest base type
    /// that defines it.
    #[must_use]
    pub fn key_of<'a>(&'a self, entity_type: &'a Element) -> Option<&'a Vec<Value>> {
        let mut visited = HashSet::new();
        let mut current = Some(entity_type);
        while let Some(t) = current {
            if let Some(key) = t.key() {
                return Some(key);
            }
            if !visited.insert(std::ptr::from_ref(t)) {
                break;
            }
            current = t.base_type().and_then(|base| self.element(base));
        }
        None
    }
}
