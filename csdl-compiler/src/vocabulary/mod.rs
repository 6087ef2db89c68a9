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

//! Vocabulary terms understood by the compiler.
//!
//! Every document chooses its own aliases for the vocabularies it
//! includes, so the annotation key of a term (`@<alias>.<Term>`) is only
//! known after the references of the document are read.
//! [`VocabularyIndex`] holds these keys; the rest of the crate looks up
//! terms through it and never spells annotation keys directly.

/// Access to annotations of elements and annotation records.
pub mod annotations;
/// Authorization vocabulary records.
pub mod authorization;
/// Capabilities vocabulary records.
pub mod capabilities;

use std::collections::HashMap;
use strum::EnumIter;
use strum::IntoEnumIterator;
use strum::IntoStaticStr;

/// Vocabularies with terms used by the compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    Authorization,
    Capabilities,
    Core,
    Json,
    Validation,
    Common,
}

impl Vocabulary {
    /// Namespace of the vocabulary.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Authorization => "Org.OData.Authorization.V1",
            Self::Capabilities => "Org.OData.Capabilities.V1",
            Self::Core => "Org.OData.Core.V1",
            Self::Json => "Org.OData.JSON.V1",
            Self::Validation => "Org.OData.Validation.V1",
            Self::Common => "com.sap.vocabularies.Common.v1",
        }
    }

    // CAP writes `@Common.FieldControl` with the default alias even
    // when the vocabulary is not referenced.
    const fn fallback_term(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Common => Some(("Common", "FieldControl")),
            _ => None,
        }
    }
}

/// Term of a vocabulary.
pub trait Term: Copy + Into<&'static str> + IntoEnumIterator {
    const VOCABULARY: Vocabulary;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum AuthorizationTerm {
    Authorizations,
    SecuritySchemes,
}

impl Term for AuthorizationTerm {
    const VOCABULARY: Vocabulary = Vocabulary::Authorization;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum CapabilitiesTerm {
    BatchSupport,
    BatchSupported,
    ChangeTracking,
    CountRestrictions,
    DeleteRestrictions,
    DeepUpdateSupport,
    ExpandRestrictions,
    FilterRestrictions,
    IndexableByKey,
    InsertRestrictions,
    KeyAsSegmentSupported,
    NavigationRestrictions,
    OperationRestrictions,
    ReadRestrictions,
    SearchRestrictions,
    SelectSupport,
    SkipSupported,
    SortRestrictions,
    TopSupported,
    UpdateRestrictions,
}

impl Term for CapabilitiesTerm {
    const VOCABULARY: Vocabulary = Vocabulary::Capabilities;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum CoreTerm {
    AcceptableMediaTypes,
    Computed,
    ComputedDefaultValue,
    DefaultNamespace,
    Description,
    Example,
    Immutable,
    LongDescription,
    OptionalParameter,
    Permissions,
    SchemaVersion,
}

impl Term for CoreTerm {
    const VOCABULARY: Vocabulary = Vocabulary::Core;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum JsonTerm {
    Schema,
}

impl Term for JsonTerm {
    const VOCABULARY: Vocabulary = Vocabulary::Json;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum ValidationTerm {
    AllowedValues,
    Exclusive,
    Maximum,
    Minimum,
    Pattern,
}

impl Term for ValidationTerm {
    const VOCABULARY: Vocabulary = Vocabulary::Validation;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum CommonTerm {
    FieldControl,
    Label,
}

impl Term for CommonTerm {
    const VOCABULARY: Vocabulary = Vocabulary::Common;
}

/// Annotation keys of all known terms in one document.
#[derive(Debug, Default)]
pub struct VocabularyIndex {
    keys: HashMap<(Vocabulary, &'static str), String>,
}

impl VocabularyIndex {
    /// Build index from map of namespace to the alias used for it in
    /// the document. Terms of vocabularies missing from the map are not
    /// indexed.
    #[must_use]
    pub fn new(aliases: &HashMap<String, String>) -> Self {
        let mut index = Self::default();
        index.register::<AuthorizationTerm>(aliases);
        index.register::<CapabilitiesTerm>(aliases);
        index.register::<CoreTerm>(aliases);
        index.register::<JsonTerm>(aliases);
        index.register::<ValidationTerm>(aliases);
        index.register::<CommonTerm>(aliases);
        index
    }

    fn register<T: Term>(&mut self, aliases: &HashMap<String, String>) {
        let vocabulary = T::VOCABULARY;
        if let Some(alias) = aliases.get(vocabulary.namespace()) {
            for term in T::iter() {
                let name: &'static str = term.into();
                self.keys
                    .insert((vocabulary, name), format!("@{alias}.{name}"));
            }
        } else if let Some((alias, name)) = vocabulary.fallback_term() {
            self.keys
                .insert((vocabulary, name), format!("@{alias}.{name}"));
        }
    }

    /// Annotation key of the term in this document.
    #[must_use]
    pub fn key<T: Term>(&self, term: T) -> Option<&str> {
        let name: &'static str = term.into();
        self.keys.get(&(T::VOCABULARY, name)).map(String::as_str)
    }

    /// Key of an annotation annotating another annotation, such as
    /// `@Validation.Maximum@Validation.Exclusive`.
    #[must_use]
    pub fn nested_key<T: Term, U: Term>(&self, outer: T, inner: U) -> Option<String> {
        self.key(outer)
            .zip(self.key(inner))
            .map(|(outer, inner)| format!("{outer}{inner}"))
    }
}
