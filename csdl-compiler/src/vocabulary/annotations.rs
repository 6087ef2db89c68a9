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

use crate::vocabulary::CommonTerm;
use crate::vocabulary::CoreTerm;
use crate::vocabulary::Term;
use crate::vocabulary::VocabularyIndex;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

/// JSON value that counts as set: everything except `null`, `false`,
/// zero and the empty string.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(v) => *v,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty string value.
#[must_use]
pub fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Deserialize an annotation record. Records that don't match the
/// expected shape are reported and replaced by the default record.
pub fn record<R: DeserializeOwned + Default>(value: &Value) -> R {
    R::deserialize(value).unwrap_or_else(|err| {
        debug!(%err, "malformed annotation record");
        R::default()
    })
}

/// Annotations attached to a model element or to an annotation record.
pub trait Annotations {
    fn annotations(&self) -> &Map<String, Value>;

    /// Annotation by its key in the document.
    fn annotation(&self, key: &str) -> Option<&Value> {
        self.annotations().get(key)
    }

    /// Value of a vocabulary term.
    fn term<T: Term>(&self, voc: &VocabularyIndex, term: T) -> Option<&Value> {
        voc.key(term).and_then(|key| self.annotations().get(key))
    }

    /// Non-empty string value of a vocabulary term.
    fn term_str<T: Term>(&self, voc: &VocabularyIndex, term: T) -> Option<&str> {
        self.term(voc, term).and_then(non_empty_str)
    }

    /// Term is present with a set value (tag terms are usually `true`).
    fn has_term<T: Term>(&self, voc: &VocabularyIndex, term: T) -> bool {
        self.term(voc, term).is_some_and(is_truthy)
    }

    /// Term is explicitly `false`.
    fn term_is_false<T: Term>(&self, voc: &VocabularyIndex, term: T) -> bool {
        matches!(self.term(voc, term), Some(Value::Bool(false)))
    }

    /// Record value of a term.
    fn term_record<R: DeserializeOwned + Default, T: Term>(
        &self,
        voc: &VocabularyIndex,
        term: T,
    ) -> Option<R> {
        self.term(voc, term).map(record)
    }

    fn description(&self, voc: &VocabularyIndex) -> Option<&str> {
        self.term_str(voc, CoreTerm::Description)
    }

    fn long_description(&self, voc: &VocabularyIndex) -> Option<&str> {
        self.term_str(voc, CoreTerm::LongDescription)
    }

    /// Long description, falling back to the description.
    fn any_description(&self, voc: &VocabularyIndex) -> Option<&str> {
        self.long_description(voc).or_else(|| self.description(voc))
    }

    fn label(&self, voc: &VocabularyIndex) -> Option<&str> {
        self.term_str(voc, CommonTerm::Label)
    }
}

impl Annotations for Map<String, Value> {
    fn annotations(&self) -> &Map<String, Value> {
        self
    }
}
