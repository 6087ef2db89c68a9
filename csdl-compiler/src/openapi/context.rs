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

use crate::openapi::SchemaSuffix;
use std::collections::HashSet;

/// Schema required by a reference emitted into the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RequiredSchema {
    pub namespace: String,
    pub name: String,
    pub suffix: SchemaSuffix,
}

/// Mutable state of one generation run.
#[derive(Debug, Default)]
pub(crate) struct Context {
    /// Schemas to emit in order of first reference. The list grows
    /// while schemas are generated.
    required: Vec<RequiredSchema>,
    used: HashSet<String>,
    /// A reference to the inline `geoPoint` schema was emitted.
    pub inline_geo_point: bool,
}

impl Context {
    /// Record schema as required unless it already is.
    pub fn require(&mut self, namespace: &str, name: &str, suffix: SchemaSuffix) {
        let key = format!("{namespace}.{name}{}", suffix.as_str());
        if self.used.insert(key) {
            self.required.push(RequiredSchema {
                namespace: namespace.into(),
                name: name.into(),
                suffix,
            });
        }
    }

    pub fn required(&self, index: usize) -> Option<&RequiredSchema> {
        self.required.get(index)
    }
}
