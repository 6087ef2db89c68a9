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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Namespace of the primitive types.
pub const EDM: &str = "Edm";

/// Qualified name as written in the document: a namespace or an
/// alias, a dot and a simple name.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct QualifiedName<'a> {
    /// Namespace or alias.
    pub qualifier: &'a str,
    /// Simple name.
    pub name: &'a str,
}

impl<'a> QualifiedName<'a> {
    /// Split qualified name at the last dot. A name without any dot
    /// has an empty qualifier.
    #[must_use]
    pub fn parse(qualified: &'a str) -> Self {
        qualified.rfind('.').map_or(
            Self {
                qualifier: "",
                name: qualified,
            },
            |pos| Self {
                qualifier: &qualified[..pos],
                name: &qualified[pos + 1..],
            },
        )
    }

    /// Name belongs to the primitive types namespace.
    #[must_use]
    pub fn is_edm(&self) -> bool {
        self.qualifier == EDM
    }
}

impl Display for QualifiedName<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.qualifier, self.name)
    }
}

/// Identifiers never start with `$` and never contain `@`. All other
/// keys of a schema or an element are attributes or annotations.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    !name.starts_with('$') && !name.contains('@')
}

/// Simple name of a possibly qualified name.
#[must_use]
pub fn simple_name(name: &str) -> &str {
    QualifiedName::parse(name).name
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_splits_at_last_dot() {
        let qname = QualifiedName::parse("org.example.v1.Order");
        assert_eq!(qname.qualifier, "org.example.v1");
        assert_eq!(qname.name, "Order");
        assert_eq!(qname.to_string(), "org.example.v1.Order");
    }

    #[test]
    fn test_parse_without_qualifier() {
        let qname = QualifiedName::parse("Order");
        assert_eq!(qname.qualifier, "");
        assert_eq!(qname.name, "Order");
        assert!(!qname.is_edm());
        assert!(QualifiedName::parse("Edm.String").is_edm());
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("Orders"));
        assert!(!is_identifier("$Kind"));
        assert!(!is_identifier("@Core.Description"));
        assert!(!is_identifier("Status@Core.Description"));
    }
}
