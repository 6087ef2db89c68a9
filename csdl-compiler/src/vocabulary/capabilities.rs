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

//! Records of the Capabilities vocabulary.
//!
//! Records are read leniently: every member is optional, unknown
//! members are ignored and annotations of a record (`@Core.Description`
//! inside `FilterRestrictions`, for example) are kept in `annotations`.

use crate::vocabulary::annotations::Annotations;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;

/// Enumeration member or path value. Both the plain form (`"None"`)
/// and the wrapped form (`{"$EnumMember": "..."}`,
/// `{"$NavigationPropertyPath": "..."}`) are accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawExpression")]
pub struct Expression(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpression {
    Plain(String),
    Wrapped(BTreeMap<String, String>),
}

impl From<RawExpression> for Expression {
    fn from(v: RawExpression) -> Self {
        match v {
            RawExpression::Plain(v) => Self(v),
            RawExpression::Wrapped(v) => Self(v.into_values().next().unwrap_or_default()),
        }
    }
}

impl Expression {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Member name of an enumeration value, without the qualified
    /// enumeration type prefix (`Capabilities.NavigationType/None`).
    #[must_use]
    pub fn member(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

/// `Capabilities.CustomParameter`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CustomParameter {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "DocumentationURL")]
    pub documentation_url: Option<String>,
    pub required: Option<bool>,
}

/// `Capabilities.HttpResponse`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub status_code: Value,
    pub description: Option<String>,
}

impl ErrorResponse {
    /// Status code as a response key.
    #[must_use]
    pub fn status_code(&self) -> String {
        match &self.status_code {
            Value::String(v) => v.clone(),
            v => v.to_string(),
        }
    }
}

/// Members shared by all restrictions of one kind of request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OperationDetails {
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub custom_headers: Vec<CustomParameter>,
    pub custom_query_options: Vec<CustomParameter>,
    pub error_responses: Option<Vec<ErrorResponse>>,
}

impl OperationDetails {
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref().filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn error_responses(&self) -> Option<&[ErrorResponse]> {
        self.error_responses.as_deref()
    }
}

/// `Capabilities.ReadRestrictions`; the nested by-key restrictions
/// share the same shape.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ReadRestrictions {
    pub readable: Option<bool>,
    pub read_by_key_restrictions: Option<Box<ReadRestrictions>>,
    #[serde(flatten)]
    pub details: OperationDetails,
}

/// `Capabilities.InsertRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct InsertRestrictions {
    pub insertable: Option<bool>,
    #[serde(flatten)]
    pub details: OperationDetails,
}

/// `Capabilities.UpdateRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UpdateRestrictions {
    pub updatable: Option<bool>,
    pub update_method: Option<Expression>,
    #[serde(flatten)]
    pub details: OperationDetails,
}

impl UpdateRestrictions {
    /// HTTP method of update requests.
    #[must_use]
    pub fn method(&self) -> String {
        self.update_method
            .as_ref()
            .map(Expression::member)
            .filter(|m| !m.is_empty())
            .map_or_else(|| "patch".to_string(), str::to_lowercase)
    }
}

/// `Capabilities.DeleteRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeleteRestrictions {
    pub deletable: Option<bool>,
    #[serde(flatten)]
    pub details: OperationDetails,
}

/// `Capabilities.OperationRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OperationRestrictions {
    #[serde(flatten)]
    pub details: OperationDetails,
}

/// `Capabilities.FilterRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FilterRestrictions {
    pub filterable: Option<bool>,
    pub requires_filter: Option<bool>,
    pub required_properties: Option<Vec<Expression>>,
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

/// `Capabilities.SortRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SortRestrictions {
    pub sortable: Option<bool>,
    pub non_sortable_properties: Vec<Expression>,
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

/// `Capabilities.SearchRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SearchRestrictions {
    pub searchable: Option<bool>,
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

/// `Capabilities.SelectSupport`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SelectSupport {
    pub supported: Option<bool>,
}

/// `Capabilities.ExpandRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ExpandRestrictions {
    pub expandable: Option<bool>,
    pub non_expandable_properties: Vec<Expression>,
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

/// `Capabilities.CountRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CountRestrictions {
    pub countable: Option<bool>,
}

impl CountRestrictions {
    #[must_use]
    pub fn is_not_countable(&self) -> bool {
        self.countable == Some(false)
    }
}

/// `Capabilities.ChangeTracking`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ChangeTracking {
    pub supported: Option<bool>,
}

/// `Capabilities.BatchSupport`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BatchSupport {
    pub supported: Option<bool>,
    #[serde(flatten)]
    pub annotations: Map<String, Value>,
}

/// `Capabilities.NavigationRestrictions`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NavigationRestrictions {
    pub navigability: Option<Expression>,
    pub restricted_properties: Vec<NavigationPropertyRestriction>,
}

impl NavigationRestrictions {
    /// Restrictions for one navigation path relative to the annotated
    /// resource.
    #[must_use]
    pub fn restricted_property(&self, path: &str) -> Option<&NavigationPropertyRestriction> {
        self.restricted_properties.iter().find(|r| {
            r.navigation_property
                .as_ref()
                .is_some_and(|p| p.as_str() == path)
        })
    }

    #[must_use]
    pub fn navigability(&self) -> Option<&str> {
        self.navigability.as_ref().map(Expression::member)
    }
}

/// `Capabilities.NavigationPropertyRestriction`: overrides of target
/// restrictions for one navigation path.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NavigationPropertyRestriction {
    pub navigation_property: Option<Expression>,
    pub navigability: Option<Expression>,
    pub read_restrictions: Option<ReadRestrictions>,
    pub insert_restrictions: Option<InsertRestrictions>,
    pub update_restrictions: Option<UpdateRestrictions>,
    pub delete_restrictions: Option<DeleteRestrictions>,
    pub filter_restrictions: Option<FilterRestrictions>,
    pub search_restrictions: Option<SearchRestrictions>,
    pub sort_restrictions: Option<SortRestrictions>,
    pub select_support: Option<SelectSupport>,
    pub top_supported: Option<bool>,
    pub skip_supported: Option<bool>,
    pub indexable_by_key: Option<bool>,
}

impl NavigationPropertyRestriction {
    #[must_use]
    pub fn navigability(&self) -> Option<&str> {
        self.navigability.as_ref().map(Expression::member)
    }
}

macro_rules! record_annotations {
    ($($record:ty),*) => {
        $(
            impl Annotations for $record {
                fn annotations(&self) -> &Map<String, Value> {
                    &self.annotations
                }
            }
        )*
    };
}

record_annotations!(
    FilterRestrictions,
    SortRestrictions,
    SearchRestrictions,
    ExpandRestrictions,
    BatchSupport
);
