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

use crate::csdl::qualified_name::simple_name;
use crate::vocabulary::capabilities::Expression;
use serde::Deserialize;

/// One entry of `Authorization.Authorizations`. The concrete kind is
/// given by the `@type` (or `@odata.type`) control information.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Authorization {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "@type")]
    pub type_name: Option<String>,
    #[serde(rename = "@odata.type")]
    pub odata_type_name: Option<String>,
    pub key_name: Option<String>,
    pub location: Option<Expression>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    pub scopes: Vec<AuthorizationScope>,
    pub issuer_url: Option<String>,
}

impl Authorization {
    /// Qualified type name of the authorization record.
    #[must_use]
    pub fn qualified_type(&self) -> &str {
        self.type_name
            .as_deref()
            .or(self.odata_type_name.as_deref())
            .unwrap_or_default()
    }

    /// Kind of the authorization: the simple name of its type.
    #[must_use]
    pub fn kind(&self) -> &str {
        simple_name(self.qualified_type())
    }
}

/// `Authorization.AuthorizationScope`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AuthorizationScope {
    pub scope: String,
    pub description: Option<String>,
}

/// `Authorization.SecurityScheme`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SecurityScheme {
    pub authorization: String,
    pub required_scopes: Vec<String>,
}
