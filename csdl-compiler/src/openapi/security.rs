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

//! Security schemes and security requirements declared on the entity
//! container.

use crate::openapi::Generator;
use crate::vocabulary::annotations::record;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::authorization::Authorization;
use crate::vocabulary::authorization::SecurityScheme;
use crate::vocabulary::capabilities::Expression;
use crate::vocabulary::AuthorizationTerm;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

fn scopes(authorization: &Authorization) -> Value {
    authorization
        .scopes
        .iter()
        .map(|s| {
            (
                s.scope.clone(),
                Value::String(s.description.clone().unwrap_or_default()),
            )
        })
        .collect::<Map<String, Value>>()
        .into()
}

/// OAuth 2.0 flow with its URLs and scopes.
fn flow(authorization: &Authorization, authorization_url: bool, token_url: bool) -> Value {
    let mut flow = Map::new();
    if authorization_url {
        flow.insert(
            "authorizationUrl".into(),
            authorization.authorization_url.clone().into(),
        );
    }
    if token_url {
        flow.insert("tokenUrl".into(), authorization.token_url.clone().into());
    }
    if let Some(refresh_url) = authorization.refresh_url.as_deref().filter(|u| !u.is_empty()) {
        flow.insert("refreshUrl".into(), refresh_url.into());
    }
    flow.insert("scopes".into(), scopes(authorization));
    Value::Object(flow)
}

/// Security Scheme Object of one authorization, `None` for unknown
/// kinds.
fn security_scheme(authorization: &Authorization) -> Option<Map<String, Value>> {
    let mut scheme = Map::new();
    if let Some(description) = authorization.description.as_deref().filter(|d| !d.is_empty()) {
        scheme.insert("description".into(), description.into());
    }
    match authorization.kind() {
        "ApiKey" => {
            scheme.insert("type".into(), "apiKey".into());
            scheme.insert("name".into(), authorization.key_name.clone().into());
            let location = match authorization.location.as_ref().map(Expression::member) {
                Some("Header") => Some("header"),
                Some("QueryOption") => Some("query"),
                Some("Cookie") => Some("cookie"),
                _ => None,
            };
            if let Some(location) = location {
                scheme.insert("in".into(), location.into());
            }
        }
        "Http" => {
            scheme.insert("type".into(), "http".into());
            if let Some(s) = &authorization.scheme {
                scheme.insert("scheme".into(), s.clone().into());
            }
            if let Some(format) = &authorization.bearer_format {
                scheme.insert("bearerFormat".into(), format.clone().into());
            }
        }
        "OAuth2AuthCode" => {
            scheme.insert("type".into(), "oauth2".into());
            scheme.insert(
                "flows".into(),
                json!({ "authorizationCode": flow(authorization, true, true) }),
            );
        }
        "OAuth2ClientCredentials" => {
            scheme.insert("type".into(), "oauth2".into());
            scheme.insert(
                "flows".into(),
                json!({ "clientCredentials": flow(authorization, false, true) }),
            );
        }
        "OAuth2Implicit" => {
            scheme.insert("type".into(), "oauth2".into());
            scheme.insert(
                "flows".into(),
                json!({ "implicit": flow(authorization, true, false) }),
            );
        }
        "OAuth2Password" => {
            scheme.insert("type".into(), "oauth2".into());
            scheme.insert(
                "flows".into(),
                json!({ "password": flow(authorization, false, true) }),
            );
        }
        "OpenIDConnect" => {
            scheme.insert("type".into(), "openIdConnect".into());
            scheme.insert(
                "openIdConnectUrl".into(),
                authorization.issuer_url.clone().into(),
            );
        }
        _ => {
            debug!(
                type_name = authorization.qualified_type(),
                "Unknown Authorization type"
            );
            return None;
        }
    }
    Some(scheme)
}

impl Generator<'_> {
    /// Security schemes by name, `None` if the container declares no
    /// known authorization.
    pub(crate) fn security_schemes(&self) -> Option<Map<String, Value>> {
        let authorizations = self
            .container?
            .term(self.voc, AuthorizationTerm::Authorizations)?
            .as_array()?;
        let schemes: Map<String, Value> = authorizations
            .iter()
            .map(record::<Authorization>)
            .filter_map(|a| security_scheme(&a).map(|s| (a.name.clone(), Value::Object(s))))
            .collect();
        (!schemes.is_empty()).then_some(schemes)
    }

    /// Security requirements, `None` if the container declares none.
    pub(crate) fn security(&self) -> Option<Vec<Value>> {
        let requirements: Vec<Value> = self
            .container
            .and_then(|c| c.term(self.voc, AuthorizationTerm::SecuritySchemes))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(record::<SecurityScheme>)
            .map(|s| {
                let mut requirement = Map::new();
                requirement.insert(s.authorization, s.required_scopes.into());
                Value::Object(requirement)
            })
            .collect();
        if requirements.is_empty() {
            debug!("No security schemes defined in the entity container");
            return None;
        }
        Some(requirements)
    }
}
