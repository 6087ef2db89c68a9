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

//! OData CSDL JSON to OpenAPI 3.0 compiler.
//!
//! The compiler reads one CSDL JSON document, preprocesses it into a
//! [`csdl::Model`] and generates an OpenAPI 3.0.2 document describing
//! the service: paths for entity sets, singletons, navigation,
//! actions and functions, schemas for all types, and security.
//!
//! ```no_run
//! use csdl_openapi::config::Options;
//! use serde_json::json;
//!
//! let csdl = json!({ "$Version": "4.01", "n": {} });
//! let openapi = csdl_openapi::csdl2openapi(&csdl, &Options::default())?;
//! assert_eq!(openapi["openapi"], "3.0.2");
//! # Ok::<(), csdl_openapi::openapi::Error>(())
//! ```

/// Command line commands.
pub mod commands;
/// Compiler options.
pub mod config;
/// CSDL JSON documents and the preprocessed model.
pub mod csdl;
/// OpenAPI document generation.
pub mod openapi;
/// OData vocabularies used by the compiler.
pub mod vocabulary;

#[doc(inline)]
pub use error::Error;

mod error;

use config::Options;
use csdl::Document;
use csdl::Model;
use openapi::Generator;
use serde_json::Value;

/// Compile a CSDL JSON document into an OpenAPI document.
///
/// # Errors
///
/// Returns an error if the `servers` option is invalid. The content of
/// the CSDL document never causes an error.
pub fn csdl2openapi(csdl: &Value, options: &Options) -> Result<Value, openapi::Error> {
    let model = Model::new(Document::parse(csdl));
    Generator::new(&model, options).generate()
}
