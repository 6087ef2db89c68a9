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

use crate::config::Error as ConfigError;
use crate::openapi::Error as CompileError;
use serde_json::Error as JsonError;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::io::Error as IoError;
use std::path::PathBuf;

/// CSDL to OpenAPI compiler errors.
#[derive(Debug)]
pub enum Error {
    Io(PathBuf, IoError),
    ParseCsdl(PathBuf, JsonError),
    Config(PathBuf, ConfigError),
    Compile(CompileError),
    Serialize(JsonError),
    WriteOutput(PathBuf, IoError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Io(fname, error) => {
                write!(f, "input/output error: file: {}: {error}", fname.display())
            }
            Self::ParseCsdl(fname, error) => {
                write!(f, "CSDL JSON parse error: file: {}: {error}", fname.display())
            }
            Self::Config(fname, error) => {
                write!(f, "configuration error: file: {}: {error}", fname.display())
            }
            Self::Compile(error) => write!(f, "compilation error: {error}"),
            Self::Serialize(error) => write!(f, "failed to serialize OpenAPI document: {error}"),
            Self::WriteOutput(fname, error) => {
                write!(f, "failed write output file: {}: {error}", fname.display())
            }
        }
    }
}

impl StdError for Error {}
