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

//! Command-line entry points for the compiler
//!
//! `Compile` reads one CSDL JSON document, optionally a TOML options
//! file, applies option overrides given on the command line and writes
//! the OpenAPI document to the output file or returns it for printing.

use crate::config::Options;
use crate::csdl2openapi;
use crate::Error;
use clap::Args;
use clap::Subcommand;
use serde_json::Value;
use std::fs::write;
use std::fs::File;
use std::io::Read as _;
use std::path::PathBuf;
use tracing::info;

/// Options given on the command line. They override the defaults and
/// the options file.
#[derive(Args, Debug, Default)]
pub struct OptionOverrides {
    /// Service root URL.
    #[arg(long)]
    pub url: Option<String>,
    /// JSON array of OpenAPI Server Objects.
    #[arg(long)]
    pub servers: Option<String>,
    /// Protocol version of the service, e.g. `4.0` or `4.01`.
    #[arg(long)]
    pub odata_version: Option<String>,
    /// Scheme of the default service root.
    #[arg(long)]
    pub scheme: Option<String>,
    /// Host of the default service root.
    #[arg(long)]
    pub host: Option<String>,
    /// Base path of the default service root.
    #[arg(long)]
    pub base_path: Option<String>,
    /// Add an entity data model diagram to the description.
    #[arg(long)]
    pub diagram: bool,
    /// Maximum number of navigation segments in a path.
    #[arg(long)]
    pub max_levels: Option<usize>,
}

impl OptionOverrides {
    /// Replace options given on the command line.
    pub fn apply(&self, options: &mut Options) {
        let replace = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                target.clone_from(value);
            }
        };
        if self.url.is_some() {
            options.url.clone_from(&self.url);
        }
        if self.servers.is_some() {
            options.servers.clone_from(&self.servers);
        }
        replace(&mut options.odata_version, &self.odata_version);
        replace(&mut options.scheme, &self.scheme);
        replace(&mut options.host, &self.host);
        replace(&mut options.base_path, &self.base_path);
        if self.diagram {
            options.diagram = true;
        }
        if let Some(max_levels) = self.max_levels {
            options.max_levels = max_levels;
        }
    }
}

/// Compiler high-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a CSDL JSON document to an OpenAPI document.
    Compile {
        /// CSDL JSON document to compile.
        csdl: PathBuf,
        /// Output file. The document is printed if not given.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// TOML file with compiler options.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: OptionOverrides,
        /// Write compact JSON instead of pretty-printed JSON.
        #[arg(long)]
        compact: bool,
    },
}

/// Process a compiler command.
///
/// # Errors
///
/// Returns an error if command processing fails.
pub fn process_command(command: &Commands) -> Result<Vec<String>, Error> {
    let mut display_output = Vec::new();
    match command {
        Commands::Compile {
            csdl,
            output,
            config,
            overrides,
            compact,
        } => {
            let mut options = match config {
                Some(fname) => Options::read(fname).map_err(|e| Error::Config(fname.clone(), e))?,
                None => Options::default(),
            };
            overrides.apply(&mut options);
            let document = read_csdl(csdl)?;
            let openapi = csdl2openapi(&document, &options).map_err(Error::Compile)?;
            let text = if *compact {
                serde_json::to_string(&openapi)
            } else {
                serde_json::to_string_pretty(&openapi)
            }
            .map_err(Error::Serialize)?;
            match output {
                Some(output) => {
                    write(output, text).map_err(|e| Error::WriteOutput(output.clone(), e))?;
                    info!(output = %output.display(), "OpenAPI document written");
                    display_output.push(format!("{} file has been written", output.display()));
                }
                None => display_output.push(text),
            }
            Ok(display_output)
        }
    }
}

fn read_csdl(fname: &PathBuf) -> Result<Value, Error> {
    let mut file = File::open(fname).map_err(|err| Error::Io(fname.clone(), err))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|err| Error::Io(fname.clone(), err))?;
    serde_json::from_str(&content).map_err(|err| Error::ParseCsdl(fname.clone(), err))
}
