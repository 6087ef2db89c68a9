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

//! Compiler options.
//!
//! Options can be read from a TOML file with kebab-case keys:
//!
//! ```toml
//! odata-version = "4.0"
//! host = "services.example.org"
//! base-path = "/odata/v4/catalog"
//! diagram = true
//! max-levels = 3
//! ```
//!
//! Every option that is not present keeps its default.

use serde::Deserialize;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::fs::File;
use std::io::Error as IoError;
use std::io::Read as _;
use std::path::PathBuf;
use toml::de::Error as TomlError;

/// Default protocol version.
pub const DEFAULT_ODATA_VERSION: &str = "4.01";
/// Default maximum number of navigation segments in a path.
pub const DEFAULT_MAX_LEVELS: usize = 5;

/// Options of the OpenAPI generation.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Service root URL. Defaults to `<scheme>://<host><base-path>`.
    pub url: Option<String>,
    /// JSON array of OpenAPI Server Objects replacing the default
    /// server.
    pub servers: Option<String>,
    /// Protocol version of the service.
    pub odata_version: String,
    pub scheme: String,
    pub host: String,
    pub base_path: String,
    /// Add an entity data model diagram to the description.
    pub diagram: bool,
    /// Maximum number of navigation segments in a path.
    pub max_levels: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url: None,
            servers: None,
            odata_version: DEFAULT_ODATA_VERSION.into(),
            scheme: "https".into(),
            host: "localhost".into(),
            base_path: "/service-root".into(),
            diagram: false,
            max_levels: DEFAULT_MAX_LEVELS,
        }
    }
}

impl Options {
    /// Read options from toml file.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if failed to read file
    /// - `Error::Toml` if failed to parse content as TOML / invalid options.
    pub fn read(fname: &PathBuf) -> Result<Self, Error> {
        let mut file = File::open(fname).map_err(Error::Io)?;
        let mut content = String::new();
        file.read_to_string(&mut content).map_err(Error::Io)?;
        toml::from_str(&content).map_err(Error::Toml)
    }

    /// Service root URL used for the default server.
    #[must_use]
    pub fn service_root(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("{}://{}{}", self.scheme, self.host, self.base_path))
    }
}

/// Error of reading options.
#[derive(Debug)]
pub enum Error {
    Io(IoError),
    Toml(TomlError),
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Io(err) => write!(f, "input/output error: {err}"),
            Self::Toml(err) => write!(f, "toml error: {err}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.odata_version, "4.01");
        assert_eq!(options.max_levels, 5);
        assert_eq!(options.service_root(), "https://localhost/service-root");
    }

    #[test]
    fn test_read_partial_file() -> Result<(), Box<dyn StdError>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "odata-version = \"4.0\"")?;
        writeln!(file, "host = \"services.example.org\"")?;
        writeln!(file, "max-levels = 2")?;
        let options = Options::read(&file.path().to_path_buf())?;
        assert_eq!(
            options,
            Options {
                odata_version: "4.0".into(),
                host: "services.example.org".into(),
                max_levels: 2,
                ..Options::default()
            }
        );
        assert_eq!(
            options.service_root(),
            "https://services.example.org/service-root"
        );
        Ok(())
    }

    #[test]
    fn test_read_rejects_unknown_keys() -> Result<(), Box<dyn StdError>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "hostname = \"x\"")?;
        assert!(matches!(
            Options::read(&file.path().to_path_buf()),
            Err(Error::Toml(_))
        ));
        Ok(())
    }
}
