// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Onboarding manifest.
//!
//! A manifest is a YAML document with a `configuration` section naming the
//! profile and region, followed by either an `assets` list or a `urls`
//! list of certificate bindings:
//!
//! ```yaml
//! configuration:
//!   profile: production
//!   region: eu-west-1
//! assets:
//!   - name: shop
//!     domain: "https://shop.example.com, https://www.shop.example.com"
//!     upstream: https://origin.example.com
//!     owncertificate: true
//! urls:
//!   - url: https://shop.example.com
//!     domain: shop.example.com
//!     cert_pem: certs/shop.crt.pem
//!     cert_key: certs/shop.key.pem
//! ```
//!
//! Credentials never appear here; they come from the environment.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, WafError};

/// Environment variable overriding the manifest path.
pub const ENV_MANIFEST_PATH: &str = "WAF_MANIFEST_PATH";

/// Kind of run a manifest drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Asset reconciliation.
    Assets,
    /// Certificate upload.
    Certificates,
}

impl RunKind {
    /// Manifest file looked up in the working directory by default.
    pub fn default_manifest(&self) -> &'static str {
        match self {
            Self::Assets => "assets.yaml",
            Self::Certificates => "certificates.yaml",
        }
    }

    /// Tag used in run-log file names.
    pub fn log_tag(&self) -> &'static str {
        match self {
            Self::Assets => "deploy-assets",
            Self::Certificates => "upload-certificates",
        }
    }
}

/// Root of an onboarding manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Target profile and region.
    pub configuration: Target,

    /// Assets to reconcile.
    #[serde(default)]
    pub assets: Vec<AssetSpec>,

    /// Certificate bindings to upload.
    #[serde(default)]
    pub urls: Vec<CertificateSpec>,
}

/// Profile and region every resource of the manifest is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Profile name, matched exactly.
    pub profile: String,

    /// Region of the profile.
    pub region: String,
}

/// Desired web-application asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Asset name; the key used for existence checks.
    pub name: String,

    /// Comma-separated list of public URLs.
    pub domain: String,

    /// Host header; accepted but not sent to the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Upstream URL.
    pub upstream: String,

    /// `true` when the operator supplies the certificate, `false` for a
    /// platform-issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owncertificate: Option<bool>,
}

impl AssetSpec {
    /// Public URLs: `domain` split on commas, trimmed, empties dropped.
    pub fn domains(&self) -> Vec<String> {
        self.domain
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Desired certificate binding for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSpec {
    /// URL as registered on the profile, `https://` included.
    pub url: String,

    /// Domain without scheme.
    pub domain: String,

    /// Path to the PEM certificate chain.
    pub cert_pem: PathBuf,

    /// Path to the PEM private key.
    pub cert_key: PathBuf,
}

impl Manifest {
    /// Parse a manifest from YAML.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Render the manifest as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check the manifest for a run of `kind`.
    ///
    /// All problems are collected and reported together.
    pub fn validate(&self, kind: RunKind) -> Result<()> {
        let mut errors = Vec::new();

        if self.configuration.profile.trim().is_empty() {
            errors.push("configuration.profile is required".to_string());
        }
        if self.configuration.region.trim().is_empty() {
            errors.push("configuration.region is required".to_string());
        }

        match kind {
            RunKind::Assets => self.validate_assets(&mut errors),
            RunKind::Certificates => self.validate_urls(&mut errors),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WafError::config(format!(
                "Manifest validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }

    fn validate_assets(&self, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();

        for (i, asset) in self.assets.iter().enumerate() {
            if asset.name.trim().is_empty() {
                errors.push(format!("assets[{}].name is required", i));
            } else if !seen.insert(asset.name.as_str()) {
                // Later duplicates resolve to AlreadyExists at run time.
                warn!("assets[{}].name '{}' is duplicated", i, asset.name);
            }
            if asset.domains().is_empty() {
                errors.push(format!("assets[{}].domain is required", i));
            }
            if asset.upstream.trim().is_empty() {
                errors.push(format!("assets[{}].upstream is required", i));
            }
        }
    }

    fn validate_urls(&self, errors: &mut Vec<String>) {
        for (i, entry) in self.urls.iter().enumerate() {
            if entry.url.trim().is_empty() {
                errors.push(format!("urls[{}].url is required", i));
            }
            if entry.domain.trim().is_empty() {
                errors.push(format!("urls[{}].domain is required", i));
            }
            if entry.cert_pem.as_os_str().is_empty() {
                errors.push(format!("urls[{}].cert_pem is required", i));
            }
            if entry.cert_key.as_os_str().is_empty() {
                errors.push(format!("urls[{}].cert_key is required", i));
            }
        }
    }
}

/// Locates, reads and validates a manifest.
///
/// # Search Order
///
/// 1. Explicit path (if set via `with_path()`)
/// 2. Environment variable `WAF_MANIFEST_PATH`
/// 3. `assets.yaml` or `certificates.yaml` in the working directory
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    kind: RunKind,
    explicit_path: Option<PathBuf>,
    validate: bool,
    env_var_name: String,
}

impl ManifestLoader {
    /// Create a loader for a run of `kind`.
    pub fn new(kind: RunKind) -> Self {
        Self {
            kind,
            explicit_path: None,
            validate: true,
            env_var_name: ENV_MANIFEST_PATH.to_string(),
        }
    }

    /// Use this path and nothing else.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable validation after loading.
    ///
    /// Default: `true`
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set the environment variable name for path override.
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Find, read, parse and (optionally) validate the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if no manifest is found, it cannot be read, the
    /// YAML is invalid, or validation fails.
    pub fn load(&self) -> Result<Manifest> {
        let path = self.find_manifest()?;
        debug!("Loading manifest from {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            WafError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.load_from_str(&content)
    }

    /// Parse and (optionally) validate manifest text.
    pub fn load_from_str(&self, content: &str) -> Result<Manifest> {
        let manifest = Manifest::from_yaml(content)?;

        if self.validate {
            manifest.validate(self.kind)?;
        }

        Ok(manifest)
    }

    /// Resolve the manifest path.
    pub fn find_manifest(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.explicit_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(WafError::config(format!(
                "Manifest not found: {}",
                path.display()
            )));
        }

        if let Ok(env_path) = std::env::var(&self.env_var_name) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok(path);
            }
            return Err(WafError::config(format!(
                "Manifest from {} not found: {}",
                self.env_var_name, env_path
            )));
        }

        let path = PathBuf::from(self.kind.default_manifest());
        if path.exists() {
            return Ok(path);
        }

        Err(WafError::config(format!(
            "No manifest found: {} does not exist",
            path.display()
        )))
    }
}
