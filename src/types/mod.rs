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

//! Control-plane message types.
//!
//! This module provides the typed views of the GraphQL responses the
//! onboarding flow relies on: sessions, profiles, assets, publish results
//! and asynchronous tasks.

mod task;

pub use task::{Task, TaskStatus};

use serde::{Deserialize, Serialize};

/// Authenticated session for one run of the tool.
///
/// Obtained once at login and attached to every subsequent request. There is
/// no renewal: a token that expires mid-run fails the remaining calls.
#[derive(Clone)]
pub struct Session {
    /// Bearer token.
    token: String,

    /// Client id the token was issued to.
    client_id: String,

    /// Tenant the token belongs to, when reported.
    tenant_id: Option<String>,

    /// Token lifetime in seconds, when reported.
    expires_in: Option<u64>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("expires_in", &self.expires_in)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Session {
    /// Create a new session.
    pub fn new(token: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client_id: client_id.into(),
            tenant_id: None,
            expires_in: None,
        }
    }

    /// Attach tenant and lifetime details reported at login.
    pub fn with_details(mut self, tenant_id: Option<String>, expires_in: Option<u64>) -> Self {
        self.tenant_id = tenant_id;
        self.expires_in = expires_in;
        self
    }

    /// Bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Client id the token was issued to.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Tenant id, when reported.
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Token lifetime in seconds, when reported.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

/// WAF enforcement profile resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile id.
    pub id: String,

    /// Profile name as configured.
    pub name: String,

    /// Region the profile is deployed in.
    pub region: String,
}

/// Entry of the existing-resource index used for matching by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingResource {
    /// Resource id.
    pub id: String,

    /// Resource name.
    pub name: String,

    /// Asset type, when reported.
    #[serde(default)]
    pub asset_type: Option<String>,
}

/// Asset returned by the creation mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedAsset {
    /// Asset id.
    pub id: String,

    /// Asset name.
    pub name: String,
}

/// A message attached to a publish result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishMessage {
    /// Human-readable message.
    pub message: String,
}

/// Result of staging and validating all pending changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    /// Whether the pending change-set is valid and may be enforced.
    pub is_valid: bool,

    /// Validation errors.
    #[serde(default)]
    pub errors: Vec<PublishMessage>,

    /// Validation warnings.
    #[serde(default)]
    pub warnings: Vec<PublishMessage>,

    /// Whether the errors come from reverse-proxy configuration validation.
    #[serde(default)]
    pub is_nginx_errors: Option<bool>,
}

impl PublishResult {
    /// Error messages as plain strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

/// A domain registered on the profile for certificate binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDomain {
    /// Domain as stored by the platform (no scheme).
    pub domain: String,

    /// Id of the certificate parameter bound to this domain.
    pub parameter_id: Option<String>,
}

impl CertificateDomain {
    /// Domain prefixed with `https://`, the form used in manifests.
    pub fn url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

/// References returned after storing an encrypted private key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SensitiveFieldRef {
    /// Certificate ARN used by the CDN front.
    #[serde(rename = "certificateARNForCloudfront", default)]
    pub certificate_arn_for_cloudfront: Option<String>,

    /// Certificate ARN.
    #[serde(rename = "certificateArn", default)]
    pub certificate_arn: Option<String>,
}

impl SensitiveFieldRef {
    /// Returns true when neither ARN was returned.
    pub fn is_empty(&self) -> bool {
        let missing = |arn: &Option<String>| arn.as_deref().is_none_or(str::is_empty);
        missing(&self.certificate_arn) && missing(&self.certificate_arn_for_cloudfront)
    }
}

/// Profile types a publish or enforce applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileType {
    /// Docker agent profiles.
    Docker,
    /// Gateway profiles.
    CloudGuardAppSecGateway,
    /// Embedded agent profiles.
    Embedded,
    /// Kubernetes ingress profiles.
    Kubernetes,
    /// SaaS profiles.
    AppSecSaaS,
}

impl ProfileType {
    /// All profile types covered by a publish or enforce.
    pub const ALL: [ProfileType; 5] = [
        ProfileType::Docker,
        ProfileType::CloudGuardAppSecGateway,
        ProfileType::Embedded,
        ProfileType::Kubernetes,
        ProfileType::AppSecSaaS,
    ];
}
