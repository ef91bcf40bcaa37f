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

//! Configuration types for the control-plane client.
//!
//! Endpoints and credentials are supplied out-of-band through environment
//! variables; they never appear in the onboarding manifest.

use std::time::Duration;
use url::Url;

use crate::error::{Result, WafError};

/// Default GraphQL endpoint of the WAF SaaS control plane.
pub const DEFAULT_GRAPHQL_URL: &str = "https://cloudinfra-gw.portal.checkpoint.com/app/waf//graphql";

/// Environment variable holding the login endpoint.
pub const ENV_AUTH_URL: &str = "WAFAUTHURL";

/// Environment variable holding the GraphQL endpoint override.
pub const ENV_GRAPHQL_URL: &str = "WAFGRAPHQLURL";

/// Environment variable holding the client id.
pub const ENV_CLIENT_ID: &str = "WAFKEY";

/// Environment variable holding the access key.
pub const ENV_ACCESS_KEY: &str = "WAFSECRET";

/// Configuration for the control-plane client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint every operation is posted to.
    pub graphql_url: Url,

    /// Login endpoint exchanging credentials for a session token.
    pub auth_url: Url,

    /// Request timeout duration.
    pub timeout: Duration,

    /// User-Agent header value.
    pub user_agent: String,

    /// Task polling behaviour.
    pub poll: PollConfig,
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Build a configuration from `WAFAUTHURL` and `WAFGRAPHQLURL`.
    ///
    /// # Errors
    ///
    /// Returns an error if `WAFAUTHURL` is unset or either URL is invalid.
    pub fn from_env() -> Result<Self> {
        let auth_url = std::env::var(ENV_AUTH_URL)
            .map_err(|_| WafError::config(format!("{ENV_AUTH_URL} is not set")))?;
        let graphql_url =
            std::env::var(ENV_GRAPHQL_URL).unwrap_or_else(|_| DEFAULT_GRAPHQL_URL.to_string());

        ClientConfig::builder()
            .auth_url(auth_url)?
            .graphql_url(graphql_url)?
            .build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    graphql_url: Option<Url>,
    auth_url: Option<Url>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    poll: Option<PollConfig>,
}

impl ClientConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the GraphQL endpoint.
    pub fn graphql_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.graphql_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Set the login endpoint.
    pub fn auth_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.auth_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the task polling configuration.
    pub fn poll(mut self, poll: PollConfig) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the login endpoint is not set. The GraphQL
    /// endpoint falls back to [`DEFAULT_GRAPHQL_URL`].
    pub fn build(self) -> Result<ClientConfig> {
        let auth_url = self
            .auth_url
            .ok_or_else(|| WafError::config("auth_url is required"))?;
        let graphql_url = match self.graphql_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_GRAPHQL_URL)?,
        };

        Ok(ClientConfig {
            graphql_url,
            auth_url,
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| crate::USER_AGENT.to_string()),
            poll: self.poll.unwrap_or_default(),
        })
    }
}

/// API credentials exchanged for a session token at login.
#[derive(Clone)]
pub struct Credentials {
    /// Client id.
    pub client_id: String,

    /// Access key (secret).
    pub access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create new credentials.
    pub fn new(client_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            access_key: access_key.into(),
        }
    }

    /// Read credentials from `WAFKEY` and `WAFSECRET`.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| WafError::config(format!("{name} is not set")))
        };

        Ok(Self::new(read(ENV_CLIENT_ID)?, read(ENV_ACCESS_KEY)?))
    }
}

/// Task polling configuration.
///
/// Defaults:
/// - Interval: 2 seconds
/// - Max attempts: 900 (30 minutes at the default interval)
/// - Deadline: none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two task status queries.
    pub interval: Duration,

    /// Maximum number of status queries before giving up.
    pub max_attempts: u32,

    /// Optional wall-clock bound on the whole wait.
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 900,
            deadline: None,
        }
    }
}

impl PollConfig {
    /// Create a new polling configuration builder.
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::default()
    }
}

/// Builder for [`PollConfig`].
#[derive(Default)]
pub struct PollConfigBuilder {
    interval: Option<Duration>,
    max_attempts: Option<u32>,
    deadline: Option<Duration>,
}

impl PollConfigBuilder {
    /// Set the poll interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the maximum number of polls.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set an overall deadline for a single wait.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the polling configuration.
    pub fn build(self) -> PollConfig {
        let default = PollConfig::default();
        PollConfig {
            interval: self.interval.unwrap_or(default.interval),
            max_attempts: self.max_attempts.unwrap_or(default.max_attempts).max(1),
            deadline: self.deadline.or(default.deadline),
        }
    }
}
