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

//! Error types for the onboarding client.
//!
//! This module defines all error types that can occur while talking to the
//! WAF control plane, building encrypted envelopes, loading manifests and
//! waiting on platform tasks.

use thiserror::Error;

/// Result type alias using [`WafError`].
pub type Result<T> = std::result::Result<T, WafError>;

/// Errors that can occur during onboarding operations.
#[derive(Debug, Error)]
pub enum WafError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login was rejected or returned no token.
    #[error("Authentication failed ({status}): {message}")]
    AuthenticationFailed {
        /// HTTP status code (0 when the response was 2xx but unusable).
        status: u16,
        /// Error body or reason.
        message: String,
    },

    /// Control plane returned a non-2xx response.
    #[error("Server error {status}: {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error body from server.
        message: String,
    },

    /// A 2xx response carried a GraphQL `errors` array.
    #[error("GraphQL operation '{operation}' failed: {}", messages.join("; "))]
    Graphql {
        /// Operation name.
        operation: String,
        /// Error messages reported by the server.
        messages: Vec<String>,
    },

    /// Response did not contain the expected data.
    #[error("Operation '{operation}' returned no '{field}'")]
    MissingData {
        /// Operation name.
        operation: String,
        /// Missing JSON path.
        field: String,
    },

    /// No profile with the configured name exists.
    #[error("No profile found with the name \"{0}\"")]
    ProfileNotFound(String),

    /// More than one profile carries the configured name.
    #[error("Profile name \"{name}\" is ambiguous: {count} profiles match")]
    AmbiguousProfile {
        /// Configured profile name.
        name: String,
        /// Number of matching profiles.
        count: usize,
    },

    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Invalid PEM data.
    #[error("Invalid PEM data: {0}")]
    InvalidPem(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON encoding/decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML manifest parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Task did not leave `InProgress` within the polling bound.
    #[error("Task {task_id} still in progress after {attempts} polls")]
    TaskTimedOut {
        /// Task identifier.
        task_id: String,
        /// Number of polls performed.
        attempts: u32,
    },

    /// A mutation was answered with `false`.
    #[error("Operation '{0}' was not acknowledged")]
    NotAcknowledged(String),

    /// The run or a task wait was cancelled by the caller.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WafError {
    /// Create an authentication failure.
    pub fn authentication_failed(status: u16, message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            status,
            message: message.into(),
        }
    }

    /// Create a server error with status and message.
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Create a GraphQL error.
    pub fn graphql(operation: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Graphql {
            operation: operation.into(),
            messages,
        }
    }

    /// Create a missing data error.
    pub fn missing_data(operation: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingData {
            operation: operation.into(),
            field: field.into(),
        }
    }

    /// Create a crypto error.
    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    /// Create an invalid PEM error.
    pub fn invalid_pem(msg: impl Into<String>) -> Self {
        Self::InvalidPem(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a task timeout error.
    pub fn task_timed_out(task_id: impl Into<String>, attempts: u32) -> Self {
        Self::TaskTimedOut {
            task_id: task_id.into(),
            attempts,
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(what: impl Into<String>) -> Self {
        Self::Cancelled(what.into())
    }

    /// Create an unacknowledged-mutation error.
    pub fn not_acknowledged(operation: impl Into<String>) -> Self {
        Self::NotAcknowledged(operation.into())
    }

    /// Returns true if this error must abort the whole run.
    ///
    /// Authentication, profile resolution and configuration problems are
    /// fatal. Everything else is scoped to the resource being reconciled.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. }
                | Self::ProfileNotFound(_)
                | Self::AmbiguousProfile { .. }
                | Self::Config(_)
                | Self::Yaml(_)
                | Self::Cancelled(_)
        )
    }

    /// Returns the HTTP status if the error came from a rejected response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } | Self::AuthenticationFailed { status, .. } => {
                Some(*status)
            }
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
