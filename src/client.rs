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

//! Control-plane client implementation.
//!
//! This module provides the [`ControlPlaneClient`], a thin typed wrapper
//! around the single GraphQL endpoint of the WAF control plane plus the
//! separate login exchange.

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ClientConfig, Credentials};
use crate::error::{Result, WafError};
use crate::tls::build_http_client;
use crate::types::Session;

/// A GraphQL operation ready to be posted.
#[derive(Debug, Clone)]
pub struct GraphqlRequest {
    /// Operation name.
    pub operation_name: &'static str,

    /// Query or mutation document.
    pub query: &'static str,

    /// Operation variables.
    pub variables: Value,
}

impl GraphqlRequest {
    /// Create a new request.
    pub fn new(operation_name: &'static str, query: &'static str, variables: Value) -> Self {
        Self {
            operation_name,
            query,
            variables,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlBody<'a> {
    operation_name: &'a str,
    variables: &'a Value,
    query: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
    client_id: &'a str,
    access_key: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Client for the WAF control plane.
///
/// Every operation is a single POST of `{operationName, variables, query}`
/// to the GraphQL endpoint, authenticated with the session's bearer token.
/// There is no retry or backoff: a failed call is reported to the caller,
/// which decides whether the failure is fatal or scoped to one resource.
///
/// # Example
///
/// ```no_run
/// use wafsaas_onboard::{ClientConfig, ControlPlaneClient, Credentials};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::from_env()?;
/// let client = ControlPlaneClient::new(config)?;
/// let session = client.login(&Credentials::from_env()?).await?;
/// println!("Logged in as {}", session.client_id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ControlPlaneClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { config, http })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Exchange API credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns [`WafError::AuthenticationFailed`] if the login endpoint
    /// rejects the credentials or answers without a token.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        tracing::debug!("POST {}", self.config.auth_url);

        let body = LoginBody {
            client_id: &credentials.client_id,
            access_key: &credentials.access_key,
        };

        let response = self
            .http
            .post(self.config.auth_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Login failed with status {}: {}", status.as_u16(), message);
            return Err(WafError::authentication_failed(status.as_u16(), message));
        }

        let login: LoginResponse = response.json().await?;
        let data = login
            .data
            .ok_or_else(|| WafError::authentication_failed(status.as_u16(), "response has no data"))?;
        let token = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WafError::authentication_failed(status.as_u16(), "response has no token"))?;

        tracing::info!("Login successful");
        Ok(Session::new(token, credentials.client_id.clone())
            .with_details(data.tenant_id, data.expires_in))
    }

    /// Execute a GraphQL operation and return its `data` object.
    ///
    /// A 2xx response is only accepted when its body carries no GraphQL
    /// `errors` array and has a non-null `data` member.
    ///
    /// # Errors
    ///
    /// - [`WafError::ServerError`] for non-2xx responses, with the body
    /// - [`WafError::Graphql`] when the body reports GraphQL errors
    /// - [`WafError::MissingData`] when `data` is absent or null
    pub async fn call(&self, session: &Session, request: &GraphqlRequest) -> Result<Value> {
        tracing::debug!(
            "POST {} operation={}",
            self.config.graphql_url,
            request.operation_name
        );

        let body = GraphqlBody {
            operation_name: request.operation_name,
            variables: &request.variables,
            query: request.query,
        };

        let response = self
            .http
            .post(self.config.graphql_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", session.token()))
            .json(&body)
            .send()
            .await?;

        let response = self.handle_error_response(request.operation_name, response).await?;
        let payload: Value = response.json().await?;

        check_graphql_errors(request.operation_name, &payload)?;

        match payload.get("data") {
            Some(data) if !data.is_null() => Ok(data.clone()),
            _ => Err(WafError::missing_data(request.operation_name, "data")),
        }
    }

    /// Handle error responses from the server.
    async fn handle_error_response(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!(
            "Operation {} failed with status {}: {}",
            operation,
            status.as_u16(),
            message
        );

        Err(WafError::server_error(status.as_u16(), message))
    }
}

/// Reject a response body that carries a non-empty GraphQL `errors` array.
pub fn check_graphql_errors(operation: &str, payload: &Value) -> Result<()> {
    let Some(errors) = payload.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };

    if errors.is_empty() {
        return Ok(());
    }

    let messages = errors
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
        .collect();

    Err(WafError::graphql(operation, messages))
}
