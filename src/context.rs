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

//! Immutable per-run context.
//!
//! A [`RunContext`] is built once, after login and profile resolution, and
//! passed by reference to every component of the run. Nothing in it changes
//! until the run ends.

use serde_json::Value;

use crate::client::{ControlPlaneClient, GraphqlRequest};
use crate::config::Credentials;
use crate::error::Result;
use crate::operations::profiles;
use crate::types::{Profile, Session};

/// Client, session and resolved profile shared by one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    client: ControlPlaneClient,
    session: Session,
    profile: Profile,
}

impl RunContext {
    /// Assemble a context from already-established parts.
    pub fn new(client: ControlPlaneClient, session: Session, profile: Profile) -> Self {
        Self {
            client,
            session,
            profile,
        }
    }

    /// Log in and resolve the configured profile.
    ///
    /// # Errors
    ///
    /// Fails when login is rejected or when the profile name does not match
    /// exactly one profile. Both conditions are fatal for the run.
    pub async fn establish(
        client: ControlPlaneClient,
        credentials: &Credentials,
        profile_name: &str,
        region: &str,
    ) -> Result<Self> {
        let session = client.login(credentials).await?;

        let profiles = profiles::list_profiles(&client, &session).await?;
        tracing::debug!("Profiles fetched: {}", profiles.len());

        let profile = profiles::resolve_profile(&profiles, profile_name, region)?;
        tracing::info!(
            "Matching profile found: {} with ID {}",
            profile.name,
            profile.id
        );

        Ok(Self::new(client, session, profile))
    }

    /// The control-plane client.
    pub fn client(&self) -> &ControlPlaneClient {
        &self.client
    }

    /// The authenticated session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The resolved profile.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Execute a GraphQL operation with this run's session.
    pub async fn call(&self, request: &GraphqlRequest) -> Result<Value> {
        self.client.call(&self.session, request).await
    }
}
