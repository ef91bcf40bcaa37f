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

//! Profile lookup and certificate-domain listing.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::{ControlPlaneClient, GraphqlRequest};
use crate::context::RunContext;
use crate::error::{Result, WafError};
use crate::types::{CertificateDomain, Profile, Session};

use super::field;

const PROFILES_QUERY: &str = r#"query ProfilesName($matchSearch: String, $filters: ProfileFilter, $paging: Paging, $sortBy: SortBy) {
  getProfiles(matchSearch: $matchSearch, filters: $filters, paging: $paging, sortBy: $sortBy) {
    id
    name
    __typename
  }
}
"#;

const PROFILE_QUERY: &str = r#"query Profile($id: ID!) {
  getProfile(id: $id) {
    id
    name
    profileType
    ... on AppSecSaaSProfile {
      region
      certificateDomains {
        id
        domain
        certificateParameter {
          id
          __typename
        }
        __typename
      }
      __typename
    }
    __typename
  }
}
"#;

/// Profile entry as listed by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileSummary {
    /// Profile id.
    pub id: String,

    /// Profile name.
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDetails {
    #[serde(default)]
    certificate_domains: Option<Vec<RawCertificateDomain>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCertificateDomain {
    domain: String,
    #[serde(default)]
    certificate_parameter: Option<RawParameter>,
}

#[derive(Deserialize)]
struct RawParameter {
    #[serde(default)]
    id: Option<String>,
}

/// Build the profile listing request.
pub fn list_request() -> GraphqlRequest {
    GraphqlRequest::new("ProfilesName", PROFILES_QUERY, json!({}))
}

/// Build the single-profile request.
pub fn profile_request(profile_id: &str) -> GraphqlRequest {
    GraphqlRequest::new("Profile", PROFILE_QUERY, json!({ "id": profile_id }))
}

/// List all profiles visible to the session.
pub async fn list_profiles(
    client: &ControlPlaneClient,
    session: &Session,
) -> Result<Vec<ProfileSummary>> {
    let data = client.call(session, &list_request()).await?;
    field(&data, "ProfilesName", "getProfiles")
}

/// Pick the single profile named `name`.
///
/// # Errors
///
/// [`WafError::ProfileNotFound`] when nothing matches and
/// [`WafError::AmbiguousProfile`] when more than one profile matches.
pub fn resolve_profile(profiles: &[ProfileSummary], name: &str, region: &str) -> Result<Profile> {
    let mut matches = profiles.iter().filter(|p| p.name == name);

    let first = matches
        .next()
        .ok_or_else(|| WafError::ProfileNotFound(name.to_string()))?;

    let extra = matches.count();
    if extra > 0 {
        return Err(WafError::AmbiguousProfile {
            name: name.to_string(),
            count: extra + 1,
        });
    }

    Ok(Profile {
        id: first.id.clone(),
        name: first.name.clone(),
        region: region.to_string(),
    })
}

/// Fetch the certificate domains currently registered on the run's profile.
pub async fn certificate_domains(ctx: &RunContext) -> Result<Vec<CertificateDomain>> {
    let data = ctx.call(&profile_request(&ctx.profile().id)).await?;
    decode_certificate_domains(&data)
}

fn decode_certificate_domains(data: &Value) -> Result<Vec<CertificateDomain>> {
    let details: ProfileDetails = field(data, "Profile", "getProfile")?;

    Ok(details
        .certificate_domains
        .unwrap_or_default()
        .into_iter()
        .map(|raw| CertificateDomain {
            domain: raw.domain,
            parameter_id: raw.certificate_parameter.and_then(|p| p.id),
        })
        .collect())
}

/// Find the certificate-parameter id for a manifest URL.
///
/// Platform domains carry no scheme, so each one is compared in its
/// `https://`-prefixed form against `url`, exactly.
pub fn find_parameter_id(domains: &[CertificateDomain], url: &str) -> Option<String> {
    domains
        .iter()
        .find(|d| d.url() == url)
        .and_then(|d| d.parameter_id.clone())
}
