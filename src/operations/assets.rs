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

//! Asset lookup and creation.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::GraphqlRequest;
use crate::context::RunContext;
use crate::error::Result;
use crate::types::{CreatedAsset, ExistingResource};

use super::field;

const ASSETS_QUERY: &str = r#"query AssetsName($matchSearch: [String], $sortBy: SortBy, $globalObject: Boolean, $filters: AssetsFilter, $paging: Paging) {
  getAssets(
    matchSearch: $matchSearch
    sortBy: $sortBy
    globalObject: $globalObject
    filters: $filters
    paging: $paging
  ) {
    assets {
      id
      name
      assetType
      __typename
    }
    __typename
  }
}
"#;

const NEW_ASSET_MUTATION: &str = r#"mutation newAssetByWizard($assetType: AssetType!, $assetInput: wizardAssetInput!, $profileInput: wizardProfileInput!, $zoneInput: wizardZoneInput, $parameterInput: wizardParameterInput, $practiceInput: [wizardPracticeInput], $reportTriggerInput: wizardReportTriggerInput) {
  newAssetByWizard(
    assetType: $assetType
    assetInput: $assetInput
    profileInput: $profileInput
    zoneInput: $zoneInput
    parameterInput: $parameterInput
    practiceInput: $practiceInput
    reportTriggerInput: $reportTriggerInput
  ) {
    id
    name
    assetType
    profiles {
      id
      name
      __typename
    }
    __typename
  }
}
"#;

/// Page size of the existence lookup.
const LOOKUP_LIMIT: u32 = 50;

/// Asset to be created through the wizard mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    /// Asset name.
    pub name: String,

    /// Public URLs served by the asset.
    pub urls: Vec<String>,

    /// Upstream the WAF forwards to.
    pub upstream: String,

    /// Operator supplies the certificate; no automated issuance.
    pub manual_certificate: bool,
}

#[derive(Deserialize)]
struct AssetPage {
    #[serde(default)]
    assets: Vec<ExistingResource>,
}

/// Build the existence lookup for assets matching `name`.
pub fn find_request(name: &str) -> GraphqlRequest {
    GraphqlRequest::new(
        "AssetsName",
        ASSETS_QUERY,
        json!({
            "matchSearch": [name],
            "globalObject": false,
            "paging": { "offset": 0, "limit": LOOKUP_LIMIT },
            "filters": {}
        }),
    )
}

/// Build the creation mutation for `asset` under the run's profile.
pub fn create_request(ctx: &RunContext, asset: &NewAsset) -> GraphqlRequest {
    let profile = ctx.profile();

    GraphqlRequest::new(
        "newAssetByWizard",
        NEW_ASSET_MUTATION,
        json!({
            "assetType": "WebApplication",
            "assetInput": {
                "name": asset.name,
                "URLs": asset.urls,
                "tags": [],
                "stage": "Staging",
                "sourceIdentifiers": [
                    { "sourceIdentifier": "XForwardedFor", "values": [] }
                ],
                "deployCertificateManually": asset.manual_certificate,
                "state": "Active",
                "upstreamURL": asset.upstream
            },
            "profileInput": {
                "name": profile.name,
                "id": profile.id,
                "profileType": "AppSecSaaS",
                "isCertificateUploadRequired": asset.manual_certificate,
                "region": profile.region
            },
            "zoneInput": {},
            "parameterInput": { "numOfSources": 3, "sourcesIdentifiers": [] },
            "practiceInput": default_practices(),
            "reportTriggerInput": {}
        }),
    )
}

fn default_practices() -> Value {
    json!([
        {
            "practiceType": "WebApplication",
            "modes": [
                { "mode": "Learn", "subPractice": "" },
                { "mode": "AccordingToPractice", "subPractice": "WebAttacks" },
                { "mode": "AccordingToPractice", "subPractice": "IPS" }
            ]
        },
        {
            "practiceType": "APIProtection",
            "modes": [
                { "mode": "Disabled", "subPractice": "" },
                { "mode": "Disabled", "subPractice": "APIDiscovery" },
                { "mode": "AccordingToPractice", "subPractice": "SchemaValidation" }
            ]
        }
    ])
}

/// Query the assets whose name matches `name`.
///
/// The control plane matches loosely, so callers still compare names
/// exactly against the returned entries.
pub async fn find_assets(ctx: &RunContext, name: &str) -> Result<Vec<ExistingResource>> {
    let data = ctx.call(&find_request(name)).await?;
    let page: AssetPage = field(&data, "AssetsName", "getAssets")?;
    Ok(page.assets)
}

/// Create a web-application asset bound to the run's profile.
pub async fn create_asset(ctx: &RunContext, asset: &NewAsset) -> Result<CreatedAsset> {
    let data = ctx.call(&create_request(ctx, asset)).await?;
    field(&data, "newAssetByWizard", "newAssetByWizard")
}
