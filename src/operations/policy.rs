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

//! Publish, enforce and discard of staged changes.

use serde_json::json;

use crate::client::GraphqlRequest;
use crate::context::RunContext;
use crate::error::Result;
use crate::types::{ProfileType, PublishResult, Task};

use super::{field, optional_field};

const PUBLISH_MUTATION: &str = r#"mutation publishChanges($profileTypes: [ProfileType!], $skipNginxValidation: Boolean) {
  publishChanges(
    profileTypes: $profileTypes
    skipNginxValidation: $skipNginxValidation
  ) {
    isValid
    errors {
      message
      __typename
    }
    warnings {
      message
      __typename
    }
    isNginxErrors
    __typename
  }
}
"#;

const ENFORCE_MUTATION: &str = r#"mutation enforcePolicy($profilesIds: [ID!], $profileTypes: [ProfileType!]) {
  enforcePolicy(profilesIds: $profilesIds, profileTypes: $profileTypes) {
    id
    tenantId
    type
    status
    startTime
    endTime
    message
    errorCode
    referenceId
    __typename
  }
}
"#;

const DISCARD_MUTATION: &str = "mutation discardChanges {\n  discardChanges\n}\n";

/// Build the publish mutation covering every profile type.
pub fn publish_request() -> GraphqlRequest {
    GraphqlRequest::new(
        "publishChanges",
        PUBLISH_MUTATION,
        json!({ "profileTypes": ProfileType::ALL }),
    )
}

/// Build the enforce mutation covering every profile type.
pub fn enforce_request() -> GraphqlRequest {
    GraphqlRequest::new(
        "enforcePolicy",
        ENFORCE_MUTATION,
        json!({ "profileTypes": ProfileType::ALL }),
    )
}

/// Build the discard mutation.
pub fn discard_request() -> GraphqlRequest {
    GraphqlRequest::new("discardChanges", DISCARD_MUTATION, json!({}))
}

/// Validate all staged changes.
pub async fn publish(ctx: &RunContext) -> Result<PublishResult> {
    let data = ctx.call(&publish_request()).await?;
    field(&data, "publishChanges", "publishChanges")
}

/// Apply published changes; returns the enforcement task when one was started.
pub async fn enforce(ctx: &RunContext) -> Result<Option<Task>> {
    let data = ctx.call(&enforce_request()).await?;
    let task: Option<Task> = optional_field(&data, "enforcePolicy")?;
    Ok(task.filter(|t| !t.id.is_empty()))
}

/// Drop every staged change. Returns the platform's acknowledgement flag.
pub async fn discard(ctx: &RunContext) -> Result<bool> {
    let data = ctx.call(&discard_request()).await?;
    Ok(optional_field::<bool>(&data, "discardChanges")?.unwrap_or(false))
}
