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

//! Asynchronous task lookup.

use serde_json::json;

use crate::client::GraphqlRequest;
use crate::context::RunContext;
use crate::error::Result;
use crate::types::Task;

use super::field;

const TASK_QUERY: &str = r#"query getTask($id: ID!) {
  getTask(id: $id) {
    id
    status
    startTime
    endTime
    message
    errorCode
    referenceId
    tenantId
  }
}
"#;

/// Build the task lookup.
pub fn task_request(id: &str) -> GraphqlRequest {
    GraphqlRequest::new("getTask", TASK_QUERY, json!({ "id": id }))
}

/// Fetch the current state of task `id`.
pub async fn get_task(ctx: &RunContext, id: &str) -> Result<Task> {
    let data = ctx.call(&task_request(id)).await?;
    field(&data, "getTask", "getTask")
}
