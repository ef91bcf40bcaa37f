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

//! Integration tests for login, profile resolution and GraphQL error handling

use crate::integration::{MockControlPlane, PROFILE_ID, TEST_TOKEN};
use serde_json::json;
use wafsaas_onboard::operations::tasks;
use wafsaas_onboard::{Credentials, RunContext, WafError};

fn credentials() -> Credentials {
    Credentials::new("client-id", "access-key")
}

#[tokio::test]
async fn test_login_success() {
    let mock = MockControlPlane::start().await;
    mock.mock_login_success().await;

    let session = mock
        .client()
        .login(&credentials())
        .await
        .expect("Login failed");

    assert_eq!(session.token(), TEST_TOKEN);
    assert_eq!(session.client_id(), "client-id");
    assert_eq!(session.tenant_id(), Some("tenant-1"));
    assert_eq!(session.expires_in(), Some(1800));

    let requests = mock.inner().received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({ "clientId": "client-id", "accessKey": "access-key" }));
}

#[tokio::test]
async fn test_login_rejected_is_fatal() {
    let mock = MockControlPlane::start().await;
    mock.mock_login_failure(401).await;

    let err = mock.client().login(&credentials()).await.unwrap_err();

    assert!(matches!(err, WafError::AuthenticationFailed { status: 401, .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_establish_resolves_profile() {
    let mock = MockControlPlane::start().await;
    mock.mock_login_success().await;
    mock.mock_profiles(&[("prof-0", "staging"), (PROFILE_ID, "production")])
        .await;

    let ctx = RunContext::establish(mock.client(), &credentials(), "production", "eu-west-1")
        .await
        .expect("Context setup failed");

    assert_eq!(ctx.profile().id, PROFILE_ID);
    assert_eq!(ctx.profile().region, "eu-west-1");
    assert_eq!(ctx.session().token(), TEST_TOKEN);
}

#[tokio::test]
async fn test_establish_ambiguous_profile_is_fatal() {
    let mock = MockControlPlane::start().await;
    mock.mock_login_success().await;
    mock.mock_profiles(&[("a", "production"), ("b", "production")])
        .await;

    let err = RunContext::establish(mock.client(), &credentials(), "production", "eu-west-1")
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::AmbiguousProfile { count: 2, .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_establish_missing_profile_is_fatal() {
    let mock = MockControlPlane::start().await;
    mock.mock_login_success().await;
    mock.mock_profiles(&[("a", "staging")]).await;

    let err = RunContext::establish(mock.client(), &credentials(), "production", "eu-west-1")
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::ProfileNotFound(ref name) if name == "production"));
}

#[tokio::test]
async fn test_graphql_errors_in_200_response() {
    let mock = MockControlPlane::start().await;
    mock.mock_graphql_errors("getTask", &["Task not found"]).await;

    let err = tasks::get_task(&mock.context(), "task-1").await.unwrap_err();

    match err {
        WafError::Graphql {
            operation,
            messages,
        } => {
            assert_eq!(operation, "getTask");
            assert_eq!(messages, vec!["Task not found".to_string()]);
        }
        other => panic!("Expected Graphql error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_carries_status_and_body() {
    let mock = MockControlPlane::start().await;
    mock.mock_server_error("getTask", 503, "maintenance").await;

    let err = tasks::get_task(&mock.context(), "task-1").await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("maintenance"));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_null_field_is_missing_data() {
    let mock = MockControlPlane::start().await;
    mock.mock_operation("getTask", json!({ "getTask": null })).await;

    let err = tasks::get_task(&mock.context(), "task-1").await.unwrap_err();

    assert!(matches!(err, WafError::MissingData { .. }));
}
