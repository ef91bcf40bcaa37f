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

//! Integration tests for publish, enforce and rollback

use crate::integration::{MockControlPlane, task};
use serde_json::json;
use wafsaas_onboard::{CancelSignal, Orchestrator, PublishOutcome, TaskStatus, WafError};

#[tokio::test]
async fn test_invalid_publish_discards_and_never_enforces() {
    let mock = MockControlPlane::start().await;
    mock.mock_publish(false, &["Upstream unreachable"]).await;
    mock.mock_discard().await;
    mock.mock_enforce("task-1").await;

    let ctx = mock.context();
    let outcome = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .expect("Publish cycle failed");

    assert_eq!(
        outcome,
        PublishOutcome::RolledBack {
            errors: vec!["Upstream unreachable".to_string()],
            discarded: true,
        }
    );
    assert!(!outcome.is_success());
    assert_eq!(mock.requests_for("discardChanges").await.len(), 1);
    assert!(mock.requests_for("enforcePolicy").await.is_empty());
    assert!(mock.requests_for("getTask").await.is_empty());
}

#[tokio::test]
async fn test_failed_discard_is_still_rolled_back() {
    let mock = MockControlPlane::start().await;
    mock.mock_publish(false, &[]).await;
    mock.mock_server_error("discardChanges", 500, "boom").await;

    let ctx = mock.context();
    let outcome = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .expect("Publish cycle failed");

    assert!(matches!(outcome, PublishOutcome::RolledBack { discarded: false, .. }));
    assert!(mock.requests_for("enforcePolicy").await.is_empty());
}

#[tokio::test]
async fn test_unacknowledged_discard_is_reported() {
    let mock = MockControlPlane::start().await;
    mock.mock_publish(false, &["Duplicate host"]).await;
    mock.mock_operation("discardChanges", json!({ "discardChanges": false }))
        .await;

    let ctx = mock.context();
    let outcome = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .expect("Publish cycle failed");

    assert_eq!(
        outcome,
        PublishOutcome::RolledBack {
            errors: vec!["Duplicate host".to_string()],
            discarded: false,
        }
    );
    assert_eq!(mock.requests_for("discardChanges").await.len(), 1);
}

#[tokio::test]
async fn test_valid_publish_enforces_and_polls_to_completion() {
    let mock = MockControlPlane::start().await;
    mock.mock_publish(true, &[]).await;
    mock.mock_enforce("task-7").await;
    mock.mock_operation_times("getTask", json!({ "getTask": task("task-7", "InProgress") }), 1)
        .await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-7", "Succeeded") }))
        .await;

    let ctx = mock.context();
    let outcome = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .expect("Publish cycle failed");

    match outcome {
        PublishOutcome::Enforced { task: Some(task) } => {
            assert_eq!(task.id, "task-7");
            assert_eq!(task.status, TaskStatus::Succeeded);
        }
        other => panic!("Expected Enforced with task, got {:?}", other),
    }
    assert_eq!(mock.requests_for("getTask").await.len(), 2);
    assert!(mock.requests_for("discardChanges").await.is_empty());

    let enforce = &mock.requests_for("enforcePolicy").await[0];
    assert_eq!(
        enforce["variables"]["profileTypes"],
        json!(["Docker", "CloudGuardAppSecGateway", "Embedded", "Kubernetes", "AppSecSaaS"])
    );
}

#[tokio::test]
async fn test_failed_task_still_counts_as_enforced() {
    let mock = MockControlPlane::start().await;
    mock.mock_publish(true, &[]).await;
    mock.mock_enforce("task-9").await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-9", "Failed") }))
        .await;

    let ctx = mock.context();
    let outcome = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .expect("Publish cycle failed");

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_enforce_without_task_skips_polling() {
    let mock = MockControlPlane::start().await;
    mock.mock_publish(true, &[]).await;
    mock.mock_operation("enforcePolicy", json!({ "enforcePolicy": null }))
        .await;

    let ctx = mock.context();
    let outcome = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .expect("Publish cycle failed");

    assert_eq!(outcome, PublishOutcome::Enforced { task: None });
    assert!(mock.requests_for("getTask").await.is_empty());
}

#[tokio::test]
async fn test_publish_transport_failure_is_an_error() {
    let mock = MockControlPlane::start().await;
    mock.mock_server_error("publishChanges", 502, "bad gateway").await;

    let ctx = mock.context();
    let err = Orchestrator::from_context(&ctx)
        .publish_and_enforce(&ctx, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::ServerError { status: 502, .. }));
    assert!(mock.requests_for("enforcePolicy").await.is_empty());
}
