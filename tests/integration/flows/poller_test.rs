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

//! Integration tests for task polling

use std::time::Duration;

use crate::integration::{MockControlPlane, task};
use serde_json::json;
use wafsaas_onboard::{CancelSignal, PollConfig, TaskPoller, TaskStatus, WafError};

fn poller(max_attempts: u32) -> TaskPoller {
    TaskPoller::new(
        PollConfig::builder()
            .interval(Duration::from_millis(10))
            .max_attempts(max_attempts)
            .build(),
    )
}

#[tokio::test]
async fn test_polls_until_not_in_progress() {
    let mock = MockControlPlane::start().await;
    mock.mock_operation_times("getTask", json!({ "getTask": task("task-1", "InProgress") }), 2)
        .await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-1", "Completed") }))
        .await;

    let result = poller(10)
        .await_completion(&mock.context(), "task-1", &CancelSignal::new())
        .await
        .expect("Polling failed");

    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(mock.requests_for("getTask").await.len(), 3);

    let body = &mock.requests_for("getTask").await[0];
    assert_eq!(body["variables"]["id"], "task-1");
}

#[tokio::test]
async fn test_failed_status_is_returned_not_raised() {
    let mock = MockControlPlane::start().await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-1", "Failed") }))
        .await;

    let result = poller(10)
        .await_completion(&mock.context(), "task-1", &CancelSignal::new())
        .await
        .expect("Polling failed");

    assert!(result.status.is_failure());
    assert_eq!(mock.requests_for("getTask").await.len(), 1);
}

#[tokio::test]
async fn test_times_out_after_max_attempts() {
    let mock = MockControlPlane::start().await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-1", "InProgress") }))
        .await;

    let err = poller(3)
        .await_completion(&mock.context(), "task-1", &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::TaskTimedOut { attempts: 3, .. }));
    assert_eq!(mock.requests_for("getTask").await.len(), 3);
}

#[tokio::test]
async fn test_deadline_bounds_the_wait() {
    let mock = MockControlPlane::start().await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-1", "InProgress") }))
        .await;

    let poller = TaskPoller::new(
        PollConfig::builder()
            .interval(Duration::from_millis(50))
            .max_attempts(1_000)
            .deadline(Duration::from_millis(120))
            .build(),
    );

    let err = poller
        .await_completion(&mock.context(), "task-1", &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::TaskTimedOut { .. }));
    assert!(mock.requests_for("getTask").await.len() < 10);
}

#[tokio::test]
async fn test_cancel_stops_waiting() {
    let mock = MockControlPlane::start().await;
    mock.mock_operation("getTask", json!({ "getTask": task("task-1", "InProgress") }))
        .await;

    let poller = TaskPoller::new(
        PollConfig::builder()
            .interval(Duration::from_secs(60))
            .max_attempts(1_000)
            .build(),
    );
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let ctx = mock.context();
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        poller.await_completion(&ctx, "task-1", &cancel),
    )
    .await
    .expect("Cancel did not interrupt the wait")
    .unwrap_err();

    assert!(matches!(err, WafError::Cancelled(ref what) if what.contains("task-1")));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_already_cancelled_makes_no_request() {
    let mock = MockControlPlane::start().await;
    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = poller(10)
        .await_completion(&mock.context(), "task-1", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::Cancelled(_)));
    assert!(mock.requests_for("getTask").await.is_empty());
}
