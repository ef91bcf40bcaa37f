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

//! Integration tests for asset reconciliation

use std::fs;

use crate::integration::MockControlPlane;
use serde_json::json;
use wafsaas_onboard::manifest::AssetSpec;
use wafsaas_onboard::{CancelSignal, Manifest, Outcome, Reconciler, RunLog, WafError};

fn shop(owncertificate: Option<bool>) -> AssetSpec {
    AssetSpec {
        name: "shop".to_string(),
        domain: "https://shop.example.com, https://www.shop.example.com".to_string(),
        host: Some("shop.internal".to_string()),
        upstream: "https://origin.example.com".to_string(),
        owncertificate,
    }
}

fn log_lines(run_log: &RunLog) -> Vec<String> {
    fs::read_to_string(run_log.path().expect("Log has a path"))
        .expect("Failed to read run log")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_new_asset_with_own_certificate() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;
    mock.mock_create_asset("asset-1", "shop").await;
    mock.mock_publish(true, &[]).await;
    mock.mock_enforce("task-1").await;
    mock.mock_task_completed("task-1").await;

    let dir = tempfile::tempdir().unwrap();
    let run_log = RunLog::open_path(dir.path().join("run.log"));
    let ctx = mock.context();

    let outcome = Reconciler::new(&ctx, &run_log)
        .reconcile_asset(&shop(Some(true)))
        .await
        .expect("Reconciliation failed");

    assert_eq!(outcome, Outcome::Created { id: "asset-1".to_string() });

    let creations = mock.requests_for("newAssetByWizard").await;
    assert_eq!(creations.len(), 1);
    let vars = &creations[0]["variables"];
    assert_eq!(vars["assetInput"]["deployCertificateManually"], json!(true));
    assert_eq!(vars["profileInput"]["isCertificateUploadRequired"], json!(true));
    assert_eq!(
        vars["assetInput"]["URLs"],
        json!(["https://shop.example.com", "https://www.shop.example.com"])
    );
    assert!(vars["assetInput"].get("host").is_none());

    assert_eq!(mock.requests_for("publishChanges").await.len(), 1);
    assert_eq!(mock.requests_for("enforcePolicy").await.len(), 1);

    assert_eq!(log_lines(&run_log), vec!["Asset shop created successfully"]);
}

#[tokio::test]
async fn test_new_asset_with_platform_certificate() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;
    mock.mock_create_asset("asset-2", "shop").await;
    mock.mock_publish(true, &[]).await;
    mock.mock_enforce("task-1").await;
    mock.mock_task_completed("task-1").await;

    let ctx = mock.context();
    let run_log = RunLog::disabled();
    Reconciler::new(&ctx, &run_log)
        .reconcile_asset(&shop(Some(false)))
        .await
        .expect("Reconciliation failed");

    let creations = mock.requests_for("newAssetByWizard").await;
    assert_eq!(
        creations[0]["variables"]["assetInput"]["deployCertificateManually"],
        json!(false)
    );
}

#[tokio::test]
async fn test_rerun_against_unchanged_state_creates_nothing() {
    let mock = MockControlPlane::start().await;
    // The lookup matches loosely; only the exact name counts.
    mock.mock_assets(&[("asset-9", "shop-old"), ("asset-1", "shop")])
        .await;

    let dir = tempfile::tempdir().unwrap();
    let run_log = RunLog::open_path(dir.path().join("run.log"));
    let ctx = mock.context();

    let assets = vec![shop(Some(true)), shop(None)];
    let summary = Reconciler::new(&ctx, &run_log)
        .reconcile_assets(&assets)
        .await
        .expect("Reconciliation failed");

    assert_eq!(summary.already_exists, 2);
    assert_eq!(summary.total(), 2);
    assert!(mock.requests_for("newAssetByWizard").await.is_empty());
    assert!(mock.requests_for("publishChanges").await.is_empty());
    assert_eq!(
        log_lines(&run_log),
        vec![
            "Asset shop already exists with ID asset-1",
            "Asset shop already exists with ID asset-1"
        ]
    );

    let lookup = &mock.requests_for("AssetsName").await[0];
    assert_eq!(lookup["variables"]["matchSearch"], json!(["shop"]));
}

#[tokio::test]
async fn test_invalid_publish_fails_asset_and_continues() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;
    mock.mock_create_asset("asset-1", "shop").await;
    mock.mock_publish(false, &["Duplicate host"]).await;
    mock.mock_discard().await;

    let dir = tempfile::tempdir().unwrap();
    let run_log = RunLog::open_path(dir.path().join("run.log"));
    let ctx = mock.context();

    let mut blog = shop(Some(false));
    blog.name = "blog".to_string();

    let summary = Reconciler::new(&ctx, &run_log)
        .reconcile_assets(&[shop(Some(true)), blog])
        .await
        .expect("Reconciliation failed");

    assert_eq!(summary.failed, 2);
    assert_eq!(mock.requests_for("discardChanges").await.len(), 2);
    assert!(mock.requests_for("enforcePolicy").await.is_empty());

    let lines = log_lines(&run_log);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("FAIL to create Asset shop"));
    assert!(lines[0].contains("Duplicate host"));
    assert!(lines[1].starts_with("FAIL to create Asset blog"));
}

#[tokio::test]
async fn test_creation_error_is_scoped_to_the_asset() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;
    mock.mock_graphql_errors("newAssetByWizard", &["Invalid upstream URL"])
        .await;

    let ctx = mock.context();
    let run_log = RunLog::disabled();
    let outcome = Reconciler::new(&ctx, &run_log)
        .reconcile_asset(&shop(Some(true)))
        .await
        .expect("Reconciliation failed");

    match outcome {
        Outcome::Failed { reason } => assert!(reason.contains("Invalid upstream URL")),
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert!(mock.requests_for("publishChanges").await.is_empty());
}

#[tokio::test]
async fn test_missing_certificate_type_is_skipped() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;

    let dir = tempfile::tempdir().unwrap();
    let run_log = RunLog::open_path(dir.path().join("run.log"));
    let ctx = mock.context();

    let outcome = Reconciler::new(&ctx, &run_log)
        .reconcile_asset(&shop(None))
        .await
        .expect("Reconciliation failed");

    assert!(matches!(outcome, Outcome::Skipped { .. }));
    assert!(mock.requests_for("newAssetByWizard").await.is_empty());
    assert_eq!(
        log_lines(&run_log),
        vec!["Asset shop skipped: No certificate type provided"]
    );
}

#[tokio::test]
async fn test_dry_run_only_looks() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;

    let ctx = mock.context();
    let run_log = RunLog::disabled();
    let outcome = Reconciler::new(&ctx, &run_log)
        .with_dry_run(true)
        .reconcile_asset(&shop(Some(true)))
        .await
        .expect("Reconciliation failed");

    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: "dry run: would create".to_string()
        }
    );
    assert_eq!(mock.requests_for("AssetsName").await.len(), 1);
    assert!(mock.requests_for("newAssetByWizard").await.is_empty());
}

#[tokio::test]
async fn test_manifest_driven_run() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;
    mock.mock_create_asset("asset-1", "shop").await;
    mock.mock_publish(true, &[]).await;
    mock.mock_operation("enforcePolicy", json!({ "enforcePolicy": null }))
        .await;

    let manifest = Manifest::from_yaml(
        r#"
configuration:
  profile: production
  region: eu-west-1
assets:
  - name: shop
    domain: https://shop.example.com
    upstream: https://origin.example.com
    owncertificate: true
"#,
    )
    .unwrap();

    let ctx = mock.context();
    let run_log = RunLog::disabled();
    let summary = Reconciler::new(&ctx, &run_log)
        .reconcile_assets(&manifest.assets)
        .await
        .expect("Reconciliation failed");

    assert_eq!(summary.created, 1);
    assert!(!summary.has_failures());
}

#[tokio::test]
async fn test_publish_error_discards_created_asset() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[]).await;
    mock.mock_create_asset("asset-1", "shop").await;
    mock.mock_graphql_errors("publishChanges", &["Internal error"])
        .await;
    mock.mock_discard().await;

    let dir = tempfile::tempdir().unwrap();
    let run_log = RunLog::open_path(dir.path().join("run.log"));
    let ctx = mock.context();

    let outcome = Reconciler::new(&ctx, &run_log)
        .reconcile_asset(&shop(Some(true)))
        .await
        .expect("Reconciliation failed");

    match outcome {
        Outcome::Failed { reason } => assert!(reason.contains("Internal error")),
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(mock.requests_for("newAssetByWizard").await.len(), 1);
    assert_eq!(mock.requests_for("discardChanges").await.len(), 1);
    assert!(mock.requests_for("enforcePolicy").await.is_empty());

    let lines = log_lines(&run_log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("FAIL to create Asset shop"));
}

#[tokio::test]
async fn test_cancelled_run_stops_before_next_asset() {
    let mock = MockControlPlane::start().await;
    mock.mock_assets(&[("asset-1", "shop")]).await;

    let cancel = CancelSignal::new();
    cancel.cancel();

    let dir = tempfile::tempdir().unwrap();
    let run_log = RunLog::open_path(dir.path().join("run.log"));
    let ctx = mock.context();

    let assets = vec![shop(Some(true)), shop(Some(true)), shop(Some(true))];
    let err = Reconciler::new(&ctx, &run_log)
        .with_cancel(cancel)
        .reconcile_assets(&assets)
        .await
        .unwrap_err();

    assert!(matches!(err, WafError::Cancelled(ref what) if what.contains("shop")));
    assert!(err.is_fatal());
    assert!(mock.requests_for("AssetsName").await.is_empty());
    assert!(log_lines(&run_log).is_empty());
}
