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

//! Reconciliation of declared resources against the control plane.
//!
//! Resources are processed one at a time, in manifest order. Each one is
//! checked, created or uploaded if needed, and published and enforced before
//! the next begins, because the platform holds a single pending change-set.
//! When a step fails after a mutation was staged, the change-set is
//! discarded so the next resource does not publish it.
//! Failures are scoped to the resource: they are recorded in the run log and
//! the loop continues. Only fatal errors (see [`WafError::is_fatal`]) stop
//! the run.

use std::fmt;
use std::path::Path;

use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::context::RunContext;
use crate::envelope;
use crate::error::{Result, WafError};
use crate::manifest::{AssetSpec, CertificateSpec};
use crate::operations::assets::{self, NewAsset};
use crate::operations::certificates::{self, DomainCertificate};
use crate::operations::{policy, profiles};
use crate::orchestrator::Orchestrator;
use crate::poller::CancelSignal;
use crate::run_log::RunLog;
use crate::types::SensitiveFieldRef;

/// Reason recorded when a certificate URL has no certificate domain.
pub const URL_NOT_FOUND: &str = "URL not found in the profile";

/// Reason recorded for assets without `owncertificate`.
pub const NO_CERTIFICATE_TYPE: &str = "No certificate type provided";

/// Result of reconciling one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A resource with the same name already exists; nothing was changed.
    AlreadyExists {
        /// Id of the existing resource.
        id: String,
    },

    /// The resource was created (or the certificate bound) and enforced.
    Created {
        /// Id of the created asset or bound certificate parameter.
        id: String,
    },

    /// Reconciliation failed for this resource only.
    Failed {
        /// Human-readable reason.
        reason: String,
    },

    /// Nothing was attempted.
    Skipped {
        /// Human-readable reason.
        reason: String,
    },
}

impl Outcome {
    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Run-log line for an asset outcome.
    pub fn asset_line(&self, name: &str) -> String {
        match self {
            Self::AlreadyExists { id } => format!("Asset {} already exists with ID {}", name, id),
            Self::Created { .. } => format!("Asset {} created successfully", name),
            Self::Failed { reason } => format!("FAIL to create Asset {}: {}", name, reason),
            Self::Skipped { reason } => format!("Asset {} skipped: {}", name, reason),
        }
    }

    /// Run-log line for a certificate outcome.
    pub fn certificate_line(&self, url: &str) -> String {
        match self {
            Self::AlreadyExists { .. } | Self::Created { .. } => {
                format!("Certificate uploaded successfully {}", url)
            }
            Self::Failed { reason } => format!("Certificate upload failed {}: {}", url, reason),
            Self::Skipped { reason } => format!("Certificate upload skipped {}: {}", url, reason),
        }
    }
}

/// Per-outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Resources that already existed.
    pub already_exists: usize,
    /// Resources created or bound.
    pub created: usize,
    /// Resources that failed.
    pub failed: usize,
    /// Resources skipped.
    pub skipped: usize,
}

impl RunSummary {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::AlreadyExists { .. } => self.already_exists += 1,
            Outcome::Created { .. } => self.created += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Total number of processed resources.
    pub fn total(&self) -> usize {
        self.already_exists + self.created + self.failed + self.skipped
    }

    /// Returns true if any resource failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} created, {} already existing, {} failed, {} skipped",
            self.total(),
            self.created,
            self.already_exists,
            self.failed,
            self.skipped
        )
    }
}

/// Drives reconciliation for one run.
pub struct Reconciler<'a> {
    ctx: &'a RunContext,
    run_log: &'a RunLog,
    orchestrator: Orchestrator,
    cancel: CancelSignal,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler writing outcomes to `run_log`.
    pub fn new(ctx: &'a RunContext, run_log: &'a RunLog) -> Self {
        Self {
            ctx,
            run_log,
            orchestrator: Orchestrator::from_context(ctx),
            cancel: CancelSignal::new(),
            dry_run: false,
        }
    }

    /// Use `cancel` to abort task waits.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Only look, never change anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile every asset in order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; resource-scoped failures are counted
    /// in the summary instead.
    pub async fn reconcile_assets(&self, assets: &[AssetSpec]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for asset in assets {
            self.check_cancelled(&format!("asset {}", asset.name))?;
            info!("--------- ASSET {} started ---------", asset.name);
            let outcome = self.reconcile_asset(asset).await?;
            summary.record(&outcome);
            info!("--------- ASSET {} end ---------", asset.name);
        }

        Ok(summary)
    }

    /// Reconcile one asset and record the outcome in the run log.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned.
    pub async fn reconcile_asset(&self, asset: &AssetSpec) -> Result<Outcome> {
        let outcome = scoped(self.converge_asset(asset).await)?;

        match &outcome {
            Outcome::Failed { reason } => error!("Asset {} failed: {}", asset.name, reason),
            Outcome::Skipped { reason } => warn!("Asset {} skipped: {}", asset.name, reason),
            _ => {}
        }

        self.run_log.record(&outcome.asset_line(&asset.name));
        Ok(outcome)
    }

    async fn converge_asset(&self, asset: &AssetSpec) -> Result<Outcome> {
        let existing = assets::find_assets(self.ctx, &asset.name).await?;

        if let Some(found) = existing.iter().find(|r| r.name == asset.name) {
            info!(
                "Asset {} already exists with ID {}, skipping",
                found.name, found.id
            );
            return Ok(Outcome::AlreadyExists {
                id: found.id.clone(),
            });
        }

        if self.dry_run {
            return Ok(Outcome::skipped("dry run: would create"));
        }

        let Some(manual_certificate) = asset.owncertificate else {
            return Ok(Outcome::skipped(NO_CERTIFICATE_TYPE));
        };

        let new_asset = NewAsset {
            name: asset.name.clone(),
            urls: asset.domains(),
            upstream: asset.upstream.clone(),
            manual_certificate,
        };

        if manual_certificate {
            info!("Creating asset {} with an operator-supplied certificate", asset.name);
        } else {
            info!("Creating asset {} with a platform-issued certificate", asset.name);
        }

        let created = assets::create_asset(self.ctx, &new_asset).await?;
        info!("Asset created with ID {}", created.id);

        let result = self.publish(created.id).await;
        self.settle(result).await
    }

    /// Upload every certificate binding in order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; resource-scoped failures are counted
    /// in the summary instead.
    pub async fn upload_certificates(&self, urls: &[CertificateSpec]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for entry in urls {
            self.check_cancelled(&format!("URL {}", entry.url))?;
            info!("--------- URL {} started ---------", entry.url);
            let outcome = self.upload_certificate(entry).await?;
            summary.record(&outcome);
            info!("--------- URL {} end ---------", entry.url);
        }

        Ok(summary)
    }

    /// Upload one certificate binding and record the outcome in the run log.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned.
    pub async fn upload_certificate(&self, entry: &CertificateSpec) -> Result<Outcome> {
        let outcome = scoped(self.converge_certificate(entry).await)?;

        match &outcome {
            Outcome::Failed { reason } => {
                error!("Failed to upload certificate for {}: {}", entry.url, reason)
            }
            Outcome::Skipped { reason } => {
                warn!("Certificate for {} skipped: {}", entry.url, reason)
            }
            _ => {}
        }

        self.run_log.record(&outcome.certificate_line(&entry.url));
        Ok(outcome)
    }

    async fn converge_certificate(&self, entry: &CertificateSpec) -> Result<Outcome> {
        let domains = profiles::certificate_domains(self.ctx).await?;

        let Some(parameter_id) = profiles::find_parameter_id(&domains, &entry.url) else {
            return Ok(Outcome::failed(URL_NOT_FOUND));
        };
        debug!("Certificate parameter for {} is {}", entry.url, parameter_id);

        if self.dry_run {
            return Ok(Outcome::skipped("dry run: would upload"));
        }

        let private_key = read_file(&entry.cert_key)?;
        let certificate = read_file(&entry.cert_pem)?;
        envelope::check_certificate(&certificate)?;

        let public_key = certificates::public_key(self.ctx).await?;
        let sealed = envelope::seal(private_key.as_bytes(), &public_key)?;
        if sealed.is_empty() {
            return Ok(Outcome::failed("private key encryption produced an empty envelope"));
        }
        info!("Private key encrypted for {}", entry.url);

        let refs = certificates::add_sensitive_field(self.ctx, &sealed, &certificate).await?;

        let result = self
            .bind_and_publish(entry, parameter_id, &certificate, &refs)
            .await;
        self.settle(result).await
    }

    async fn bind_and_publish(
        &self,
        entry: &CertificateSpec,
        parameter_id: String,
        certificate: &str,
        refs: &SensitiveFieldRef,
    ) -> Result<Outcome> {
        if refs.is_empty() {
            return Err(WafError::missing_data("addSensitiveField", "certificateArn"));
        }

        let binding = DomainCertificate {
            parameter_id: &parameter_id,
            domain: &entry.domain,
            certificate_pem: certificate,
            refs,
            uploaded_at_ms: OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000,
        };
        info!("Uploading certificate for domain {}", entry.url);
        if !certificates::update_domain_certificate(self.ctx, &binding).await? {
            return Err(WafError::not_acknowledged("updateDomainCertificate"));
        }

        self.publish(parameter_id).await
    }

    /// Publish and enforce staged changes for the resource `id`.
    async fn publish(&self, id: String) -> Result<Outcome> {
        let published = self
            .orchestrator
            .publish_and_enforce(self.ctx, &self.cancel)
            .await?;

        match published.failure_reason() {
            Some(reason) => Ok(Outcome::failed(reason)),
            None => Ok(Outcome::Created { id }),
        }
    }

    /// Discard the pending change-set when a step after staging failed.
    ///
    /// Rolled-back publishes are already discarded and come back as `Ok`.
    async fn settle(&self, result: Result<Outcome>) -> Result<Outcome> {
        if let Err(e) = &result {
            warn!("Discarding staged changes after failure: {}", e);
            match policy::discard(self.ctx).await {
                Ok(true) => info!("Pending changes discarded"),
                Ok(false) => error!("Discard of pending changes was not acknowledged"),
                Err(discard_err) => error!("Failed to discard pending changes: {}", discard_err),
            }
        }
        result
    }

    fn check_cancelled(&self, next: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!("Run cancelled before {}", next);
            return Err(WafError::cancelled(format!("run stopped before {}", next)));
        }
        Ok(())
    }
}

/// Turn resource-scoped errors into a failed outcome; keep fatal ones.
fn scoped(result: Result<Outcome>) -> Result<Outcome> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => Ok(Outcome::failed(e.to_string())),
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        WafError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}
