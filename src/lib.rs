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

//! # wafsaas-onboard
//!
//! Declarative onboarding of web-application assets and TLS certificates
//! into a cloud WAF SaaS platform through its GraphQL control plane.
//!
//! A run reads a YAML manifest, logs in, resolves the target profile and
//! then converges each declared resource in turn: it checks what already
//! exists, creates what is missing (encrypting private keys for upload
//! where needed), and publishes and enforces the resulting policy.
//!
//! ## Features
//!
//! - **Async-first design** using Tokio
//! - **Idempotent reconciliation** of assets by name
//! - **Hybrid encryption** (AES-256-CBC + RSA-OAEP-SHA256) of private keys
//! - **Publish/enforce with rollback**: invalid change-sets are discarded
//! - **Bounded, cancellable task polling**
//! - **Append-only run log** per invocation
//!
//! ## Quick Start
//!
//! ```no_run
//! use wafsaas_onboard::manifest::{ManifestLoader, RunKind};
//! use wafsaas_onboard::{ClientConfig, ControlPlaneClient, Credentials, Reconciler, RunContext, RunLog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manifest = ManifestLoader::new(RunKind::Assets).load()?;
//!
//!     let client = ControlPlaneClient::new(ClientConfig::from_env()?)?;
//!     let ctx = RunContext::establish(
//!         client,
//!         &Credentials::from_env()?,
//!         &manifest.configuration.profile,
//!         &manifest.configuration.region,
//!     )
//!     .await?;
//!
//!     let run_log = RunLog::open(".", RunKind::Assets);
//!     let summary = Reconciler::new(&ctx, &run_log)
//!         .reconcile_assets(&manifest.assets)
//!         .await?;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Environment
//!
//! - `WAFAUTHURL`: login endpoint
//! - `WAFKEY` / `WAFSECRET`: client id and access key
//! - `WAFGRAPHQLURL`: GraphQL endpoint override

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod manifest;
pub mod operations;
pub mod orchestrator;
pub mod poller;
pub mod reconcile;
pub mod run_log;
pub mod tls;
pub mod types;

// Re-export main types at crate root for convenience
pub use client::{ControlPlaneClient, GraphqlRequest};
pub use config::{ClientConfig, ClientConfigBuilder, Credentials, PollConfig};
pub use context::RunContext;
pub use envelope::EncryptedEnvelope;
pub use error::{Result, WafError};
pub use manifest::{Manifest, ManifestLoader, RunKind};
pub use orchestrator::{Orchestrator, PublishOutcome};
pub use poller::{CancelSignal, TaskPoller};
pub use reconcile::{Outcome, Reconciler, RunSummary};
pub use run_log::RunLog;
pub use types::{Profile, Session, Task, TaskStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("wafsaas-onboard/", env!("CARGO_PKG_VERSION"));
