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

//! WAF SaaS onboarding command-line tool.
//!
//! # Usage
//!
//! ```text
//! wafsaas-onboard [OPTIONS] <COMMAND>
//!
//! Commands:
//!   assets        Reconcile assets declared in the manifest
//!   certificates  Upload certificate bindings declared in the manifest
//!   validate      Parse and validate a manifest without contacting the platform
//!
//! Options:
//!   -m, --manifest <PATH>        Manifest path (default assets.yaml / certificates.yaml)
//!       --log-dir <DIR>          Run-log directory (default .)
//!       --poll-interval <SECS>   Task poll interval
//!       --poll-max-attempts <N>  Task poll bound
//!       --dry-run                Show what would happen without making changes
//!   -v, --verbose                Enable verbose output
//!   -q, --quiet                  Suppress non-error output
//! ```
//!
//! Credentials are read from `WAFAUTHURL`, `WAFKEY` and `WAFSECRET`.
//!
//! # Examples
//!
//! ```bash
//! # Onboard the assets in ./assets.yaml
//! wafsaas-onboard assets
//!
//! # Upload certificates from a specific manifest
//! wafsaas-onboard certificates --manifest prod/certificates.yaml
//!
//! # Check a manifest before committing it
//! wafsaas-onboard validate --kind certificates -m certificates.yaml
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use time::OffsetDateTime;

use wafsaas_onboard::{
    CancelSignal, ClientConfig, ControlPlaneClient, Credentials, ManifestLoader, PollConfig,
    Reconciler, RunContext, RunKind, RunLog, RunSummary,
};

/// WAF SaaS onboarding tool
#[derive(Parser)]
#[command(name = "wafsaas-onboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Onboard assets and certificates into a WAF SaaS profile", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the manifest
    #[arg(short, long, global = true, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Directory for the run log
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    log_dir: PathBuf,

    /// Seconds between task status queries
    #[arg(long, global = true, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Maximum number of task status queries
    #[arg(long, global = true, value_name = "N")]
    poll_max_attempts: Option<u32>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show what would happen without making changes
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile assets declared in the manifest
    Assets,

    /// Upload certificate bindings declared in the manifest
    Certificates,

    /// Parse and validate a manifest without contacting the platform
    Validate {
        /// Kind of manifest
        #[arg(long, default_value = "assets")]
        kind: ManifestKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ManifestKind {
    Assets,
    Certificates,
}

impl From<ManifestKind> for RunKind {
    fn from(kind: ManifestKind) -> Self {
        match kind {
            ManifestKind::Assets => RunKind::Assets,
            ManifestKind::Certificates => RunKind::Certificates,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // The local offset can only be read while the process is single-threaded
    let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

    // Create runtime for async operations
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run_command(cli, started));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: Cli, started: OffsetDateTime) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Assets => cmd_run(&cli, RunKind::Assets, started).await,
        Commands::Certificates => cmd_run(&cli, RunKind::Certificates, started).await,
        Commands::Validate { kind } => cmd_validate(&cli, (*kind).into()),
    }
}

fn loader(cli: &Cli, kind: RunKind) -> ManifestLoader {
    let loader = ManifestLoader::new(kind);
    match &cli.manifest {
        Some(path) => loader.with_path(path),
        None => loader,
    }
}

fn poll_config(cli: &Cli) -> PollConfig {
    let mut builder = PollConfig::builder();
    if let Some(secs) = cli.poll_interval {
        builder = builder.interval(Duration::from_secs(secs));
    }
    if let Some(attempts) = cli.poll_max_attempts {
        builder = builder.max_attempts(attempts);
    }
    builder.build()
}

async fn cmd_run(
    cli: &Cli,
    kind: RunKind,
    started: OffsetDateTime,
) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = loader(cli, kind).load()?;
    let target = &manifest.configuration;
    tracing::info!("Profile and region loaded: {} {}", target.profile, target.region);

    let mut config = ClientConfig::from_env()?;
    config.poll = poll_config(cli);
    let credentials = Credentials::from_env()?;

    let client = ControlPlaneClient::new(config)?;
    let ctx = RunContext::establish(client, &credentials, &target.profile, &target.region).await?;

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupted, stopping after the current step (Ctrl-C again to abort)");
        on_interrupt.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Aborted");
            std::process::exit(130);
        }
    });

    let run_log = if cli.dry_run {
        RunLog::disabled()
    } else {
        RunLog::open_at(&cli.log_dir, kind, started)
    };
    if let Some(path) = run_log.path() {
        tracing::info!("Writing run log to {}", path.display());
    }

    if cli.dry_run {
        println!("DRY RUN: no changes will be made");
    }

    let reconciler = Reconciler::new(&ctx, &run_log)
        .with_cancel(cancel)
        .with_dry_run(cli.dry_run);

    let summary = match kind {
        RunKind::Assets => reconciler.reconcile_assets(&manifest.assets).await?,
        RunKind::Certificates => reconciler.upload_certificates(&manifest.urls).await?,
    };

    print_summary(&summary);
    Ok(())
}

fn cmd_validate(cli: &Cli, kind: RunKind) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = loader(cli, kind).load()?;

    println!("Manifest is valid");
    println!("  Profile: {}", manifest.configuration.profile);
    println!("  Region: {}", manifest.configuration.region);
    match kind {
        RunKind::Assets => println!("  Assets: {}", manifest.assets.len()),
        RunKind::Certificates => {
            println!("  Certificates: {}", manifest.urls.len());
            for entry in &manifest.urls {
                for path in [&entry.cert_pem, &entry.cert_key] {
                    if !path.exists() {
                        println!("  Warning: {} does not exist", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Run complete: {}", summary);
    if summary.has_failures() {
        println!("Some resources failed; see the run log for details.");
    }
}
