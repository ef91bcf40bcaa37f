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

//! Publish and enforce with rollback.
//!
//! The control plane batches every staged mutation platform-wide. A batch
//! is published (validated) first; an invalid batch is discarded as a whole,
//! a valid one is enforced and the resulting task awaited.
//!
//! ```text
//! Staged -> Published(valid)   -> Enforced
//!        -> Published(invalid) -> Discarded
//! ```

use tracing::{error, info, warn};

use crate::context::RunContext;
use crate::error::Result;
use crate::operations::policy;
use crate::poller::{CancelSignal, TaskPoller};
use crate::types::Task;

/// How a publish and enforce cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Changes were valid and enforced.
    Enforced {
        /// Terminal enforcement task, when the platform started one.
        task: Option<Task>,
    },

    /// Changes were invalid and a discard was issued.
    RolledBack {
        /// Validation errors reported by publish.
        errors: Vec<String>,
        /// Whether the discard call itself succeeded.
        discarded: bool,
    },
}

impl PublishOutcome {
    /// True when changes were enforced.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Enforced { .. })
    }

    /// Reason text for a rolled-back cycle.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Enforced { .. } => None,
            Self::RolledBack { errors, .. } if errors.is_empty() => {
                Some("publish rejected the pending changes".to_string())
            }
            Self::RolledBack { errors, .. } => Some(format!("publish rejected: {}", errors.join("; "))),
        }
    }
}

/// Drives publish, enforce and task completion for a run.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    poller: TaskPoller,
}

impl Orchestrator {
    /// Create an orchestrator waiting on tasks with `poller`.
    pub fn new(poller: TaskPoller) -> Self {
        Self { poller }
    }

    /// Create an orchestrator using the run's polling bounds.
    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(TaskPoller::from_context(ctx))
    }

    /// Publish staged changes and enforce them, or discard them if invalid.
    ///
    /// Enforce is never called for an invalid publish. When enforce starts
    /// a task, this waits for it to leave `InProgress`; a task that ends in
    /// `Failed` is logged but still reported as [`PublishOutcome::Enforced`].
    ///
    /// # Errors
    ///
    /// Fails when the publish or enforce call fails, or when the wait for
    /// the enforcement task times out or is cancelled.
    pub async fn publish_and_enforce(
        &self,
        ctx: &RunContext,
        cancel: &CancelSignal,
    ) -> Result<PublishOutcome> {
        let published = policy::publish(ctx).await?;

        for warning in &published.warnings {
            warn!("Publish warning: {}", warning.message);
        }

        if !published.is_valid {
            let errors = published.error_messages();
            error!("Publish rejected the pending changes: {:?}", errors);

            let discarded = match policy::discard(ctx).await {
                Ok(true) => {
                    info!("Pending changes discarded");
                    true
                }
                Ok(false) => {
                    error!("Discard of pending changes was not acknowledged");
                    false
                }
                Err(e) => {
                    error!("Failed to discard pending changes: {}", e);
                    false
                }
            };

            return Ok(PublishOutcome::RolledBack { errors, discarded });
        }

        info!("Changes published");

        let Some(task) = policy::enforce(ctx).await? else {
            info!("Policy enforced");
            return Ok(PublishOutcome::Enforced { task: None });
        };

        info!("Policy enforcement started, task {}", task.id);
        let task = self.poller.await_completion(ctx, &task.id, cancel).await?;

        if task.status.is_failure() {
            warn!(
                "Enforcement task {} failed: {}",
                task.id,
                task.message.as_deref().unwrap_or("no message")
            );
        } else {
            info!("Policy enforced");
        }

        Ok(PublishOutcome::Enforced { task: Some(task) })
    }
}
