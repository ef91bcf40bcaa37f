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

//! Asynchronous task polling.
//!
//! Enforcement returns a task handle that the platform completes in the
//! background. [`TaskPoller`] queries it until it leaves `InProgress`,
//! bounded by an attempt count and an optional deadline, and stops early
//! when the caller's [`CancelSignal`] fires.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::context::RunContext;
use crate::error::{Result, WafError};
use crate::operations::tasks;
use crate::types::Task;

/// Cooperative cancellation shared between a run and its waits.
///
/// Clones observe the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    /// Create a signal that has not fired.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve when the signal fires.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Polls a task until it reaches a terminal status.
#[derive(Debug, Clone)]
pub struct TaskPoller {
    config: PollConfig,
}

impl TaskPoller {
    /// Create a poller with the given bounds.
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Create a poller using the bounds configured on the run's client.
    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(ctx.client().config().poll.clone())
    }

    /// Polling bounds.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Wait for task `task_id` to leave `InProgress`.
    ///
    /// The first query is issued immediately, later ones every
    /// `interval`. The returned task may have failed; the terminal status
    /// is not interpreted here.
    ///
    /// # Errors
    ///
    /// - [`WafError::TaskTimedOut`] after `max_attempts` queries, or when the
    ///   next query would start past the deadline
    /// - [`WafError::Cancelled`] when `cancel` fires
    /// - any error of the underlying task query
    pub async fn await_completion(
        &self,
        ctx: &RunContext,
        task_id: &str,
        cancel: &CancelSignal,
    ) -> Result<Task> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(interrupted(task_id));
            }

            let task = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(interrupted(task_id)),
                task = tasks::get_task(ctx, task_id) => task?,
            };
            attempts += 1;

            debug!("Task {} status {} (poll {})", task_id, task.status, attempts);

            if task.status.is_terminal() {
                info!("Task {} finished with status {}", task_id, task.status);
                return Ok(task);
            }

            if attempts >= self.config.max_attempts {
                warn!("Task {} still in progress after {} polls", task_id, attempts);
                return Err(WafError::task_timed_out(task_id, attempts));
            }

            if let Some(deadline) = self.config.deadline {
                if started.elapsed() + self.config.interval > deadline {
                    warn!(
                        "Task {} still in progress after {:?}",
                        task_id,
                        started.elapsed()
                    );
                    return Err(WafError::task_timed_out(task_id, attempts));
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(interrupted(task_id)),
                _ = sleep(self.config.interval) => {}
            }
        }
    }
}

fn interrupted(task_id: &str) -> WafError {
    WafError::cancelled(format!("wait for task {} interrupted", task_id))
}
