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

//! Asynchronous platform task handle.

use serde::Deserialize;

/// Status of a long-running platform task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    /// Still running.
    InProgress,
    /// Finished successfully.
    Succeeded,
    /// Finished successfully (alternate spelling used by some task types).
    Completed,
    /// Finished with an error.
    Failed,
    /// Any status this client does not know about. Terminal.
    Other(String),
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "InProgress" => Self::InProgress,
            "Succeeded" => Self::Succeeded,
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl TaskStatus {
    /// Any status other than `InProgress` is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Returns true for terminal statuses that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Status name as reported by the platform.
    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to an asynchronous operation created by an enforce call.
///
/// Mutated only by the platform and observed by polling; once terminal the
/// client has no further use for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task id.
    pub id: String,

    /// Current status.
    pub status: TaskStatus,

    /// Start timestamp.
    #[serde(default)]
    pub start_time: Option<String>,

    /// End timestamp, once terminal.
    #[serde(default)]
    pub end_time: Option<String>,

    /// Status message.
    #[serde(default)]
    pub message: Option<String>,

    /// Error code for failed tasks.
    #[serde(default)]
    pub error_code: Option<String>,

    /// Reference id.
    #[serde(default)]
    pub reference_id: Option<String>,

    /// Tenant id.
    #[serde(default)]
    pub tenant_id: Option<String>,
}
