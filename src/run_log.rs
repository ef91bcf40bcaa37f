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

//! Append-only run log.
//!
//! Every processed resource gets one line in a UTF-8 text file named after
//! the run-start time, e.g. `2025-03-14-09-26_deploy-assets_output.log`.
//! Writing is best-effort: a log that cannot be opened or written is
//! reported with `warn!` and the run carries on.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::warn;

use crate::manifest::RunKind;

/// Run log for one invocation.
#[derive(Debug)]
pub struct RunLog {
    path: Option<PathBuf>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl RunLog {
    /// Open a timestamped log for `kind` inside `dir`, using the current
    /// local time (UTC when the local offset is unknown).
    ///
    /// On Unix the local offset cannot be read once other threads exist.
    /// Multi-threaded callers should capture the time at startup and use
    /// [`open_at`](Self::open_at).
    pub fn open(dir: impl AsRef<Path>, kind: RunKind) -> Self {
        let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::open_at(dir, kind, started)
    }

    /// Open a log named after `started`.
    pub fn open_at(dir: impl AsRef<Path>, kind: RunKind, started: OffsetDateTime) -> Self {
        let path = dir.as_ref().join(file_name(kind, started));
        Self::open_path(path)
    }

    /// Open (or append to) the log at `path`.
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let file = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

        match file {
            Ok(file) => Self {
                path: Some(path),
                writer: Mutex::new(Some(BufWriter::new(file))),
            },
            Err(e) => {
                warn!("Cannot open run log {}: {}", path.display(), e);
                Self {
                    path: Some(path),
                    writer: Mutex::new(None),
                }
            }
        }
    }

    /// A log that discards every line.
    pub fn disabled() -> Self {
        Self {
            path: None,
            writer: Mutex::new(None),
        }
    }

    /// Path of the log file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one line. Failures are logged and otherwise ignored.
    pub fn record(&self, line: &str) {
        let Ok(mut guard) = self.writer.lock() else {
            warn!("Run log lock poisoned, dropping line: {}", line);
            return;
        };

        let Some(writer) = guard.as_mut() else {
            return;
        };

        let result = writeln!(writer, "{}", line).and_then(|_| writer.flush());
        if let Err(e) = result {
            warn!("Failed to write run log: {}", e);
        }
    }
}

/// Log file name for a run of `kind` started at `started`.
pub fn file_name(kind: RunKind, started: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]-[hour]-[minute]");
    let stamp = started
        .format(&format)
        .unwrap_or_else(|_| started.unix_timestamp().to_string());
    format!("{}_{}_output.log", stamp, kind.log_tag())
}
