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

//! Control-plane operation implementations.
//!
//! Each sub-module owns the GraphQL documents for one area of the schema,
//! the variable builders for them and the decoding of their responses.
//! Callers go through [`crate::RunContext`] or the reconciliation driver.

pub mod assets;
pub mod certificates;
pub mod policy;
pub mod profiles;
pub mod tasks;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, WafError};

/// Decode the top-level field `name` of an operation's `data` object.
///
/// A missing or null field is reported as [`WafError::MissingData`].
pub(crate) fn field<T: DeserializeOwned>(data: &Value, operation: &str, name: &str) -> Result<T> {
    match data.get(name) {
        Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
        _ => Err(WafError::missing_data(operation, name)),
    }
}

/// Like [`field`], but a null or missing field decodes to `None`.
pub(crate) fn optional_field<T: DeserializeOwned>(data: &Value, name: &str) -> Result<Option<T>> {
    match data.get(name) {
        Some(value) if !value.is_null() => Ok(Some(serde_json::from_value(value.clone())?)),
        _ => Ok(None),
    }
}
