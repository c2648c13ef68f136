// Copyright 2025 Chris Custine
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


//! Error types for the panel data layer.
//!
//! Each layer has its own error enum. None of these are fatal to the panel:
//! feed errors end in a placeholder record, sync errors reject a single write,
//! and store errors are logged while the in-memory copy stays authoritative.

use thiserror::Error;

/// Errors from the external feed fetchers.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("malformed provider payload: {0}")]
    Payload(String),
}

/// Errors from the property sync bridge.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("value '{value}' is not an allowed choice for {key}")]
    InvalidChoice { key: String, value: String },

    #[error("value '{value}' for {key} is outside [{min}, {max}]")]
    OutOfRange {
        key: String,
        value: String,
        min: i64,
        max: i64,
    },
}

/// Errors from the on-disk property store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store file: {0}")]
    Format(#[from] serde_json::Error),
}
