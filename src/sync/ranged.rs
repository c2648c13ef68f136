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


use log::debug;

use super::PropertySyncBridge;
use crate::error::SyncError;

/// Numeric setting with a transient display value.
///
/// Every keystroke updates what the field shows. The committed value only
/// changes when the text starts with an integer inside `[min, max]`.
#[derive(Debug, Clone)]
pub struct RangedSetting {
    key: String,
    min: i64,
    max: i64,
    display: String,
}

impl RangedSetting {
    /// Bind to a registered property. The display starts at the committed value.
    pub fn new(
        bridge: &PropertySyncBridge,
        key: impl Into<String>,
        min: i64,
        max: i64,
    ) -> Result<Self, SyncError> {
        let key = key.into();
        let display = bridge.get(&key)?;
        Ok(Self {
            key,
            min,
            max,
            display,
        })
    }

    /// Handle text typed into the field.
    ///
    /// Returns `OutOfRange` when the text was shown but not committed.
    pub fn input(&mut self, bridge: &PropertySyncBridge, text: &str) -> Result<(), SyncError> {
        self.display = text.to_string();

        match self.accepts(text) {
            Some(value) => bridge.set(&self.key, &value.to_string()),
            None => {
                debug!("{}: '{}' not committed", self.key, text);
                Err(SyncError::OutOfRange {
                    key: self.key.clone(),
                    value: text.to_string(),
                    min: self.min,
                    max: self.max,
                })
            }
        }
    }

    /// The leading integer of `text` if it lies within range.
    #[must_use]
    pub fn accepts(&self, text: &str) -> Option<i64> {
        parse_leading_integer(text).filter(|value| (self.min..=self.max).contains(value))
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn display_value(&self) -> &str {
        &self.display
    }

    pub fn committed_value(&self, bridge: &PropertySyncBridge) -> Result<String, SyncError> {
        bridge.get(&self.key)
    }

    #[must_use]
    pub const fn range(&self) -> (i64, i64) {
        (self.min, self.max)
    }
}

/// Integer at the start of `text` after leading whitespace, with optional sign.
/// Trailing characters are ignored.
#[must_use]
pub fn parse_leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['+', '-']));
    let digits_len = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    text[..digits_start + digits_len].parse().ok()
}
