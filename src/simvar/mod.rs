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


//! Simulator live variables.
//!
//! A live variable is addressed by an identifier plus a unit string such as
//! `"Bool"`, `"number"` or `"feet"`. Units are tags only; no conversion is
//! performed. Reads are asynchronous polls and writes are fire-and-forget.

mod local;
mod poll;

pub use local::{LocalVariableSource, VariableWrite};
pub use poll::VariableStream;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Untyped scalar read from or written to a live variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SimValue {
    Number(f64),
    Text(String),
}

impl SimValue {
    /// Convert a property string into a value for `unit`.
    ///
    /// Text units pass the string through. Every other unit needs a number;
    /// `"true"`/`"false"` are accepted for boolean units. Returns `None` when
    /// the string cannot be represented.
    #[must_use]
    pub fn from_property(unit: &str, value: &str) -> Option<Self> {
        if is_text_unit(unit) {
            return Some(Self::Text(value.to_string()));
        }

        let trimmed = value.trim();
        if let Ok(number) = trimmed.parse::<f64>() {
            return number.is_finite().then_some(Self::Number(number));
        }

        if unit.eq_ignore_ascii_case("bool") {
            match trimmed.to_ascii_lowercase().as_str() {
                "true" => return Some(Self::Number(1.0)),
                "false" => return Some(Self::Number(0.0)),
                _ => {}
            }
        }

        None
    }

    /// Render as a property string. Whole numbers drop the fractional part.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "only whole numbers within i64 range are cast"
    )]
    pub fn to_property_string(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for SimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_property_string())
    }
}

/// Whether `unit` carries text rather than a number.
#[must_use]
pub fn is_text_unit(unit: &str) -> bool {
    unit.eq_ignore_ascii_case("string")
}

/// Access to the simulator's variable space.
#[async_trait]
pub trait LiveVariableSource: Send + Sync + fmt::Debug {
    /// Read the current value once. `None` when the variable is unavailable.
    async fn read(&self, variable_id: &str, unit: &str) -> Option<SimValue>;

    /// Write without waiting for acknowledgement.
    fn write(&self, variable_id: &str, unit: &str, value: SimValue);
}

/// Shared handle to the process-wide variable source.
pub type SharedVariableSource = Arc<dyn LiveVariableSource>;

/// Poll `variable_id` every `poll_interval` until the returned stream is dropped.
#[must_use]
pub fn subscribe(
    source: SharedVariableSource,
    variable_id: &str,
    unit: &str,
    poll_interval: Duration,
) -> VariableStream {
    VariableStream::spawn(source, variable_id, unit, poll_interval)
}
