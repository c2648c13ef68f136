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

//! METAR report parser.
//!
//! Report format:
//! ```text
//! [METAR|SPECI] <station> <DDHHMMZ> [AUTO|COR] <wind> [<variation>] <visibility>
//!     [<rvr>...] [<weather>...] [<clouds>...] <temp>/<dewpoint> <altimeter> [RMK ...]
//! ```
//!
//! Groups are decoded in any order after the station identifier. Anything
//! the parser does not recognise is skipped, and decoding stops at remarks or
//! trend forecasts.

mod groups;

use chrono::{DateTime, Utc};
use log::debug;
use thiserror::Error;

use crate::observation::{Metar, Visibility};

/// Errors that can occur while parsing a report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty report")]
    Empty,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid station identifier: {0}")]
    InvalidStation(String),
}

/// Tokens that end the observation part of a report.
const TERMINATORS: &[&str] = &["RMK", "TEMPO", "BECMG", "NOSIG"];

/// Parser for METAR/SPECI reports.
#[derive(Debug, Default, Clone)]
pub struct MetarParser {
    reference: Option<DateTime<Utc>>,
}

impl MetarParser {
    /// Create a parser that resolves observation days against the current time.
    #[must_use]
    pub fn new() -> Self {
        Self { reference: None }
    }

    /// Create a parser that resolves observation days against `reference`.
    #[must_use]
    pub fn with_reference(reference: DateTime<Utc>) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    /// Parse a single report.
    pub fn parse(&self, input: &str) -> Result<Metar, ParseError> {
        let parts: Vec<&str> = input
            .split_whitespace()
            .map(|p| p.trim_end_matches('='))
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut index = 0;
        if matches!(parts[0], "METAR" | "SPECI") {
            index += 1;
        }

        let station = *parts.get(index).ok_or(ParseError::MissingField("station"))?;
        if !is_station_identifier(station) {
            return Err(ParseError::InvalidStation(station.to_string()));
        }
        index += 1;

        let mut metar = Metar::new(
            parts.join(" "),
            parts.iter().map(|p| (*p).to_string()).collect(),
            station.to_string(),
        );

        let reference = self.reference.unwrap_or_else(Utc::now);
        let mut whole_miles: Option<f64> = None;

        for &token in &parts[index..] {
            if TERMINATORS.contains(&token) {
                break;
            }

            match token {
                "AUTO" => {
                    metar.automated = true;
                    continue;
                }
                "COR" | "NIL" => continue,
                "CAVOK" => {
                    metar.visibility = Some(Visibility::from_meters(10_000.0));
                    continue;
                }
                _ => {}
            }

            if metar.observed.is_none() {
                if let Some(observed) = groups::observation_time(token, reference) {
                    metar.observed = Some(observed);
                    continue;
                }
            }

            if metar.wind.is_none() {
                if let Some(wind) = groups::wind(token) {
                    metar.wind = Some(wind);
                    continue;
                }
            }

            if let Some(variation) = groups::wind_variation(token) {
                if let Some(wind) = metar.wind.as_mut() {
                    wind.variation = Some(variation);
                }
                continue;
            }

            if metar.visibility.is_none() {
                if let Some(miles) = groups::statute_miles(token) {
                    let total = whole_miles.take().unwrap_or(0.0) + miles;
                    metar.visibility = Some(Visibility::from_miles(total));
                    continue;
                }
                if let Some(visibility) = groups::metric_visibility(token) {
                    metar.visibility = Some(visibility);
                    continue;
                }
                if let Some(miles) = groups::whole_miles(token) {
                    whole_miles = Some(miles);
                    continue;
                }
            }

            if groups::is_runway_visual_range(token) {
                continue;
            }

            if let Some(cloud) = groups::cloud(token) {
                metar.clouds.push(cloud);
                continue;
            }

            if metar.temperature.is_none() {
                if let Some((temperature, dewpoint)) = groups::temperature(token) {
                    metar.temperature = Some(temperature);
                    metar.dewpoint = dewpoint;
                    continue;
                }
            }

            if let Some(barometer) = groups::altimeter(token) {
                metar.barometer = Some(barometer);
                continue;
            }

            if let Some(conditions) = groups::weather(token) {
                metar.conditions.extend(conditions);
                continue;
            }

            debug!("Skipping unrecognised METAR group '{}' in {}", token, metar.icao);
        }

        metar.derive();
        Ok(metar)
    }
}

fn is_station_identifier(s: &str) -> bool {
    s.len() == 4
        && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && s.as_bytes()[0].is_ascii_uppercase()
}
