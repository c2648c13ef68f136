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


use std::sync::Arc;

use log::debug;
use metar::MetarParser;

use super::FeedTransport;
use crate::error::FeedError;
use crate::normalize::{try_normalize_weather, WeatherRecord};

/// Identifier shown when no airport is known.
pub const NO_AIRPORT: &str = "----";

/// Check and canonicalize an aerodrome identifier.
///
/// Exactly four ASCII letters or digits, excluding the no-airport sentinel.
pub fn validate_icao(identifier: &str) -> Result<String, FeedError> {
    let valid = identifier != NO_AIRPORT
        && identifier.len() == 4
        && identifier.bytes().all(|b| b.is_ascii_alphanumeric());
    if !valid {
        return Err(FeedError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(identifier.to_ascii_uppercase())
}

/// Fetches the current METAR for an aerodrome.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    transport: Arc<dyn FeedTransport>,
    url: String,
    parser: MetarParser,
}

impl WeatherFetcher {
    pub fn new(transport: Arc<dyn FeedTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            parser: MetarParser::new(),
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: MetarParser) -> Self {
        self.parser = parser;
        self
    }

    /// Fetch and normalize the observation for `identifier` from `source`.
    ///
    /// Invalid identifiers fail before any request is made.
    pub async fn fetch(&self, identifier: &str, source: &str) -> Result<WeatherRecord, FeedError> {
        let icao = validate_icao(identifier)?;
        let url = format!("{}/{}", self.url.trim_end_matches('/'), icao);

        debug!("Fetching METAR for {} from {}", icao, source);
        let body = self.transport.get_text(&url, &[("source", source)]).await?;

        try_normalize_weather(&body, &self.parser)
    }
}
