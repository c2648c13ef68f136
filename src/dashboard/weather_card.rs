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


use std::sync::{Mutex, PoisonError};

use log::{debug, warn};
use tokio::sync::watch;

use crate::error::FeedError;
use crate::feeds::{LatestSlot, WeatherFetcher};
use crate::normalize::WeatherRecord;
use crate::status::{lock_status, PanelStatus, SharedPanelStatus};

const NOT_AVAILABLE: &str = "N/A";

/// Which end of the flight a card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardSide {
    Origin,
    Destination,
}

impl CardSide {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Origin => "Origin",
            Self::Destination => "Destination",
        }
    }

    /// Destination cards are laid out on the right.
    #[must_use]
    pub const fn is_right_aligned(&self) -> bool {
        matches!(self, Self::Destination)
    }

    const fn feed_name(&self) -> &'static str {
        match self {
            Self::Origin => "weather-origin",
            Self::Destination => "weather-destination",
        }
    }
}

/// Display strings for a card, `N/A` when no observation is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSummary {
    pub station: String,
    pub barometer: String,
    pub wind: String,
    pub temperature: String,
    pub dewpoint: String,
    pub flight_category: String,
}

impl WeatherSummary {
    #[must_use]
    pub fn from_record(record: &WeatherRecord) -> Self {
        if record.is_placeholder() {
            return Self {
                station: String::new(),
                barometer: NOT_AVAILABLE.to_string(),
                wind: NOT_AVAILABLE.to_string(),
                temperature: NOT_AVAILABLE.to_string(),
                dewpoint: NOT_AVAILABLE.to_string(),
                flight_category: String::new(),
            };
        }

        Self {
            station: record.station.clone(),
            barometer: format!("{:.0} mb", record.barometer.mb),
            wind: format!(
                "{:.0}° / {:.0} kts",
                record.wind.degrees, record.wind.speed_kts
            ),
            temperature: format!("{:.0} °C", record.temperature.celsius),
            dewpoint: format!("{:.0} °C", record.dewpoint.celsius),
            flight_category: record.flight_category.clone(),
        }
    }
}

/// Weather for one airport of the current flight.
///
/// The card is bound to the airport from the dispatch record but the user
/// can type another code. Only the most recently requested observation is
/// ever shown.
#[derive(Debug)]
pub struct WeatherCard {
    side: CardSide,
    fetcher: WeatherFetcher,
    source: String,
    bound_icao: Mutex<String>,
    slot: LatestSlot<WeatherRecord>,
    status: Option<SharedPanelStatus>,
}

impl WeatherCard {
    pub fn new(side: CardSide, fetcher: WeatherFetcher, source: impl Into<String>) -> Self {
        Self {
            side,
            fetcher,
            source: source.into(),
            bound_icao: Mutex::new(String::new()),
            slot: LatestSlot::new(WeatherRecord::placeholder()),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: SharedPanelStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn side(&self) -> CardSide {
        self.side
    }

    #[must_use]
    pub fn bound_icao(&self) -> String {
        self.bound_icao
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bind to the flight's airport and show its weather.
    pub async fn bind(&self, icao: &str) -> bool {
        icao.clone_into(&mut self.bound_icao.lock().unwrap_or_else(PoisonError::into_inner));
        self.refresh(icao).await
    }

    /// Text typed into the card's airport field.
    ///
    /// A complete four-character code is fetched. Clearing the field goes
    /// back to the bound airport. Anything else waits for more input.
    pub async fn input(&self, text: &str) -> bool {
        match text.chars().count() {
            4 => self.refresh(text).await,
            0 => {
                let bound = self.bound_icao();
                self.refresh(&bound).await
            }
            _ => false,
        }
    }

    /// Fetch `identifier` and show the result unless a newer request started
    /// in the meantime. Returns whether this request's result was applied.
    pub async fn refresh(&self, identifier: &str) -> bool {
        let ticket = self.slot.begin();
        let feed = self.side.feed_name();

        let record = match self.fetcher.fetch(identifier, &self.source).await {
            Ok(record) => {
                self.with_status_mut(|s| s.record_success(feed));
                record
            }
            Err(FeedError::InvalidIdentifier(id)) => {
                debug!("{} card: no weather for '{}'", self.side.label(), id);
                WeatherRecord::placeholder()
            }
            Err(e) => {
                warn!("{} weather fetch for {} failed: {}", self.side.label(), identifier, e);
                self.with_status_mut(|s| s.record_failure(feed, &e.to_string()));
                WeatherRecord::placeholder()
            }
        };

        let applied = self.slot.apply(ticket, record);
        if !applied {
            self.with_status_mut(|s| s.record_stale(feed));
        }
        applied
    }

    #[must_use]
    pub fn record(&self) -> WeatherRecord {
        self.slot.get()
    }

    #[must_use]
    pub fn summary(&self) -> WeatherSummary {
        WeatherSummary::from_record(&self.slot.get())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WeatherRecord> {
        self.slot.subscribe()
    }

    fn with_status_mut(&self, f: impl FnOnce(&mut PanelStatus)) {
        if let Some(status) = &self.status {
            f(&mut lock_status(status));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::FakeTransport;
    use crate::status::FetchState;
    use std::sync::Arc;
    use std::time::Duration;

    const URL: &str = "https://metar.test/metar";

    fn metar_body(icao: &str) -> String {
        format!(r#"{{"icao":"{icao}","source":"vatsim","metar":"{icao} 201150Z 24008KT 9999 FEW030 12/10 Q1008"}}"#)
    }

    fn card(transport: Arc<FakeTransport>) -> WeatherCard {
        WeatherCard::new(CardSide::Origin, WeatherFetcher::new(transport, URL), "vatsim")
    }

    #[tokio::test]
    async fn test_bind_fetches_bound_airport() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(&format!("{URL}/LFPG"), &metar_body("LFPG"));
        let card = card(transport);

        assert!(card.bind("LFPG").await);
        assert_eq!(card.bound_icao(), "LFPG");
        assert_eq!(card.record().station, "LFPG");

        let summary = card.summary();
        assert_eq!(summary.barometer, "1008 mb");
        assert_eq!(summary.wind, "240° / 8 kts");
        assert_eq!(summary.temperature, "12 °C");
    }

    #[tokio::test]
    async fn test_input_rules() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(&format!("{URL}/LFPG"), &metar_body("LFPG"));
        transport.respond(&format!("{URL}/EGLL"), &metar_body("EGLL"));
        let card = card(transport.clone());
        card.bind("LFPG").await;

        // Partial codes do nothing
        assert!(!card.input("EG").await);
        assert_eq!(transport.requests().len(), 1);

        assert!(card.input("egll").await);
        assert_eq!(card.record().station, "EGLL");

        // Clearing the field returns to the bound airport
        assert!(card.input("").await);
        assert_eq!(card.record().station, "LFPG");
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_shows_placeholder() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(&format!("{URL}/LFPG"), &metar_body("LFPG"));
        transport.fail(&format!("{URL}/EGLL"), 500);
        let status = PanelStatus::shared();
        let card = card(transport).with_status(status.clone());

        card.bind("LFPG").await;
        card.input("EGLL").await;

        assert!(card.record().is_placeholder());
        assert_eq!(card.summary().barometer, "N/A");
        let status = status.lock().unwrap();
        let feed = status.feed("weather-origin").unwrap();
        assert_eq!(feed.state, FetchState::Failed);
        assert_eq!(feed.last_error.as_deref(), Some("HTTP error: 500"));
    }

    #[tokio::test]
    async fn test_sentinel_airport_makes_no_request() {
        let transport = Arc::new(FakeTransport::default());
        let card = card(transport.clone());

        card.bind("----").await;
        card.bind("").await;

        assert!(card.record().is_placeholder());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_dropped() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond_after(&format!("{URL}/LFPG"), Duration::from_millis(800), &metar_body("LFPG"));
        transport.respond_after(&format!("{URL}/EGLL"), Duration::from_millis(100), &metar_body("EGLL"));
        let status = PanelStatus::shared();
        let card = card(transport).with_status(status.clone());
        let mut record_rx = card.subscribe();

        let slow = card.input("LFPG");
        let fast = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            card.input("EGLL").await
        };
        let (slow_applied, fast_applied) = tokio::join!(slow, fast);

        assert!(!slow_applied);
        assert!(fast_applied);
        assert_eq!(card.record().station, "EGLL");
        assert_eq!(record_rx.borrow_and_update().station, "EGLL");
        assert_eq!(status.lock().unwrap().feed("weather-origin").unwrap().stale_count, 1);
    }

    #[test]
    fn test_side_labels_are_distinct() {
        assert_ne!(CardSide::Origin.label(), CardSide::Destination.label());
        assert!(CardSide::Destination.is_right_aligned());
        assert!(!CardSide::Origin.is_right_aligned());
    }
}
