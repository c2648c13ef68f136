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


//! Dashboard data: the flight plan, weather at both ends of the flight and
//! the live aircraft state.

mod dispatch_feed;
mod flight;
mod weather_card;

pub use dispatch_feed::DispatchFeed;
pub use flight::{CurrentFlight, CurrentFlightMonitor};
pub use weather_card::{CardSide, WeatherCard, WeatherSummary};

use std::sync::Arc;

use crate::config::AppConfig;
use crate::feeds::{DispatchFetcher, FeedTransport, WeatherFetcher};
use crate::normalize::DispatchRecord;
use crate::status::SharedPanelStatus;
use crate::sync::PropertySyncBridge;

/// Flight plan plus origin and destination weather.
#[derive(Debug)]
pub struct Dashboard {
    dispatch: DispatchFeed,
    origin: WeatherCard,
    destination: WeatherCard,
}

impl Dashboard {
    pub fn new(
        bridge: PropertySyncBridge,
        transport: Arc<dyn FeedTransport>,
        config: &AppConfig,
        status: SharedPanelStatus,
    ) -> Self {
        let weather = WeatherFetcher::new(Arc::clone(&transport), config.metar_url.clone());
        let card = |side| {
            WeatherCard::new(side, weather.clone(), config.weather_source.clone())
                .with_status(Arc::clone(&status))
        };

        Self {
            origin: card(CardSide::Origin),
            destination: card(CardSide::Destination),
            dispatch: DispatchFeed::new(
                DispatchFetcher::new(transport, config.simbrief_url.clone()),
                bridge,
                Arc::clone(&status),
            ),
        }
    }

    /// Refresh the flight plan, then rebind both weather cards to its airports.
    ///
    /// Returns whether a new plan was applied. Weather is left alone when the
    /// plan did not change.
    pub async fn refresh(&self) -> bool {
        let Some(record) = self.dispatch.refresh().await else {
            return false;
        };

        tokio::join!(
            self.origin.bind(&record.origin.icao),
            self.destination.bind(&record.destination.icao),
        );
        true
    }

    #[must_use]
    pub fn dispatch(&self) -> DispatchRecord {
        self.dispatch.record()
    }

    #[must_use]
    pub const fn dispatch_feed(&self) -> &DispatchFeed {
        &self.dispatch
    }

    #[must_use]
    pub const fn card(&self, side: CardSide) -> &WeatherCard {
        match side {
            CardSide::Origin => &self.origin,
            CardSide::Destination => &self.destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::FakeTransport;
    use crate::persistence::MemoryPropertyStore;
    use crate::settings::{self, SIMBRIEF_USERNAME};
    use crate::simvar::LocalVariableSource;
    use crate::status::PanelStatus;
    use std::time::Duration;

    const SIMBRIEF: &str = "https://dispatch.test/api";
    const METAR: &str = "https://metar.test/metar";

    fn dashboard(transport: Arc<FakeTransport>) -> (Dashboard, PropertySyncBridge) {
        let bridge = PropertySyncBridge::new(
            Arc::new(MemoryPropertyStore::new()),
            Arc::new(LocalVariableSource::new()),
        );
        settings::register_all(&bridge, Duration::from_millis(500));

        let config = AppConfig {
            simbrief_url: SIMBRIEF.to_string(),
            metar_url: METAR.to_string(),
            ..AppConfig::default()
        };
        let dashboard = Dashboard::new(bridge.clone(), transport, &config, PanelStatus::shared());
        (dashboard, bridge)
    }

    #[tokio::test]
    async fn test_refresh_binds_cards_to_plan() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(
            SIMBRIEF,
            r#"{"origin":{"icao_code":"LFPG"},"destination":{"icao_code":"EGLL"}}"#,
        );
        transport.respond(
            &format!("{METAR}/LFPG"),
            r#"{"metar":"LFPG 201200Z 27004KT CAVOK 18/08 Q1015"}"#,
        );
        transport.respond(
            &format!("{METAR}/EGLL"),
            r#"{"metar":"EGLL 201150Z 24008KT 9999 OVC020 12/10 Q1008"}"#,
        );
        let (dashboard, bridge) = dashboard(transport.clone());
        bridge.set(SIMBRIEF_USERNAME, "jdoe").unwrap();

        assert!(dashboard.refresh().await);

        assert_eq!(dashboard.dispatch().origin.icao, "LFPG");
        let origin = dashboard.card(CardSide::Origin);
        let destination = dashboard.card(CardSide::Destination);
        assert_eq!(origin.bound_icao(), "LFPG");
        assert_eq!(destination.bound_icao(), "EGLL");
        assert_eq!(origin.record().flight_category, "VFR");
        assert_eq!(destination.record().flight_category, "MVFR");

        let weather_requests = transport
            .requests()
            .iter()
            .filter(|r| r.url.starts_with(METAR))
            .all(|r| r.query == vec![("source".to_string(), "vatsim".to_string())]);
        assert!(weather_requests);
    }

    #[tokio::test]
    async fn test_refresh_without_username_changes_nothing() {
        let transport = Arc::new(FakeTransport::default());
        let (dashboard, _) = dashboard(transport.clone());

        assert!(!dashboard.refresh().await);
        assert!(dashboard.dispatch().is_placeholder());
        assert!(dashboard.card(CardSide::Origin).record().is_placeholder());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_plan_clears_weather() {
        let transport = Arc::new(FakeTransport::default());
        transport.fail(SIMBRIEF, 500);
        let (dashboard, bridge) = dashboard(transport.clone());
        bridge.set(SIMBRIEF_USERNAME, "jdoe").unwrap();

        assert!(dashboard.refresh().await);
        assert!(dashboard.dispatch().is_placeholder());
        assert!(dashboard.card(CardSide::Destination).record().is_placeholder());

        // The placeholder has no airports, so no weather is requested
        assert_eq!(transport.requests().len(), 1);
    }
}
