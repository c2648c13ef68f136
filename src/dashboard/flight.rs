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
use std::time::Duration;

use log::debug;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::simvar::{SharedVariableSource, SimValue, VariableStream};

/// Live snapshot of the aircraft being flown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentFlight {
    pub flight_number: String,
    pub aircraft_title: String,
    pub altitude_ft: f64,
    pub heading_deg: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy)]
enum FlightField {
    FlightNumber,
    AircraftTitle,
    Altitude,
    Heading,
    Latitude,
    Longitude,
}

impl FlightField {
    fn apply(self, flight: &mut CurrentFlight, value: &SimValue) -> bool {
        let number = || value.as_f64().unwrap_or_default();
        match self {
            Self::FlightNumber => replace(&mut flight.flight_number, value.to_property_string()),
            Self::AircraftTitle => replace(&mut flight.aircraft_title, value.to_property_string()),
            Self::Altitude => replace(&mut flight.altitude_ft, number()),
            Self::Heading => replace(&mut flight.heading_deg, number()),
            Self::Latitude => replace(&mut flight.latitude, number()),
            Self::Longitude => replace(&mut flight.longitude, number()),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

const FLIGHT_VARIABLES: [(&str, &str, u64, FlightField); 6] = [
    ("ATC FLIGHT NUMBER", "String", 1000, FlightField::FlightNumber),
    ("TITLE", "String", 1000, FlightField::AircraftTitle),
    ("PLANE ALTITUDE", "feet", 500, FlightField::Altitude),
    ("PLANE HEADING DEGREES TRUE", "degrees", 500, FlightField::Heading),
    ("PLANE LATITUDE", "degree latitude", 500, FlightField::Latitude),
    ("PLANE LONGITUDE", "degree longitude", 500, FlightField::Longitude),
];

/// Follows the simulator's flight variables for the dashboard header.
pub struct CurrentFlightMonitor {
    flight_tx: Arc<watch::Sender<CurrentFlight>>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for CurrentFlightMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentFlightMonitor")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl CurrentFlightMonitor {
    /// Start one poll per variable. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(source: &SharedVariableSource) -> Self {
        let (flight_tx, _) = watch::channel(CurrentFlight::default());
        let flight_tx = Arc::new(flight_tx);
        let cancel_token = CancellationToken::new();

        for (variable_id, unit, interval_ms, field) in FLIGHT_VARIABLES {
            let mut stream = VariableStream::spawn(
                Arc::clone(source),
                variable_id,
                unit,
                Duration::from_millis(interval_ms),
            );
            let flight_tx = Arc::clone(&flight_tx);
            let cancel_token = cancel_token.clone();

            tokio::spawn(async move {
                loop {
                    let value = tokio::select! {
                        biased;
                        () = cancel_token.cancelled() => break,
                        value = stream.recv() => value,
                    };
                    let Some(value) = value else { break };
                    flight_tx.send_if_modified(|flight| field.apply(flight, &value));
                }
                debug!("Stopped monitoring {}", variable_id);
            });
        }

        Self {
            flight_tx,
            cancel_token,
        }
    }

    #[must_use]
    pub fn current(&self) -> CurrentFlight {
        self.flight_tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CurrentFlight> {
        self.flight_tx.subscribe()
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for CurrentFlightMonitor {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
