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


//! Flight-plan dispatch records.
//!
//! The provider nests its data in sections (`origin`, `general`, `weights`,
//! ...) and sends most numbers as strings. Each section is decoded on its
//! own so that a missing or oddly shaped section only costs its own fields.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::time::flight_time_from_eta;
use crate::error::FeedError;

/// ICAO and IATA codes of one airport.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AirportPair {
    pub icao: String,
    pub iata: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Weights {
    pub cargo: f64,
    pub est_landing_weight: f64,
    pub est_takeoff_weight: f64,
    pub est_zero_fuel_weight: f64,
    pub max_landing_weight: f64,
    pub max_takeoff_weight: f64,
    pub max_zero_fuel_weight: f64,
    pub passenger_count: f64,
    pub passenger_weight: f64,
    pub payload: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fuel {
    pub avg_fuel_flow: f64,
    pub contingency: f64,
    pub enroute_burn: f64,
    pub etops: f64,
    pub extra: f64,
    pub max_tanks: f64,
    pub min_takeoff: f64,
    pub plan_landing: f64,
    pub plan_ramp: f64,
    pub plan_takeoff: f64,
    pub reserve: f64,
    pub taxi: f64,
}

/// Planned durations in seconds, and scheduled block times.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Times {
    pub est_time_enroute: f64,
    pub contingency_fuel_time: f64,
    pub reserve_time: f64,
    pub taxi_out: f64,
    pub sched_out: String,
    pub sched_in: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AverageWind {
    pub direction: String,
    pub speed: String,
}

/// Canonical dispatch record. `Default` is the placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub airline: String,
    pub flight_number: String,
    pub aircraft_reg: String,
    pub origin: AirportPair,
    pub destination: AirportPair,
    pub alternate: AirportPair,
    pub alternate_burn: f64,
    pub distance: String,
    /// Estimated time enroute in seconds, as sent by the provider.
    pub eta_seconds: String,
    /// `HH:MM` rendering of `eta_seconds`.
    pub flight_time: String,
    pub cruise_altitude: f64,
    pub weights: Weights,
    pub fuel: Fuel,
    pub times: Times,
    pub average_wind: AverageWind,
    pub units: String,
    pub route: String,
    pub cost_index: String,
    pub loadsheet: String,
}

impl DispatchRecord {
    #[must_use]
    pub fn placeholder() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

/// Normalize a provider payload, falling back to the placeholder.
#[must_use]
pub fn normalize_dispatch(raw: &str) -> DispatchRecord {
    try_normalize_dispatch(raw).unwrap_or_else(|e| {
        warn!("Discarding dispatch payload: {}", e);
        DispatchRecord::placeholder()
    })
}

/// Normalize a provider payload. Fails only when it is not a JSON object.
pub fn try_normalize_dispatch(raw: &str) -> Result<DispatchRecord, FeedError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| FeedError::Payload(e.to_string()))?;
    let Value::Object(ofp) = value else {
        return Err(FeedError::Payload("expected a JSON object".to_string()));
    };

    let origin: RawAirport = section(&ofp, "origin");
    let destination: RawAirport = section(&ofp, "destination");
    let alternate: RawAirport = section(&ofp, "alternate");
    let general: RawGeneral = section(&ofp, "general");
    let aircraft: RawAircraft = section(&ofp, "aircraft");
    let weights: RawWeights = section(&ofp, "weights");
    let fuel: RawFuel = section(&ofp, "fuel");
    let times: RawTimes = section(&ofp, "times");
    let params: RawParams = section(&ofp, "params");
    let text: RawText = section(&ofp, "text");

    let distance = if general.air_distance.is_empty() {
        String::new()
    } else {
        format!("{}nm", general.air_distance)
    };

    Ok(DispatchRecord {
        airline: general.icao_airline,
        flight_number: general.flight_number,
        aircraft_reg: aircraft.reg,
        origin: origin.pair(),
        destination: destination.pair(),
        alternate_burn: alternate.burn,
        alternate: alternate.pair(),
        distance,
        flight_time: flight_time_from_eta(&times.est_time_enroute),
        eta_seconds: times.est_time_enroute.clone(),
        cruise_altitude: general.initial_altitude,
        weights: Weights {
            cargo: weights.cargo,
            est_landing_weight: weights.est_ldw,
            est_takeoff_weight: weights.est_tow,
            est_zero_fuel_weight: weights.est_zfw,
            max_landing_weight: weights.max_ldw,
            max_takeoff_weight: weights.max_tow,
            max_zero_fuel_weight: weights.max_zfw,
            passenger_count: weights.pax_count,
            passenger_weight: weights.pax_weight,
            payload: weights.payload,
        },
        fuel: Fuel {
            avg_fuel_flow: fuel.avg_fuel_flow,
            contingency: fuel.contingency,
            enroute_burn: fuel.enroute_burn,
            etops: fuel.etops,
            extra: fuel.extra,
            max_tanks: fuel.max_tanks,
            min_takeoff: fuel.min_takeoff,
            plan_landing: fuel.plan_landing,
            plan_ramp: fuel.plan_ramp,
            plan_takeoff: fuel.plan_takeoff,
            reserve: fuel.reserve,
            taxi: fuel.taxi,
        },
        times: Times {
            est_time_enroute: times.est_time_enroute.trim().parse().unwrap_or_default(),
            contingency_fuel_time: times.contfuel_time,
            reserve_time: times.reserve_time,
            taxi_out: times.taxi_out,
            sched_out: times.sched_out,
            sched_in: times.sched_in,
        },
        average_wind: AverageWind {
            direction: general.avg_wind_dir,
            speed: general.avg_wind_spd,
        },
        units: params.units,
        route: general.route,
        cost_index: general.costindex,
        loadsheet: text.plan_html,
    })
}

/// Decode one named section, or its default when absent or malformed.
fn section<T: DeserializeOwned + Default>(ofp: &Map<String, Value>, name: &str) -> T {
    ofp.get(name)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAirport {
    #[serde(deserialize_with = "lenient_string")]
    icao_code: String,
    #[serde(deserialize_with = "lenient_string")]
    iata_code: String,
    #[serde(deserialize_with = "lenient_f64")]
    burn: f64,
}

impl RawAirport {
    fn pair(self) -> AirportPair {
        AirportPair {
            icao: self.icao_code,
            iata: self.iata_code,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGeneral {
    #[serde(deserialize_with = "lenient_string")]
    icao_airline: String,
    #[serde(deserialize_with = "lenient_string")]
    flight_number: String,
    #[serde(deserialize_with = "lenient_string")]
    route: String,
    #[serde(deserialize_with = "lenient_string")]
    costindex: String,
    #[serde(deserialize_with = "lenient_f64")]
    initial_altitude: f64,
    #[serde(deserialize_with = "lenient_string")]
    air_distance: String,
    #[serde(deserialize_with = "lenient_string")]
    avg_wind_dir: String,
    #[serde(deserialize_with = "lenient_string")]
    avg_wind_spd: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAircraft {
    #[serde(deserialize_with = "lenient_string")]
    reg: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWeights {
    #[serde(deserialize_with = "lenient_f64")]
    cargo: f64,
    #[serde(deserialize_with = "lenient_f64")]
    est_ldw: f64,
    #[serde(deserialize_with = "lenient_f64")]
    est_tow: f64,
    #[serde(deserialize_with = "lenient_f64")]
    est_zfw: f64,
    #[serde(deserialize_with = "lenient_f64")]
    max_ldw: f64,
    #[serde(deserialize_with = "lenient_f64")]
    max_tow: f64,
    #[serde(deserialize_with = "lenient_f64")]
    max_zfw: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pax_count: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pax_weight: f64,
    #[serde(deserialize_with = "lenient_f64")]
    payload: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFuel {
    #[serde(deserialize_with = "lenient_f64")]
    avg_fuel_flow: f64,
    #[serde(deserialize_with = "lenient_f64")]
    contingency: f64,
    #[serde(deserialize_with = "lenient_f64")]
    enroute_burn: f64,
    #[serde(deserialize_with = "lenient_f64")]
    etops: f64,
    #[serde(deserialize_with = "lenient_f64")]
    extra: f64,
    #[serde(deserialize_with = "lenient_f64")]
    max_tanks: f64,
    #[serde(deserialize_with = "lenient_f64")]
    min_takeoff: f64,
    #[serde(deserialize_with = "lenient_f64")]
    plan_landing: f64,
    #[serde(deserialize_with = "lenient_f64")]
    plan_ramp: f64,
    #[serde(deserialize_with = "lenient_f64")]
    plan_takeoff: f64,
    #[serde(deserialize_with = "lenient_f64")]
    reserve: f64,
    #[serde(deserialize_with = "lenient_f64")]
    taxi: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTimes {
    #[serde(deserialize_with = "lenient_string")]
    est_time_enroute: String,
    #[serde(deserialize_with = "lenient_f64")]
    contfuel_time: f64,
    #[serde(deserialize_with = "lenient_f64")]
    reserve_time: f64,
    #[serde(deserialize_with = "lenient_f64")]
    taxi_out: f64,
    #[serde(deserialize_with = "lenient_string")]
    sched_out: String,
    #[serde(deserialize_with = "lenient_string")]
    sched_in: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParams {
    #[serde(deserialize_with = "lenient_string")]
    units: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawText {
    #[serde(deserialize_with = "lenient_string")]
    plan_html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFP: &str = r#"{
        "params": { "units": "kgs" },
        "general": {
            "icao_airline": "AFR",
            "flight_number": "1234",
            "route": "LGL7R LGL UN491 BIBAX",
            "costindex": "40",
            "initial_altitude": "36000",
            "air_distance": "1023",
            "avg_wind_dir": 270,
            "avg_wind_spd": "35"
        },
        "origin": { "icao_code": "LFPG", "iata_code": "CDG" },
        "destination": { "icao_code": "EGLL", "iata_code": "LHR" },
        "alternate": { "icao_code": "EGKK", "iata_code": "LGW", "burn": "1800" },
        "aircraft": { "reg": "F-HEPA" },
        "weights": { "pax_count": "174", "payload": 16530, "est_zfw": "58530" },
        "fuel": { "plan_ramp": "9870", "taxi": "200" },
        "times": { "est_time_enroute": "5400", "taxi_out": "900", "sched_out": "1716300000" },
        "text": { "plan_html": "<div>OFP</div>" }
    }"#;

    #[test]
    fn test_normalize_full_payload() {
        let record = normalize_dispatch(OFP);

        assert_eq!(record.airline, "AFR");
        assert_eq!(record.flight_number, "1234");
        assert_eq!(record.origin.icao, "LFPG");
        assert_eq!(record.destination.iata, "LHR");
        assert_eq!(record.alternate.icao, "EGKK");
        assert!((record.alternate_burn - 1800.0).abs() < f64::EPSILON);
        assert_eq!(record.aircraft_reg, "F-HEPA");
        assert_eq!(record.distance, "1023nm");
        assert_eq!(record.eta_seconds, "5400");
        assert_eq!(record.flight_time, "01:30");
        assert!((record.cruise_altitude - 36000.0).abs() < f64::EPSILON);
        assert!((record.weights.passenger_count - 174.0).abs() < f64::EPSILON);
        assert!((record.weights.payload - 16530.0).abs() < f64::EPSILON);
        assert!((record.fuel.plan_ramp - 9870.0).abs() < f64::EPSILON);
        assert!((record.times.taxi_out - 900.0).abs() < f64::EPSILON);
        assert_eq!(record.average_wind.direction, "270");
        assert_eq!(record.units, "kgs");
        assert_eq!(record.cost_index, "40");
        assert_eq!(record.loadsheet, "<div>OFP</div>");
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let record = normalize_dispatch(r#"{ "origin": { "icao_code": "KJFK" }, "alternate": [] }"#);

        assert_eq!(record.origin.icao, "KJFK");
        assert_eq!(record.alternate, AirportPair::default());
        assert_eq!(record.weights, Weights::default());
        assert_eq!(record.flight_time, "00:00");
        assert!(!record.is_placeholder());
    }

    #[test]
    fn test_non_object_payload_is_placeholder() {
        assert!(normalize_dispatch("").is_placeholder());
        assert!(normalize_dispatch("<OFP>xml</OFP>").is_placeholder());
        assert!(normalize_dispatch("[1, 2, 3]").is_placeholder());
        assert!(matches!(
            try_normalize_dispatch("null"),
            Err(FeedError::Payload(_))
        ));
    }
}
