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


//! Weather observation records.

use chrono::{DateTime, Utc};
use log::warn;
use metar::{Metar, MetarParser};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindData {
    pub degrees: f64,
    pub speed_kts: f64,
    pub speed_mps: f64,
    pub gust_kts: f64,
    pub gust_mps: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisibilityData {
    pub miles: String,
    pub miles_float: f64,
    pub meters: String,
    pub meters_float: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CloudLayer {
    pub code: String,
    pub base_feet_agl: f64,
    pub base_meters_agl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CeilingData {
    pub code: String,
    pub feet_agl: f64,
    pub meters_agl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemperatureData {
    pub celsius: f64,
    pub fahrenheit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarometerData {
    pub hg: f64,
    pub kpa: f64,
    pub mb: f64,
}

/// Canonical weather record. `Default` is the placeholder: zeros, empty
/// strings and empty collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherRecord {
    pub station: String,
    pub source: String,
    pub observed: Option<DateTime<Utc>>,
    pub wind: WindData,
    pub visibility: VisibilityData,
    pub conditions: Vec<String>,
    pub clouds: Vec<CloudLayer>,
    pub ceiling: CeilingData,
    pub temperature: TemperatureData,
    pub dewpoint: TemperatureData,
    pub humidity_percent: f64,
    pub barometer: BarometerData,
    pub flight_category: String,
    pub raw_text: String,
}

impl WeatherRecord {
    #[must_use]
    pub fn placeholder() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn from_metar(metar: &Metar, source: &str) -> Self {
        let wind = metar.wind.as_ref().map_or_else(WindData::default, |w| WindData {
            degrees: w.degrees.map_or(0.0, f64::from),
            speed_kts: w.speed_kts,
            speed_mps: w.speed_mps,
            gust_kts: w.gust_kts.unwrap_or_default(),
            gust_mps: w.gust_mps.unwrap_or_default(),
        });

        let visibility = metar
            .visibility
            .as_ref()
            .map_or_else(VisibilityData::default, |v| VisibilityData {
                miles: v.miles.clone(),
                miles_float: v.miles_float,
                meters: v.meters.clone(),
                meters_float: v.meters_float,
            });

        let temperature = |t: Option<&metar::Temperature>| {
            t.map_or_else(TemperatureData::default, |t| TemperatureData {
                celsius: t.celsius,
                fahrenheit: t.fahrenheit,
            })
        };

        Self {
            station: metar.icao.clone(),
            source: source.to_string(),
            observed: metar.observed,
            wind,
            visibility,
            conditions: metar.conditions.iter().map(|c| c.code.clone()).collect(),
            clouds: metar
                .clouds
                .iter()
                .map(|c| CloudLayer {
                    code: c.code.clone(),
                    base_feet_agl: c.base_feet_agl.unwrap_or_default(),
                    base_meters_agl: c.base_meters_agl.unwrap_or_default(),
                })
                .collect(),
            ceiling: metar
                .ceiling
                .as_ref()
                .map_or_else(CeilingData::default, |c| CeilingData {
                    code: c.code.clone(),
                    feet_agl: c.feet_agl,
                    meters_agl: c.meters_agl,
                }),
            temperature: temperature(metar.temperature.as_ref()),
            dewpoint: temperature(metar.dewpoint.as_ref()),
            humidity_percent: metar.humidity_percent.unwrap_or_default(),
            barometer: metar
                .barometer
                .as_ref()
                .map_or_else(BarometerData::default, |b| BarometerData {
                    hg: b.hg,
                    kpa: b.kpa,
                    mb: b.mb,
                }),
            flight_category: metar
                .flight_category
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            raw_text: metar.raw_text.clone(),
        }
    }
}

/// Provider response body.
#[derive(Debug, Deserialize)]
struct MetarResponse {
    #[serde(default)]
    source: String,
    metar: String,
}

/// Normalize a provider payload, falling back to the placeholder.
#[must_use]
pub fn normalize_weather(raw: &str) -> WeatherRecord {
    try_normalize_weather(raw, &MetarParser::new()).unwrap_or_else(|e| {
        warn!("Discarding weather payload: {}", e);
        WeatherRecord::placeholder()
    })
}

/// Normalize a provider payload: a `{ "icao", "source", "metar" }` object or
/// a bare report line.
pub fn try_normalize_weather(raw: &str, parser: &MetarParser) -> Result<WeatherRecord, FeedError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FeedError::Payload("empty weather response".to_string()));
    }

    let (report, source) = if raw.starts_with('{') {
        let response: MetarResponse =
            serde_json::from_str(raw).map_err(|e| FeedError::Payload(e.to_string()))?;
        (response.metar, response.source)
    } else {
        (raw.to_string(), String::new())
    };

    let metar = parser
        .parse(&report)
        .map_err(|e| FeedError::Payload(e.to_string()))?;
    Ok(WeatherRecord::from_metar(&metar, &source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_provider_response() {
        let record = normalize_weather(
            r#"{"icao":"EGLL","source":"vatsim","metar":"EGLL 201150Z 24008KT 9999 -RA SCT012 OVC020 12/10 Q1008"}"#,
        );

        assert_eq!(record.station, "EGLL");
        assert_eq!(record.source, "vatsim");
        assert!((record.wind.degrees - 240.0).abs() < f64::EPSILON);
        assert!((record.wind.speed_kts - 8.0).abs() < f64::EPSILON);
        assert_eq!(record.conditions, vec!["-", "RA"]);
        assert_eq!(record.clouds.len(), 2);
        assert_eq!(record.ceiling.code, "OVC");
        assert!((record.temperature.celsius - 12.0).abs() < f64::EPSILON);
        assert!((record.barometer.mb - 1008.0).abs() < f64::EPSILON);
        assert_eq!(record.flight_category, "MVFR");
    }

    #[test]
    fn test_normalize_bare_report() {
        let record = normalize_weather("KJFK 121851Z 31015G25KT 10SM FEW050 22/09 A2992");
        assert_eq!(record.station, "KJFK");
        assert!((record.wind.gust_kts - 25.0).abs() < f64::EPSILON);
        assert_eq!(record.ceiling, CeilingData::default());
        assert!(record.source.is_empty());
    }

    #[test]
    fn test_garbage_is_placeholder() {
        for raw in [
            "",
            "   ",
            "%%%%",
            "{not json",
            r#"{"error":"not found"}"#,
            "this is not weather",
            "é123 Q1008",
        ] {
            let record = normalize_weather(raw);
            assert!(record.is_placeholder(), "{raw:?} was not rejected");
            assert!(record.station.is_empty());
            assert!(record.clouds.is_empty());
        }
    }

    #[test]
    fn test_non_ascii_group_is_skipped() {
        let record = normalize_weather("EGLL 201150Z é123 Q1008");
        assert_eq!(record.station, "EGLL");
        assert!((record.barometer.mb - 1008.0).abs() < f64::EPSILON);

        let record = normalize_weather(r#"{"source":"vatsim","metar":"KJFK ÷ÄÄ1 Ä2992 A2992"}"#);
        assert_eq!(record.station, "KJFK");
        assert!((record.barometer.hg - 29.92).abs() < 0.001);
    }
}
