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

//! Structured METAR observation types.
//!
//! Every physical quantity carries the units the panel displays side by side
//! (knots and m/s, miles and meters, feet and meters, inHg/kPa/mb).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::units::{
    celsius_to_fahrenheit, format_trimmed, round_to, FEET_TO_METERS, HPA_PER_INHG,
    KNOTS_TO_MPS, METERS_PER_STATUTE_MILE,
};

// Flight category thresholds (FAA definitions)
const LIFR_CEILING_FT: f64 = 500.0;
const LIFR_VISIBILITY_SM: f64 = 1.0;
const IFR_CEILING_FT: f64 = 1000.0;
const IFR_VISIBILITY_SM: f64 = 3.0;
const MVFR_CEILING_FT: f64 = 3000.0;
const MVFR_VISIBILITY_SM: f64 = 5.0;

/// Surface wind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wind {
    /// True direction the wind blows from; `None` when reported as `VRB`.
    pub degrees: Option<u16>,
    pub speed_kts: f64,
    pub speed_mps: f64,
    pub gust_kts: Option<f64>,
    pub gust_mps: Option<f64>,
    /// Direction variation range (`dddVddd` group).
    pub variation: Option<(u16, u16)>,
}

impl Wind {
    /// Build a wind group from speeds already converted to knots.
    #[must_use]
    pub fn from_knots(degrees: Option<u16>, speed_kts: f64, gust_kts: Option<f64>) -> Self {
        Self {
            degrees,
            speed_kts: round_to(speed_kts, 1),
            speed_mps: round_to(speed_kts * KNOTS_TO_MPS, 1),
            gust_kts: gust_kts.map(|g| round_to(g, 1)),
            gust_mps: gust_kts.map(|g| round_to(g * KNOTS_TO_MPS, 1)),
            variation: None,
        }
    }

    /// Whether the direction was reported as variable.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.degrees.is_none()
    }
}

/// Prevailing visibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visibility {
    pub miles: String,
    pub miles_float: f64,
    pub meters: String,
    pub meters_float: f64,
}

impl Visibility {
    #[must_use]
    pub fn from_miles(miles: f64) -> Self {
        let meters = round_to(miles * METERS_PER_STATUTE_MILE, 0);
        Self {
            miles: format_trimmed(miles),
            miles_float: round_to(miles, 2),
            meters: format!("{meters:.0}"),
            meters_float: meters,
        }
    }

    #[must_use]
    pub fn from_meters(meters: f64) -> Self {
        let miles = meters / METERS_PER_STATUTE_MILE;
        Self {
            miles: format_trimmed(miles),
            miles_float: round_to(miles, 2),
            meters: format!("{meters:.0}"),
            meters_float: meters,
        }
    }
}

/// One element of a present-weather group (intensity, descriptor or phenomenon).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub code: String,
}

/// A reported cloud layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cloud {
    /// Coverage code: `FEW`, `SCT`, `BKN`, `OVC`, `VV`, or a clear-sky code.
    pub code: String,
    pub base_feet_agl: Option<f64>,
    pub base_meters_agl: Option<f64>,
    /// Convective type suffix (`CB` or `TCU`).
    pub cloud_type: Option<String>,
}

impl Cloud {
    #[must_use]
    pub fn layer(code: &str, base_feet: Option<f64>, cloud_type: Option<String>) -> Self {
        Self {
            code: code.to_string(),
            base_feet_agl: base_feet,
            base_meters_agl: base_feet.map(|ft| round_to(ft * FEET_TO_METERS, 0)),
            cloud_type,
        }
    }

    /// Broken, overcast and vertical-visibility layers constitute a ceiling.
    #[must_use]
    pub fn is_ceiling(&self) -> bool {
        matches!(self.code.as_str(), "BKN" | "OVC" | "VV") && self.base_feet_agl.is_some()
    }
}

/// Lowest broken/overcast layer or vertical visibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ceiling {
    pub code: String,
    pub feet_agl: f64,
    pub meters_agl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Temperature {
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl Temperature {
    #[must_use]
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            celsius,
            fahrenheit: round_to(celsius_to_fahrenheit(celsius), 1),
        }
    }
}

/// Altimeter setting in the three units the panel offers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Barometer {
    pub hg: f64,
    pub kpa: f64,
    pub mb: f64,
}

impl Barometer {
    #[must_use]
    pub fn from_inches(hg: f64) -> Self {
        let mb = hg * HPA_PER_INHG;
        Self {
            hg: round_to(hg, 2),
            kpa: round_to(mb / 10.0, 2),
            mb: round_to(mb, 1),
        }
    }

    #[must_use]
    pub fn from_hectopascals(mb: f64) -> Self {
        Self {
            hg: round_to(mb / HPA_PER_INHG, 2),
            kpa: round_to(mb / 10.0, 2),
            mb,
        }
    }
}

/// Flight category derived from ceiling and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlightCategory {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

impl FlightCategory {
    /// Classify using FAA thresholds. Returns `None` when neither input is known.
    #[must_use]
    pub fn classify(ceiling_ft: Option<f64>, visibility_sm: Option<f64>) -> Option<Self> {
        if ceiling_ft.is_none() && visibility_sm.is_none() {
            return None;
        }

        let ceiling = ceiling_ft.unwrap_or(f64::INFINITY);
        let visibility = visibility_sm.unwrap_or(f64::INFINITY);

        let category = if ceiling < LIFR_CEILING_FT || visibility < LIFR_VISIBILITY_SM {
            Self::Lifr
        } else if ceiling < IFR_CEILING_FT || visibility < IFR_VISIBILITY_SM {
            Self::Ifr
        } else if ceiling <= MVFR_CEILING_FT || visibility <= MVFR_VISIBILITY_SM {
            Self::Mvfr
        } else {
            Self::Vfr
        };
        Some(category)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vfr => "VFR",
            Self::Mvfr => "MVFR",
            Self::Ifr => "IFR",
            Self::Lifr => "LIFR",
        }
    }
}

impl std::fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded METAR report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metar {
    pub raw_text: String,
    pub raw_parts: Vec<String>,
    pub icao: String,
    pub observed: Option<DateTime<Utc>>,
    /// Report generated by an automated station (`AUTO`).
    pub automated: bool,
    pub wind: Option<Wind>,
    pub visibility: Option<Visibility>,
    pub conditions: Vec<Condition>,
    pub clouds: Vec<Cloud>,
    pub ceiling: Option<Ceiling>,
    pub temperature: Option<Temperature>,
    pub dewpoint: Option<Temperature>,
    pub humidity_percent: Option<f64>,
    pub barometer: Option<Barometer>,
    pub flight_category: Option<FlightCategory>,
}

impl Metar {
    pub(crate) fn new(raw_text: String, raw_parts: Vec<String>, icao: String) -> Self {
        Self {
            raw_text,
            raw_parts,
            icao,
            observed: None,
            automated: false,
            wind: None,
            visibility: None,
            conditions: Vec::new(),
            clouds: Vec::new(),
            ceiling: None,
            temperature: None,
            dewpoint: None,
            humidity_percent: None,
            barometer: None,
            flight_category: None,
        }
    }

    /// Fill in the ceiling, humidity and flight category from decoded groups.
    pub(crate) fn derive(&mut self) {
        self.ceiling = self
            .clouds
            .iter()
            .filter(|c| c.is_ceiling())
            .filter_map(|c| c.base_feet_agl.map(|ft| (c, ft)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(cloud, feet)| Ceiling {
                code: cloud.code.clone(),
                feet_agl: feet,
                meters_agl: cloud.base_meters_agl.unwrap_or_default(),
            });

        self.humidity_percent = match (self.temperature, self.dewpoint) {
            (Some(t), Some(d)) => Some(relative_humidity(t.celsius, d.celsius)),
            _ => None,
        };

        self.flight_category = FlightCategory::classify(
            self.ceiling.as_ref().map(|c| c.feet_agl),
            self.visibility.as_ref().map(|v| v.miles_float),
        );
    }
}

/// Relative humidity from temperature and dewpoint (Magnus approximation).
fn relative_humidity(temperature_c: f64, dewpoint_c: f64) -> f64 {
    const B: f64 = 17.625;
    const C: f64 = 243.04;
    let actual = ((B * dewpoint_c) / (C + dewpoint_c)).exp();
    let saturation = ((B * temperature_c) / (C + temperature_c)).exp();
    round_to((100.0 * actual / saturation).min(100.0), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_flight_category() {
        assert_eq!(FlightCategory::classify(None, None), None);
        assert_eq!(FlightCategory::classify(Some(400.0), Some(10.0)), Some(FlightCategory::Lifr));
        assert_eq!(FlightCategory::classify(None, Some(0.5)), Some(FlightCategory::Lifr));
        assert_eq!(FlightCategory::classify(Some(800.0), Some(10.0)), Some(FlightCategory::Ifr));
        assert_eq!(FlightCategory::classify(Some(3000.0), Some(10.0)), Some(FlightCategory::Mvfr));
        assert_eq!(FlightCategory::classify(Some(5000.0), Some(4.0)), Some(FlightCategory::Mvfr));
        assert_eq!(FlightCategory::classify(Some(5000.0), Some(10.0)), Some(FlightCategory::Vfr));
    }

    #[test]
    fn test_relative_humidity_saturated() {
        assert!((relative_humidity(15.0, 15.0) - 100.0).abs() < 0.01);
        let rh = relative_humidity(22.0, 9.0);
        assert!(rh > 40.0 && rh < 45.0, "unexpected humidity {rh}");
    }

    #[test]
    fn test_barometer_conversions() {
        let baro = Barometer::from_inches(29.92);
        assert!((baro.mb - 1013.2).abs() < 0.1);
        assert!((baro.kpa - 101.32).abs() < 0.01);

        let baro = Barometer::from_hectopascals(1013.0);
        assert!((baro.hg - 29.91).abs() < 0.01);
    }

    #[test]
    fn test_ceiling_ignores_scattered_layers() {
        let mut metar = Metar::new(String::new(), Vec::new(), "EGLL".to_string());
        metar.clouds = vec![
            Cloud::layer("SCT", Some(1200.0), None),
            Cloud::layer("OVC", Some(4000.0), None),
            Cloud::layer("BKN", Some(2500.0), None),
        ];
        metar.derive();

        let ceiling = metar.ceiling.unwrap();
        assert_eq!(ceiling.code, "BKN");
        assert!((ceiling.feet_agl - 2500.0).abs() < f64::EPSILON);
        assert_eq!(metar.flight_category, Some(FlightCategory::Mvfr));
    }
}
