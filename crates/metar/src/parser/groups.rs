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

//! Decoders for individual METAR groups.
//!
//! Each function takes one whitespace-delimited token and returns `None` when
//! the token is not a group of that kind.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::observation::{Barometer, Cloud, Condition, Temperature, Visibility, Wind};
use crate::units::{KMH_PER_KNOT, KNOTS_TO_MPS};

/// Metric visibility of 9999 means "10 km or more".
const UNLIMITED_METRIC_VISIBILITY_M: f64 = 10_000.0;

const WEATHER_CODES: &[&str] = &[
    // Descriptors
    "MI", "PR", "BC", "DR", "BL", "SH", "TS", "FZ",
    // Precipitation
    "DZ", "RA", "SN", "SG", "IC", "PL", "GR", "GS", "UP",
    // Obscuration
    "BR", "FG", "FU", "VA", "DU", "SA", "HZ", "PY",
    // Other
    "PO", "SQ", "FC", "SS", "DS",
];

const CLEAR_SKY_CODES: &[&str] = &["SKC", "CLR", "NSC", "NCD"];

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a signed METAR temperature (`M05` is -5).
fn signed_temperature(s: &str) -> Option<f64> {
    let (negative, digits) = match s.strip_prefix('M') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.len() != 2 || !all_digits(digits) {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// `DDHHMMZ` observation time, resolved against a reference instant.
///
/// A day of month later than the reference day belongs to the previous month.
pub(super) fn observation_time(token: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let body = token.strip_suffix('Z')?;
    if body.len() != 6 || !all_digits(body) {
        return None;
    }

    let day: u32 = body[0..2].parse().ok()?;
    let hour: u32 = body[2..4].parse().ok()?;
    let minute: u32 = body[4..6].parse().ok()?;

    let (mut year, mut month) = (reference.year(), reference.month());
    if day > reference.day() {
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// `dddff(Gff)KT`, also `MPS` and `KMH`, with `VRB` for variable direction.
pub(super) fn wind(token: &str) -> Option<Wind> {
    let (body, to_knots): (&str, fn(f64) -> f64) = if let Some(b) = token.strip_suffix("KT") {
        (b, |v| v)
    } else if let Some(b) = token.strip_suffix("MPS") {
        (b, |v| v / KNOTS_TO_MPS)
    } else if let Some(b) = token.strip_suffix("KMH") {
        (b, |v| v / KMH_PER_KNOT)
    } else {
        return None;
    };

    if body.len() < 5 || !body.is_char_boundary(3) {
        return None;
    }
    let (direction, rest) = body.split_at(3);
    let degrees = match direction {
        "VRB" => None,
        d if all_digits(d) => Some(d.parse::<u16>().ok()?),
        _ => return None,
    };

    let (speed, gust) = match rest.split_once('G') {
        Some((s, g)) => (s, Some(g)),
        None => (rest, None),
    };
    if !all_digits(speed) || speed.len() > 3 {
        return None;
    }
    let speed: f64 = speed.parse().ok()?;
    let gust = match gust {
        Some(g) if all_digits(g) && g.len() <= 3 => Some(to_knots(g.parse().ok()?)),
        Some(_) => return None,
        None => None,
    };

    Some(Wind::from_knots(degrees, to_knots(speed), gust))
}

/// `dddVddd` wind direction variation.
pub(super) fn wind_variation(token: &str) -> Option<(u16, u16)> {
    let (from, to) = token.split_once('V')?;
    if from.len() != 3 || to.len() != 3 || !all_digits(from) || !all_digits(to) {
        return None;
    }
    Some((from.parse().ok()?, to.parse().ok()?))
}

/// Whole statute miles preceding a fractional group (`1` in `1 1/2SM`).
pub(super) fn whole_miles(token: &str) -> Option<f64> {
    if token.len() <= 2 && all_digits(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// `10SM`, `1/2SM`, `M1/4SM`, `P6SM`.
pub(super) fn statute_miles(token: &str) -> Option<f64> {
    let body = token.strip_suffix("SM")?;
    let body = body
        .strip_prefix('M')
        .or_else(|| body.strip_prefix('P'))
        .unwrap_or(body);

    match body.split_once('/') {
        Some((num, den)) if all_digits(num) && all_digits(den) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        Some(_) => None,
        None if all_digits(body) => body.parse().ok(),
        None => None,
    }
}

/// Four-digit metric visibility, optionally suffixed with `NDV`.
pub(super) fn metric_visibility(token: &str) -> Option<Visibility> {
    let body = token.strip_suffix("NDV").unwrap_or(token);
    if body.len() != 4 || !all_digits(body) {
        return None;
    }
    let meters: f64 = body.parse().ok()?;
    let meters = if body == "9999" {
        UNLIMITED_METRIC_VISIBILITY_M
    } else {
        meters
    };
    Some(Visibility::from_meters(meters))
}

/// Runway visual range groups (`R04R/1200FT`) are recognised and ignored.
pub(super) fn is_runway_visual_range(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() > 4
        && bytes[0] == b'R'
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
        && token.contains('/')
}

/// Present weather, split into intensity and two-letter codes.
pub(super) fn weather(token: &str) -> Option<Vec<Condition>> {
    let mut conditions = Vec::new();
    let mut rest = token;

    for prefix in ["+", "-", "VC"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            conditions.push(Condition {
                code: prefix.to_string(),
            });
            rest = stripped;
            break;
        }
    }

    if rest.is_empty() || rest.len() % 2 != 0 || !rest.is_ascii() {
        return None;
    }

    for chunk in rest.as_bytes().chunks(2) {
        let code = std::str::from_utf8(chunk).ok()?;
        if !WEATHER_CODES.contains(&code) {
            return None;
        }
        conditions.push(Condition {
            code: code.to_string(),
        });
    }

    Some(conditions)
}

/// Cloud layer (`BKN025CB`, `VV002`) or a clear-sky code.
pub(super) fn cloud(token: &str) -> Option<Cloud> {
    if CLEAR_SKY_CODES.contains(&token) {
        return Some(Cloud::layer(token, None, None));
    }

    let code = ["FEW", "SCT", "BKN", "OVC", "VV"]
        .into_iter()
        .find(|code| token.starts_with(code))?;
    let rest = &token[code.len()..];
    if rest.len() < 3 || !rest.is_char_boundary(3) {
        return None;
    }
    let (height, suffix) = rest.split_at(3);

    let base_feet = if height == "///" {
        None
    } else if all_digits(height) {
        Some(height.parse::<f64>().ok()? * 100.0)
    } else {
        return None;
    };

    let cloud_type = match suffix {
        "" | "///" => None,
        "CB" | "TCU" => Some(suffix.to_string()),
        _ => return None,
    };

    Some(Cloud::layer(code, base_feet, cloud_type))
}

/// `TT/DD` with `M` marking negative values; the dewpoint may be missing.
pub(super) fn temperature(token: &str) -> Option<(Temperature, Option<Temperature>)> {
    let (t, d) = token.split_once('/')?;
    let temperature = Temperature::from_celsius(signed_temperature(t)?);
    let dewpoint = if d.is_empty() || d == "//" {
        None
    } else {
        Some(Temperature::from_celsius(signed_temperature(d)?))
    };
    Some((temperature, dewpoint))
}

/// `A2992` (inches of mercury) or `Q1013` (hectopascals).
pub(super) fn altimeter(token: &str) -> Option<Barometer> {
    if token.len() != 5 || !token.is_ascii() {
        return None;
    }
    let (unit, digits) = token.split_at(1);
    if !all_digits(digits) {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    match unit {
        "A" => Some(Barometer::from_inches(value / 100.0)),
        "Q" => Some(Barometer::from_hectopascals(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_time_same_month() {
        let reference = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let observed = observation_time("121851Z", reference).unwrap();
        assert_eq!(observed, Utc.with_ymd_and_hms(2024, 3, 12, 18, 51, 0).unwrap());
    }

    #[test]
    fn test_observation_time_rolls_back_month() {
        let reference = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let observed = observation_time("312350Z", reference).unwrap();
        assert_eq!(observed, Utc.with_ymd_and_hms(2023, 12, 31, 23, 50, 0).unwrap());
    }

    #[test]
    fn test_wind_with_gust() {
        let wind = wind("31015G25KT").unwrap();
        assert_eq!(wind.degrees, Some(310));
        assert!((wind.speed_kts - 15.0).abs() < f64::EPSILON);
        assert_eq!(wind.gust_kts, Some(25.0));
        assert!((wind.speed_mps - 7.7).abs() < 0.05);
    }

    #[test]
    fn test_wind_variable_and_metric() {
        let wind_vrb = wind("VRB03KT").unwrap();
        assert!(wind_vrb.is_variable());

        let wind_mps = wind("24005MPS").unwrap();
        assert!((wind_mps.speed_mps - 5.0).abs() < 0.05);
        assert!((wind_mps.speed_kts - 9.7).abs() < 0.05);
    }

    #[test]
    fn test_wind_rejects_other_groups() {
        assert!(wind("10SM").is_none());
        assert!(wind("KT").is_none());
        assert!(wind("ABCDEKT").is_none());
    }

    #[test]
    fn test_statute_miles() {
        assert_eq!(statute_miles("10SM"), Some(10.0));
        assert_eq!(statute_miles("1/2SM"), Some(0.5));
        assert_eq!(statute_miles("M1/4SM"), Some(0.25));
        assert_eq!(statute_miles("1/0SM"), None);
        assert_eq!(statute_miles("9999"), None);
    }

    #[test]
    fn test_metric_visibility() {
        let vis = metric_visibility("9999").unwrap();
        assert!((vis.meters_float - 10_000.0).abs() < f64::EPSILON);
        let vis = metric_visibility("0800").unwrap();
        assert_eq!(vis.meters, "800");
        assert!(metric_visibility("A2992").is_none());
    }

    #[test]
    fn test_weather_groups() {
        let codes: Vec<String> = weather("-SHRA").unwrap().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["-", "SH", "RA"]);
        assert!(weather("BR").is_some());
        assert!(weather("RMK").is_none());
        assert!(weather("KJFK").is_none());
    }

    #[test]
    fn test_cloud_layers() {
        let layer = cloud("BKN025CB").unwrap();
        assert_eq!(layer.code, "BKN");
        assert_eq!(layer.base_feet_agl, Some(2500.0));
        assert_eq!(layer.cloud_type.as_deref(), Some("CB"));

        let vv = cloud("VV002").unwrap();
        assert_eq!(vv.base_feet_agl, Some(200.0));

        let clear = cloud("CLR").unwrap();
        assert!(clear.base_feet_agl.is_none());

        assert!(cloud("FEWXYZ").is_none());
    }

    #[test]
    fn test_temperature_group() {
        let (t, d) = temperature("M05/M10").unwrap();
        assert!((t.celsius + 5.0).abs() < f64::EPSILON);
        assert!((d.unwrap().celsius + 10.0).abs() < f64::EPSILON);

        let (t, d) = temperature("15/").unwrap();
        assert!((t.celsius - 15.0).abs() < f64::EPSILON);
        assert!(d.is_none());

        assert!(temperature("1/2SM").is_none());
    }

    #[test]
    fn test_altimeter() {
        assert!((altimeter("A3001").unwrap().hg - 30.01).abs() < 0.001);
        assert!((altimeter("Q0998").unwrap().mb - 998.0).abs() < f64::EPSILON);
        assert!(altimeter("B1234").is_none());
        assert!(altimeter("é123").is_none());
        assert!(altimeter("Ä1234").is_none());
    }
}
