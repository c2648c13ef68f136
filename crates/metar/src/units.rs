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

//! Unit conversion constants shared by the parser and observation types.

pub(crate) const KNOTS_TO_MPS: f64 = 0.514_444;
pub(crate) const KMH_PER_KNOT: f64 = 1.852;
pub(crate) const FEET_TO_METERS: f64 = 0.3048;
pub(crate) const METERS_PER_STATUTE_MILE: f64 = 1609.344;
pub(crate) const HPA_PER_INHG: f64 = 33.8639;

pub(crate) fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format a number without trailing zeros (10.0 -> "10", 1.50 -> "1.5").
pub(crate) fn format_trimmed(value: f64) -> String {
    let text = format!("{:.2}", round_to(value, 2));
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
