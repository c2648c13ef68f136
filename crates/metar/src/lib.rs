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

//! METAR parsing library.
//!
//! Turns the raw text of a routine aerodrome weather report into a structured
//! [`Metar`] observation. The parser is deliberately tolerant: groups it does
//! not recognise are skipped, and only a missing or malformed station
//! identifier is treated as a hard error.
//!
//! Two layers are exposed:
//!
//! - **Parser layer**: [`MetarParser`] tokenises the report and decodes each
//!   group (time, wind, visibility, weather, clouds, temperature, altimeter).
//! - **Observation layer**: [`Metar`] and its value types, including derived
//!   data such as the ceiling, relative humidity and flight category.
//!
//! # Quick Start
//!
//! ```
//! use metar::{FlightCategory, MetarParser};
//!
//! let parser = MetarParser::new();
//! let metar = parser
//!     .parse("KJFK 121851Z 31015G25KT 10SM FEW050 BKN250 22/09 A2992")
//!     .unwrap();
//!
//! assert_eq!(metar.icao, "KJFK");
//! assert_eq!(metar.flight_category, Some(FlightCategory::Vfr));
//! ```

pub mod observation;
pub mod parser;
mod units;

pub use observation::{
    Barometer, Ceiling, Cloud, Condition, FlightCategory, Metar, Temperature, Visibility, Wind,
};
pub use parser::{MetarParser, ParseError};
