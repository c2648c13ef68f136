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


//! Conversion of provider payloads into canonical records.
//!
//! Every failure is caught here. Callers get either a fully populated record
//! or the placeholder, never an error from the `normalize_*` entry points.

mod dispatch;
mod time;
mod weather;

pub use dispatch::{
    normalize_dispatch, try_normalize_dispatch, AirportPair, AverageWind, DispatchRecord, Fuel,
    Times, Weights,
};
pub use time::flight_time_from_eta;
pub use weather::{
    normalize_weather, try_normalize_weather, BarometerData, CeilingData, CloudLayer,
    TemperatureData, VisibilityData, WeatherRecord, WindData,
};
