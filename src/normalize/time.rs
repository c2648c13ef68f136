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


/// Format an estimated time enroute, given in seconds, as `HH:MM`.
///
/// Minutes are rounded; a rounded 60 carries into the hour. Anything that is
/// not a non-negative number renders as `00:00`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "values are non-negative and already rounded"
)]
pub fn flight_time_from_eta(seconds: &str) -> String {
    let seconds = match seconds.trim().parse::<f64>() {
        Ok(s) if s.is_finite() && s > 0.0 => s,
        _ => return "00:00".to_string(),
    };

    let total_minutes = seconds / 60.0;
    let mut hours = (total_minutes / 60.0).floor();
    let mut minutes = (total_minutes - hours * 60.0).round();
    if minutes >= 60.0 {
        hours += 1.0;
        minutes -= 60.0;
    }

    format!("{:02}:{:02}", hours as u64, minutes as u64)
}
