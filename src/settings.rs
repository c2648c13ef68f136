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


//! Panel settings catalog.
//!
//! Every setting the panel exposes, with its key, default and the values it
//! accepts. [`register_all`] puts the whole catalog on a bridge and
//! [`SettingsPage`] implements the edit rules on top of it.

use std::time::Duration;

use log::{debug, info};

use crate::error::SyncError;
use crate::sync::{PropertyBinding, PropertySyncBridge, RangedSetting};

/// A persisted setting restricted to a fixed set of values.
#[derive(Debug, Clone, Copy)]
pub struct ChoiceSetting {
    pub key: &'static str,
    pub default: &'static str,
    /// `(label, value)` pairs in display order
    pub choices: &'static [(&'static str, &'static str)],
}

impl ChoiceSetting {
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.choices.iter().any(|(_, v)| *v == value)
    }

    #[must_use]
    pub fn label_for(&self, value: &str) -> Option<&'static str> {
        self.choices
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(label, _)| *label)
    }
}

/// A persisted integer setting with an inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct RangeSetting {
    pub key: &'static str,
    pub default: &'static str,
    pub min: i64,
    pub max: i64,
}

/// A persisted setting mirrored by a simulator variable.
#[derive(Debug, Clone, Copy)]
pub struct SyncedSetting {
    pub key: &'static str,
    pub default: &'static str,
    pub variable_id: &'static str,
    pub unit: &'static str,
}

pub const ALIGN_TIME: &str = "CONFIG_ALIGN_TIME";
pub const SELF_TEST_TIME: &str = "CONFIG_SELF_TEST_TIME";
pub const ATIS_SOURCE: &str = "CONFIG_ATIS_SRC";
pub const METAR_SOURCE: &str = "CONFIG_METAR_SRC";
pub const TAF_SOURCE: &str = "CONFIG_TAF_SRC";
pub const INIT_BARO_UNIT: &str = "CONFIG_INIT_BARO_UNIT";
pub const USING_METRIC_UNIT: &str = "CONFIG_USING_METRIC_UNIT";
pub const USING_PORTABLE_DEVICES: &str = "CONFIG_USING_PORTABLE_DEVICES";

pub const THRUST_REDUCTION_ALT: &str = "CONFIG_THR_RED_ALT";
pub const ACCELERATION_ALT: &str = "CONFIG_ACCEL_ALT";
pub const ENGINE_OUT_ACCELERATION_ALT: &str = "CONFIG_ENG_OUT_ACCEL_ALT";

pub const PTU_AUDIBLE: &str = "SOUND_PTU_AUDIBLE_COCKPIT";
pub const EXTERIOR_VOLUME: &str = "SOUND_EXTERIOR_MASTER";
pub const ENGINE_VOLUME: &str = "SOUND_INTERIOR_ENGINE";
pub const WIND_VOLUME: &str = "SOUND_INTERIOR_WIND";
pub const BRIGHTNESS: &str = "EFB_BRIGHTNESS";

pub const SIMBRIEF_USERNAME: &str = "SimbriefUsername";

pub const CHOICE_SETTINGS: &[ChoiceSetting] = &[
    ChoiceSetting {
        key: ALIGN_TIME,
        default: "REAL",
        choices: &[("Instant", "INSTANT"), ("Fast", "FAST"), ("Real", "REAL")],
    },
    ChoiceSetting {
        key: SELF_TEST_TIME,
        default: "12",
        choices: &[("Instant", "0"), ("Fast", "5"), ("Real", "12")],
    },
    ChoiceSetting {
        key: ATIS_SOURCE,
        default: "FAA",
        choices: &[
            ("FAA (US)", "FAA"),
            ("PilotEdge", "PILOTEDGE"),
            ("IVAO", "IVAO"),
            ("VATSIM", "VATSIM"),
        ],
    },
    ChoiceSetting {
        key: METAR_SOURCE,
        default: "MSFS",
        choices: &[
            ("MeteoBlue", "MSFS"),
            ("PilotEdge", "PILOTEDGE"),
            ("IVAO", "IVAO"),
            ("VATSIM", "VATSIM"),
        ],
    },
    ChoiceSetting {
        key: TAF_SOURCE,
        default: "NOAA",
        choices: &[("IVAO", "IVAO"), ("NOAA", "NOAA")],
    },
    ChoiceSetting {
        key: INIT_BARO_UNIT,
        default: "IN HG",
        choices: &[("Auto", "AUTO"), ("in Hg", "IN HG"), ("hPa", "HPA")],
    },
    ChoiceSetting {
        key: USING_METRIC_UNIT,
        default: "1",
        choices: &[("Kg", "1"), ("lbs", "0")],
    },
    ChoiceSetting {
        key: USING_PORTABLE_DEVICES,
        default: "0",
        choices: &[("No Portable Device", "0"), ("No Smoking", "1")],
    },
];

pub const RANGE_SETTINGS: &[RangeSetting] = &[
    RangeSetting {
        key: THRUST_REDUCTION_ALT,
        default: "1500",
        min: 400,
        max: 5000,
    },
    RangeSetting {
        key: ACCELERATION_ALT,
        default: "1500",
        min: 400,
        max: 10000,
    },
    RangeSetting {
        key: ENGINE_OUT_ACCELERATION_ALT,
        default: "1500",
        min: 400,
        max: 10000,
    },
];

pub const SYNCED_SETTINGS: &[SyncedSetting] = &[
    SyncedSetting {
        key: PTU_AUDIBLE,
        default: "0",
        variable_id: "L:A32NX_SOUND_PTU_AUDIBLE_COCKPIT",
        unit: "Bool",
    },
    SyncedSetting {
        key: EXTERIOR_VOLUME,
        default: "0",
        variable_id: "L:A32NX_SOUND_EXTERIOR_MASTER",
        unit: "number",
    },
    SyncedSetting {
        key: ENGINE_VOLUME,
        default: "0",
        variable_id: "L:A32NX_SOUND_INTERIOR_ENGINE",
        unit: "number",
    },
    SyncedSetting {
        key: WIND_VOLUME,
        default: "0",
        variable_id: "L:A32NX_SOUND_INTERIOR_WIND",
        unit: "number",
    },
    SyncedSetting {
        key: BRIGHTNESS,
        default: "100",
        variable_id: "L:A32NX_EFB_BRIGHTNESS",
        unit: "number",
    },
];

/// Volume sliders run 0..=100 around a stored value of -50..=50.
const VOLUME_SLIDER_OFFSET: i64 = 50;
const VOLUME_SLIDER_MAX: i64 = 100;

#[must_use]
pub fn choice_setting(key: &str) -> Option<&'static ChoiceSetting> {
    CHOICE_SETTINGS.iter().find(|s| s.key == key)
}

#[must_use]
pub fn range_setting(key: &str) -> Option<&'static RangeSetting> {
    RANGE_SETTINGS.iter().find(|s| s.key == key)
}

/// Register every catalog entry on `bridge`.
pub fn register_all(bridge: &PropertySyncBridge, poll_interval: Duration) {
    let mut registered = 0;

    let unbound = CHOICE_SETTINGS
        .iter()
        .map(|s| (s.key, s.default))
        .chain(RANGE_SETTINGS.iter().map(|s| (s.key, s.default)));
    for (key, default) in unbound {
        registered += usize::from(bridge.register(PropertyBinding::unbound(key, default)));
    }
    for setting in SYNCED_SETTINGS {
        registered += usize::from(bridge.register(PropertyBinding::bound(
            setting.key,
            setting.default,
            setting.variable_id,
            setting.unit,
            poll_interval,
        )));
    }
    registered += usize::from(bridge.register(PropertyBinding::unbound(SIMBRIEF_USERNAME, "")));

    info!("Registered {} panel settings", registered);
}

/// Edit operations for the settings page.
#[derive(Debug)]
pub struct SettingsPage {
    bridge: PropertySyncBridge,
    thrust_reduction: RangedSetting,
    acceleration: RangedSetting,
    engine_out_acceleration: RangedSetting,
}

impl SettingsPage {
    /// Build on a bridge that already holds the catalog.
    pub fn new(bridge: PropertySyncBridge) -> Result<Self, SyncError> {
        let ranged = |key: &str| -> Result<RangedSetting, SyncError> {
            let spec = range_setting(key)
                .ok_or_else(|| SyncError::UnknownProperty(key.to_string()))?;
            RangedSetting::new(&bridge, spec.key, spec.min, spec.max)
        };

        let thrust_reduction = ranged(THRUST_REDUCTION_ALT)?;
        let acceleration = ranged(ACCELERATION_ALT)?;
        let engine_out_acceleration = ranged(ENGINE_OUT_ACCELERATION_ALT)?;

        Ok(Self {
            bridge,
            thrust_reduction,
            acceleration,
            engine_out_acceleration,
        })
    }

    /// Select one of a choice setting's values.
    pub fn select(&self, key: &str, value: &str) -> Result<(), SyncError> {
        let setting =
            choice_setting(key).ok_or_else(|| SyncError::UnknownProperty(key.to_string()))?;
        if !setting.allows(value) {
            return Err(SyncError::InvalidChoice {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        debug!("{} -> {}", key, value);
        self.bridge.set(key, value)
    }

    /// Text typed into one of the altitude fields.
    pub fn input_altitude(&mut self, key: &str, text: &str) -> Result<(), SyncError> {
        let setting = match key {
            THRUST_REDUCTION_ALT => &mut self.thrust_reduction,
            ACCELERATION_ALT => &mut self.acceleration,
            ENGINE_OUT_ACCELERATION_ALT => &mut self.engine_out_acceleration,
            _ => return Err(SyncError::UnknownProperty(key.to_string())),
        };
        setting.input(&self.bridge, text)
    }

    /// What an altitude field currently shows.
    pub fn altitude_display(&self, key: &str) -> Result<&str, SyncError> {
        let setting = match key {
            THRUST_REDUCTION_ALT => &self.thrust_reduction,
            ACCELERATION_ALT => &self.acceleration,
            ENGINE_OUT_ACCELERATION_ALT => &self.engine_out_acceleration,
            _ => return Err(SyncError::UnknownProperty(key.to_string())),
        };
        Ok(setting.display_value())
    }

    pub fn set_ptu_audible(&self, audible: bool) -> Result<(), SyncError> {
        self.bridge.set(PTU_AUDIBLE, if audible { "1" } else { "0" })
    }

    pub fn ptu_audible(&self) -> Result<bool, SyncError> {
        let value = self.bridge.get(PTU_AUDIBLE)?;
        Ok(value.trim().parse::<f64>().is_ok_and(|v| v != 0.0))
    }

    /// Volume from a 0..=100 slider position.
    pub fn set_volume_from_slider(&self, key: &str, slider: i64) -> Result<(), SyncError> {
        if !matches!(key, EXTERIOR_VOLUME | ENGINE_VOLUME | WIND_VOLUME) {
            return Err(SyncError::UnknownProperty(key.to_string()));
        }
        if !(0..=VOLUME_SLIDER_MAX).contains(&slider) {
            return Err(SyncError::OutOfRange {
                key: key.to_string(),
                value: slider.to_string(),
                min: 0,
                max: VOLUME_SLIDER_MAX,
            });
        }
        self.bridge
            .set(key, &(slider - VOLUME_SLIDER_OFFSET).to_string())
    }

    /// Slider position for a stored volume.
    pub fn volume_slider(&self, key: &str) -> Result<i64, SyncError> {
        let value = self.bridge.get(key)?;
        Ok(value.trim().parse::<i64>().unwrap_or_default() + VOLUME_SLIDER_OFFSET)
    }

    pub fn set_brightness(&self, brightness: i64) -> Result<(), SyncError> {
        self.bridge.set(BRIGHTNESS, &brightness.to_string())
    }

    pub fn set_simbrief_username(&self, username: &str) -> Result<(), SyncError> {
        self.bridge.set(SIMBRIEF_USERNAME, username)
    }

    pub fn get(&self, key: &str) -> Result<String, SyncError> {
        self.bridge.get(key)
    }
}
