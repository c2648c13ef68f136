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


use std::time::Duration;

/// A named, persisted panel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub default_value: String,
    /// Last value the bridge committed or observed.
    pub current_value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, default_value: impl Into<String>) -> Self {
        let default_value = default_value.into();
        Self {
            key: key.into(),
            current_value: default_value.clone(),
            default_value,
        }
    }
}

/// Association between a property and a simulator variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveVariableBinding {
    pub property_key: String,
    pub variable_id: String,
    pub unit: String,
    pub poll_interval: Duration,
}

/// A property, optionally mirrored by a live variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyBinding {
    Unbound(Property),
    Bound(Property, LiveVariableBinding),
}

impl PropertyBinding {
    pub fn unbound(key: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self::Unbound(Property::new(key, default_value))
    }

    pub fn bound(
        key: impl Into<String>,
        default_value: impl Into<String>,
        variable_id: impl Into<String>,
        unit: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let property = Property::new(key, default_value);
        let live = LiveVariableBinding {
            property_key: property.key.clone(),
            variable_id: variable_id.into(),
            unit: unit.into(),
            poll_interval,
        };
        Self::Bound(property, live)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.property().key
    }

    #[must_use]
    pub fn property(&self) -> &Property {
        match self {
            Self::Unbound(property) | Self::Bound(property, _) => property,
        }
    }

    pub fn property_mut(&mut self) -> &mut Property {
        match self {
            Self::Unbound(property) | Self::Bound(property, _) => property,
        }
    }

    #[must_use]
    pub fn live(&self) -> Option<&LiveVariableBinding> {
        match self {
            Self::Unbound(_) => None,
            Self::Bound(_, live) => Some(live),
        }
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_shares_key() {
        let binding = PropertyBinding::bound(
            "EFB_BRIGHTNESS",
            "100",
            "L:A32NX_EFB_BRIGHTNESS",
            "number",
            Duration::from_millis(500),
        );
        assert!(binding.is_bound());
        assert_eq!(binding.key(), "EFB_BRIGHTNESS");
        assert_eq!(binding.live().unwrap().property_key, "EFB_BRIGHTNESS");
        assert_eq!(binding.property().current_value, "100");
    }

    #[test]
    fn test_unbound_has_no_live_side() {
        let binding = PropertyBinding::unbound("SimbriefUsername", "");
        assert!(!binding.is_bound());
        assert!(binding.live().is_none());
    }
}
