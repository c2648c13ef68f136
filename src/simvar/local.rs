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


use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use log::debug;

use super::{LiveVariableSource, SimValue};

/// A write issued through [`LiveVariableSource::write`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariableWrite {
    pub variable_id: String,
    pub unit: String,
    pub value: SimValue,
}

/// In-process variable space.
///
/// Stands in for the simulator when none is attached. Writes are applied
/// immediately and recorded in order.
#[derive(Debug, Default)]
pub struct LocalVariableSource {
    variables: RwLock<HashMap<String, SimValue>>,
    writes: Mutex<Vec<VariableWrite>>,
}

impl LocalVariableSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a variable from the simulator side. Not recorded as a write.
    pub fn inject(&self, variable_id: &str, value: SimValue) {
        self.variables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(variable_id.to_string(), value);
    }

    /// Current value without going through a poll.
    #[must_use]
    pub fn value(&self, variable_id: &str) -> Option<SimValue> {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(variable_id)
            .cloned()
    }

    /// Every write issued so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<VariableWrite> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LiveVariableSource for LocalVariableSource {
    async fn read(&self, variable_id: &str, _unit: &str) -> Option<SimValue> {
        self.value(variable_id)
    }

    fn write(&self, variable_id: &str, unit: &str, value: SimValue) {
        debug!("{} ({}) <- {}", variable_id, unit, value);
        self.inject(variable_id, value.clone());
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(VariableWrite {
                variable_id: variable_id.to_string(),
                unit: unit.to_string(),
                value,
            });
    }
}
