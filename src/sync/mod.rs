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


//! Property synchronization.
//!
//! The [`PropertySyncBridge`] is the only writer of both the property store
//! and, for bound properties, the simulator variable. A local write goes to
//! the store first and to the simulator last; the poll tick that follows is
//! treated as the echo of that write.

mod bridge;
mod property;
mod ranged;

pub use bridge::{PropertySubscription, PropertySyncBridge};
pub use property::{LiveVariableBinding, Property, PropertyBinding};
pub use ranged::{parse_leading_integer, RangedSetting};
