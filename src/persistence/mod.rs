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


//! Persistent key/value store for panel properties.
//!
//! Values are opaque strings. A read of a missing key materializes the
//! supplied default, so every property has a value once it has been read.

mod file;
mod memory;

pub use file::FilePropertyStore;
pub use memory::MemoryPropertyStore;

use std::sync::Arc;

/// Durable string store shared by the whole process.
pub trait PropertyStore: Send + Sync + std::fmt::Debug {
    /// Return the stored value, or persist and return `default` if the key is absent.
    fn get(&self, key: &str, default: &str) -> String;

    /// Write through. Visible to every subsequent `get`.
    fn set(&self, key: &str, value: &str);

    /// Whether a value has been stored for `key`.
    fn contains(&self, key: &str) -> bool;
}

/// Shared handle to the process-wide store.
pub type SharedPropertyStore = Arc<dyn PropertyStore>;
