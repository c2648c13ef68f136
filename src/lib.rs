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


//! Data layer for an in-cockpit tablet panel.
//!
//! - [`persistence`]: durable key/value store for panel properties
//! - [`simvar`]: simulator live variables and interval polling
//! - [`sync`]: keeps properties and live variables consistent
//! - [`feeds`]: flight plan and weather fetchers
//! - [`normalize`]: provider payloads to canonical records
//! - [`settings`]: the settings catalog and its edit rules
//! - [`dashboard`]: consumers of the feeds and live flight data

pub mod config;
pub mod dashboard;
pub mod error;
pub mod feeds;
pub mod normalize;
pub mod persistence;
pub mod settings;
pub mod simvar;
pub mod status;
pub mod sync;

pub use error::{FeedError, StoreError, SyncError};
