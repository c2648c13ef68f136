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


use log::{debug, info, warn};
use tokio::sync::watch;

use crate::feeds::{DispatchFetcher, LatestSlot};
use crate::normalize::DispatchRecord;
use crate::settings::SIMBRIEF_USERNAME;
use crate::status::{lock_status, SharedPanelStatus};
use crate::sync::PropertySyncBridge;

const FEED_NAME: &str = "dispatch";

/// The current flight plan, fetched for the configured SimBrief user.
#[derive(Debug)]
pub struct DispatchFeed {
    fetcher: DispatchFetcher,
    bridge: PropertySyncBridge,
    slot: LatestSlot<DispatchRecord>,
    status: SharedPanelStatus,
}

impl DispatchFeed {
    pub fn new(
        fetcher: DispatchFetcher,
        bridge: PropertySyncBridge,
        status: SharedPanelStatus,
    ) -> Self {
        Self {
            fetcher,
            bridge,
            slot: LatestSlot::new(DispatchRecord::placeholder()),
            status,
        }
    }

    /// Fetch the latest plan.
    ///
    /// Returns the record that is now shown, or `None` when nothing changed
    /// because no username is configured or a newer refresh overtook this one.
    /// A failed fetch shows the placeholder.
    pub async fn refresh(&self) -> Option<DispatchRecord> {
        let username = self.bridge.get(SIMBRIEF_USERNAME).unwrap_or_default();
        if username.trim().is_empty() {
            debug!("No SimBrief username configured");
            return None;
        }
        let ticket = self.slot.begin();

        lock_status(&self.status).record_attempt(FEED_NAME);

        let record = match self.fetcher.fetch(&username).await {
            Ok(Some(record)) => {
                info!(
                    "Loaded flight plan {}{} {} -> {}",
                    record.airline,
                    record.flight_number,
                    record.origin.icao,
                    record.destination.icao
                );
                lock_status(&self.status).record_success(FEED_NAME);
                record
            }
            Ok(None) => return None,
            Err(e) => {
                warn!("Dispatch fetch for {} failed: {}", username, e);
                lock_status(&self.status).record_failure(FEED_NAME, &e.to_string());
                DispatchRecord::placeholder()
            }
        };

        if self.slot.apply(ticket, record.clone()) {
            Some(record)
        } else {
            lock_status(&self.status).record_stale(FEED_NAME);
            None
        }
    }

    #[must_use]
    pub fn record(&self) -> DispatchRecord {
        self.slot.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DispatchRecord> {
        self.slot.subscribe()
    }
}
