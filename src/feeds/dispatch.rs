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


use std::sync::Arc;

use log::{debug, info};

use super::FeedTransport;
use crate::error::FeedError;
use crate::normalize::{try_normalize_dispatch, DispatchRecord};

/// Fetches the latest flight plan for a SimBrief user.
#[derive(Debug, Clone)]
pub struct DispatchFetcher {
    transport: Arc<dyn FeedTransport>,
    url: String,
}

impl DispatchFetcher {
    pub fn new(transport: Arc<dyn FeedTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// Fetch and normalize the user's latest plan.
    ///
    /// An empty username is not an error: nothing is fetched and `Ok(None)`
    /// is returned so the caller keeps its previous record.
    pub async fn fetch(&self, username: &str) -> Result<Option<DispatchRecord>, FeedError> {
        let username = username.trim();
        if username.is_empty() {
            debug!("No SimBrief username configured, skipping dispatch fetch");
            return Ok(None);
        }

        info!("Fetching dispatch data for {}", username);
        let body = self
            .transport
            .get_text(&self.url, &[("username", username), ("json", "1")])
            .await?;

        try_normalize_dispatch(&body).map(Some)
    }
}
