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


//! External data feeds.
//!
//! Each fetch is a single request with no retry. Results are applied through
//! a [`LatestSlot`] so that only the most recently started request for a
//! consumer can land.

mod dispatch;
mod latest;
mod transport;
mod weather;

pub use dispatch::DispatchFetcher;
pub use latest::{LatestSlot, RequestTicket};
pub use transport::{FeedTransport, HttpTransport};
pub use weather::{validate_icao, WeatherFetcher, NO_AIRPORT};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::FeedTransport;
    use crate::error::FeedError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Request {
        pub url: String,
        pub query: Vec<(String, String)>,
    }

    #[derive(Debug, Clone)]
    struct Response {
        delay: Duration,
        result: Result<String, u16>,
    }

    /// Canned responses keyed by URL. Unknown URLs answer 404.
    #[derive(Debug, Default)]
    pub(crate) struct FakeTransport {
        responses: Mutex<HashMap<String, Response>>,
        requests: Mutex<Vec<Request>>,
    }

    impl FakeTransport {
        pub(crate) fn respond(&self, url: &str, body: &str) {
            self.respond_after(url, Duration::ZERO, body);
        }

        pub(crate) fn respond_after(&self, url: &str, delay: Duration, body: &str) {
            self.responses.lock().unwrap().insert(
                url.to_string(),
                Response {
                    delay,
                    result: Ok(body.to_string()),
                },
            );
        }

        pub(crate) fn fail(&self, url: &str, status: u16) {
            self.responses.lock().unwrap().insert(
                url.to_string(),
                Response {
                    delay: Duration::ZERO,
                    result: Err(status),
                },
            );
        }

        pub(crate) fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedTransport for FakeTransport {
        async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FeedError> {
            self.requests.lock().unwrap().push(Request {
                url: url.to_string(),
                query: query
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            });

            let response = self.responses.lock().unwrap().get(url).cloned();
            let Some(response) = response else {
                return Err(FeedError::Status(404));
            };

            if !response.delay.is_zero() {
                tokio::time::sleep(response.delay).await;
            }
            response.result.map_err(FeedError::Status)
        }
    }
}
