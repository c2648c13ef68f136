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


//! Interval polling of a single live variable.

use std::time::Duration;

use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{SharedVariableSource, SimValue};

/// Handle to a background task polling one live variable.
///
/// Each poll waits for the previous value to be received before the next one
/// starts, so at most one value is in flight. Duplicates are delivered as-is.
/// Dropping the handle stops the task.
pub struct VariableStream {
    value_rx: mpsc::Receiver<SimValue>,
    cancel_token: CancellationToken,
    variable_id: String,
}

impl std::fmt::Debug for VariableStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableStream")
            .field("variable_id", &self.variable_id)
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl VariableStream {
    /// Spawn the polling task. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        source: SharedVariableSource,
        variable_id: &str,
        unit: &str,
        poll_interval: Duration,
    ) -> Self {
        let (value_tx, value_rx) = mpsc::channel(1);
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        let id = variable_id.to_string();
        let unit = unit.to_string();

        tokio::spawn(async move {
            poll_loop(source, id, unit, poll_interval, value_tx, task_cancel).await;
        });

        Self {
            value_rx,
            cancel_token,
            variable_id: variable_id.to_string(),
        }
    }

    /// Receive the next polled value.
    ///
    /// Returns `None` once the stream has been cancelled.
    pub async fn recv(&mut self) -> Option<SimValue> {
        self.value_rx.recv().await
    }

    #[must_use]
    pub fn variable_id(&self) -> &str {
        &self.variable_id
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for VariableStream {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop(
    source: SharedVariableSource,
    variable_id: String,
    unit: String,
    poll_interval: Duration,
    value_tx: mpsc::Sender<SimValue>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let value = tokio::select! {
            biased;
            () = cancel_token.cancelled() => break,
            value = source.read(&variable_id, &unit) => value,
        };

        let Some(value) = value else {
            trace!("No value for {} this tick", variable_id);
            continue;
        };

        let sent = tokio::select! {
            biased;
            () = cancel_token.cancelled() => false,
            result = value_tx.send(value) => result.is_ok(),
        };
        if !sent {
            break; // Receiver dropped
        }
    }

    debug!("Stopped polling {}", variable_id);
}
