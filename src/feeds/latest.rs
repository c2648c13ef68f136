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


use std::sync::{Mutex, PoisonError};

use log::debug;
use tokio::sync::watch;

/// Sequence number of one request against a [`LatestSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

/// Holds the result of the most recently started request.
///
/// A result is applied only if no newer request was started after it, so a
/// slow response for an old identifier can never overwrite a newer one.
#[derive(Debug)]
pub struct LatestSlot<T> {
    issued: Mutex<u64>,
    value_tx: watch::Sender<T>,
}

impl<T> LatestSlot<T> {
    pub fn new(initial: T) -> Self {
        let (value_tx, _) = watch::channel(initial);
        Self {
            issued: Mutex::new(0),
            value_tx,
        }
    }

    /// Start a request. Any earlier ticket becomes stale.
    pub fn begin(&self) -> RequestTicket {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        *issued += 1;
        RequestTicket(*issued)
    }

    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        *self.issued.lock().unwrap_or_else(PoisonError::into_inner) == ticket.0
    }

    /// Store `value` if `ticket` is still the latest. Returns whether it was applied.
    pub fn apply(&self, ticket: RequestTicket, value: T) -> bool {
        let issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        if *issued != ticket.0 {
            debug!("Dropping stale result #{} (latest #{})", ticket.0, *issued);
            return false;
        }
        self.value_tx.send_replace(value);
        true
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.value_tx.subscribe()
    }
}

impl<T: Clone> LatestSlot<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.value_tx.borrow().clone()
    }
}

impl<T: Default> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let slot = LatestSlot::new(String::new());
        let first = slot.begin();
        let second = slot.begin();

        assert!(slot.apply(second, "EGLL".to_string()));
        assert!(!slot.apply(first, "LFPG".to_string()));
        assert_eq!(slot.get(), "EGLL");
    }

    #[test]
    fn test_stale_ticket_after_newer_begin() {
        let slot = LatestSlot::new(0);
        let ticket = slot.begin();
        assert!(slot.is_current(ticket));

        let _newer = slot.begin();
        assert!(!slot.is_current(ticket));
        assert!(!slot.apply(ticket, 7));
        assert_eq!(slot.get(), 0);
    }

    #[test]
    fn test_subscriber_sees_applied_value() {
        let slot: LatestSlot<u32> = LatestSlot::default();
        let mut value_rx = slot.subscribe();

        let ticket = slot.begin();
        slot.apply(ticket, 5);
        assert!(value_rx.has_changed().unwrap());
        assert_eq!(*value_rx.borrow_and_update(), 5);
    }
}
