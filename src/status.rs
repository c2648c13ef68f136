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


//! Feed health and diagnostics.
//!
//! Tracks the outcome of every fetch per feed plus a bounded log of
//! diagnostic messages, for display on the panel's status page.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const MAX_DIAGNOSTICS: usize = 50;

/// State of the most recent fetch for a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
    Succeeded,
    Failed,
}

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Per-feed fetch statistics
#[derive(Debug, Clone)]
pub struct FeedHealth {
    /// Feed display name
    pub name: String,

    pub state: FetchState,

    /// Last error message (if any)
    pub last_error: Option<String>,

    pub success_count: u64,
    pub failure_count: u64,

    /// Results dropped because a newer request had started
    pub stale_count: u64,

    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl FeedHealth {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: FetchState::Idle,
            last_error: None,
            success_count: 0,
            failure_count: 0,
            stale_count: 0,
            last_attempt_at: None,
            last_success_at: None,
        }
    }

    /// Seconds since the last successful fetch
    #[must_use]
    pub fn age_seconds(&self) -> Option<i64> {
        self.last_success_at
            .map(|at| (Utc::now() - at).num_seconds())
    }
}

/// Status of all feeds and the diagnostic log
#[derive(Debug)]
pub struct PanelStatus {
    pub feeds: BTreeMap<String, FeedHealth>,

    // Diagnostic messages (keep last 50)
    pub diagnostics: VecDeque<DiagnosticMessage>,
    max_diagnostics: usize,
}

impl Default for PanelStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelStatus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            feeds: BTreeMap::new(),
            diagnostics: VecDeque::with_capacity(MAX_DIAGNOSTICS),
            max_diagnostics: MAX_DIAGNOSTICS,
        }
    }

    #[must_use]
    pub fn shared() -> SharedPanelStatus {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Health of `name`, registering the feed on first use
    pub fn feed_mut(&mut self, name: &str) -> &mut FeedHealth {
        self.feeds
            .entry(name.to_string())
            .or_insert_with(|| FeedHealth::new(name))
    }

    #[must_use]
    pub fn feed(&self, name: &str) -> Option<&FeedHealth> {
        self.feeds.get(name)
    }

    pub fn record_attempt(&mut self, name: &str) {
        let feed = self.feed_mut(name);
        feed.state = FetchState::Fetching;
        feed.last_attempt_at = Some(Utc::now());
    }

    pub fn record_success(&mut self, name: &str) {
        let feed = self.feed_mut(name);
        feed.state = FetchState::Succeeded;
        feed.success_count += 1;
        feed.last_success_at = Some(Utc::now());
        feed.last_error = None;
    }

    /// Record a failed fetch
    pub fn record_failure(&mut self, name: &str, error: &str) {
        let feed = self.feed_mut(name);
        feed.state = FetchState::Failed;
        feed.failure_count += 1;
        feed.last_error = Some(error.to_string());

        self.add_diagnostic(DiagnosticLevel::Error, format!("[{name}] {error}"));
    }

    pub fn record_stale(&mut self, name: &str) {
        self.feed_mut(name).stale_count += 1;
    }

    /// Add a diagnostic message
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        let diagnostic = DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        };

        self.diagnostics.push_back(diagnostic);

        // Keep only the last N messages
        while self.diagnostics.len() > self.max_diagnostics {
            self.diagnostics.pop_front();
        }
    }
}

/// Thread-safe shared status
pub type SharedPanelStatus = Arc<Mutex<PanelStatus>>;

/// Lock the shared status, recovering it if a previous holder panicked.
pub fn lock_status(status: &SharedPanelStatus) -> MutexGuard<'_, PanelStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_clears_error() {
        let mut status = PanelStatus::new();
        status.record_attempt("dispatch");
        assert_eq!(status.feed("dispatch").unwrap().state, FetchState::Fetching);

        status.record_failure("dispatch", "HTTP error: 500");
        let feed = status.feed("dispatch").unwrap();
        assert_eq!(feed.state, FetchState::Failed);
        assert_eq!(feed.last_error.as_deref(), Some("HTTP error: 500"));

        status.record_success("dispatch");
        let feed = status.feed("dispatch").unwrap();
        assert_eq!(feed.state, FetchState::Succeeded);
        assert_eq!((feed.success_count, feed.failure_count), (1, 1));
        assert!(feed.last_error.is_none());
        assert!(feed.age_seconds().is_some());
    }

    #[test]
    fn test_diagnostics_are_bounded() {
        let mut status = PanelStatus::new();
        for i in 0..(MAX_DIAGNOSTICS + 10) {
            status.add_diagnostic(DiagnosticLevel::Info, format!("message {i}"));
        }
        assert_eq!(status.diagnostics.len(), MAX_DIAGNOSTICS);
        assert_eq!(status.diagnostics.front().unwrap().message, "message 10");
    }
}
