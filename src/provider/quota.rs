//! Rolling-Window Request Quota
//!
//! Tracks how many requests the free tier has consumed in the current
//! window. The window rolls forward relative to the last reset time, not
//! calendar-day boundaries. All time-dependent operations take an explicit
//! `now` so tests can inject fixed clocks.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

use crate::constants::quota;

// =============================================================================
// Quota State
// =============================================================================

/// Counter of requests consumed against a rolling window.
///
/// `used` is monotonically non-decreasing within a window and resets to zero
/// exactly once per elapsed window, never retroactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub used: u32,
    pub window_start: DateTime<Utc>,
}

impl QuotaState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            used: 0,
            window_start: now,
        }
    }

    /// Reset the counter and advance the window start if the window has
    /// elapsed since the last reset.
    pub fn roll(&mut self, now: DateTime<Utc>, window: Duration) {
        if now - self.window_start > window {
            self.used = 0;
            self.window_start = now;
        }
    }

    /// When the current window ends and the counter resets.
    pub fn next_reset(&self, window: Duration) -> DateTime<Utc> {
        self.window_start + window
    }
}

// =============================================================================
// Tier Quota
// =============================================================================

/// Thread-safe quota owned by a router tier.
///
/// Admission and consumption are separate steps: the router checks `admit`
/// before attempting the provider and calls `record_use` only after a
/// successful call, so failed attempts never consume quota. Two racing calls
/// may both be admitted at `used == limit - 1`; enforcement is best-effort by
/// design.
#[derive(Debug)]
pub struct TierQuota {
    limit: u32,
    window: Duration,
    state: Mutex<QuotaState>,
}

impl TierQuota {
    pub fn new(limit: u32, window: Duration, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(QuotaState::new(now)),
        }
    }

    /// Standard free-tier quota: 1500 requests per rolling 24 hours.
    pub fn daily_free(now: DateTime<Utc>) -> Self {
        Self::new(
            quota::DAILY_FREE_LIMIT,
            Duration::hours(quota::WINDOW_HOURS),
            now,
        )
    }

    /// Roll the window if elapsed, then check whether another request fits.
    pub fn admit(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        state.roll(now, self.window);
        state.used < self.limit
    }

    /// Count one successful request against the current window.
    pub fn record_use(&self, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.roll(now, self.window);
        state.used += 1;
    }

    /// Snapshot of the current state, rolled to `now` first.
    pub fn snapshot(&self, now: DateTime<Utc>) -> QuotaState {
        let mut state = self.lock();
        state.roll(now, self.window);
        *state
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QuotaState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::error!("quota state mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
