//! Sliding-window rate gate for autonomous actions.
//!
//! Bounds how many pipeline runs the patrol may start per trailing window.
//! Unlike the latched breaker pattern there is no half-open probing: the gate
//! closes again on its own as old actions age out of the window.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{ConfigurationError, RateExceeded};
use crate::domain::models::RateGateConfig;
use crate::domain::ports::Clock;

/// Derived state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Actions may proceed.
    Closed,
    /// The window is full; actions are blocked.
    Open,
}

impl GateState {
    /// Lowercase label used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
        }
    }
}

/// Sliding-window counter of autonomous actions.
///
/// Whether the gate is open depends only on the recorded timestamps and the
/// clock's current time.
pub struct RateGate {
    window: chrono::Duration,
    max_actions: u32,
    clock: Arc<dyn Clock>,
    actions: Mutex<VecDeque<DateTime<Utc>>>,
}

impl RateGate {
    /// Create a gate allowing `max_actions` per trailing `window`.
    pub fn new(
        window: Duration,
        max_actions: u32,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        if window.is_zero() {
            return Err(ConfigurationError::InvalidWindow(window));
        }
        if max_actions == 0 {
            return Err(ConfigurationError::InvalidCeiling(max_actions));
        }
        let window = chrono::Duration::from_std(window)
            .map_err(|_| ConfigurationError::InvalidWindow(window))?;

        Ok(Self {
            window,
            max_actions,
            clock,
            actions: Mutex::new(VecDeque::new()),
        })
    }

    /// Gate from the `rate_gate` config section.
    pub fn from_config(
        config: &RateGateConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(config.window(), config.max_actions, clock)
    }

    /// True iff fewer than `max_actions` actions fall in the trailing window.
    pub fn can_proceed(&self) -> bool {
        self.recent_actions() < self.max_actions as usize
    }

    /// `Ok` if an action may proceed, otherwise the gate's current load.
    pub fn check(&self) -> Result<(), RateExceeded> {
        let recent_actions = self.recent_actions();
        if recent_actions < self.max_actions as usize {
            return Ok(());
        }
        Err(RateExceeded {
            recent_actions,
            max_actions: self.max_actions,
            window_secs: self.window.num_seconds(),
            reopens_at: self.reopens_at(),
        })
    }

    /// Record an action at the current instant.
    ///
    /// Pruning and the append happen under one lock.
    pub fn register_action(&self) {
        let now = self.clock.now();
        let mut actions = self.lock();
        Self::prune(&mut actions, now, self.window);
        actions.push_back(now);

        tracing::debug!(
            recent_actions = actions.len(),
            max_actions = self.max_actions,
            "rate gate action registered"
        );
    }

    /// Number of actions in the trailing window.
    pub fn recent_actions(&self) -> usize {
        let now = self.clock.now();
        let mut actions = self.lock();
        Self::prune(&mut actions, now, self.window);
        actions.len()
    }

    /// `Open` when the window is full, `Closed` otherwise.
    pub fn state(&self) -> GateState {
        if self.can_proceed() {
            GateState::Closed
        } else {
            GateState::Open
        }
    }

    /// When the oldest action in the window expires, if the gate is open.
    pub fn reopens_at(&self) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        let mut actions = self.lock();
        Self::prune(&mut actions, now, self.window);
        if actions.len() < self.max_actions as usize {
            return None;
        }
        // The gate stays open until enough entries expire to drop below the ceiling.
        let blocking = actions.len() - self.max_actions as usize;
        actions.get(blocking).map(|oldest| *oldest + self.window)
    }

    /// Ceiling on actions per window.
    pub fn max_actions(&self) -> u32 {
        self.max_actions
    }

    /// Length of the trailing window.
    pub fn window(&self) -> chrono::Duration {
        self.window
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DateTime<Utc>>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(actions: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>, window: chrono::Duration) {
        let cutoff = now - window;
        while actions.front().is_some_and(|at| *at <= cutoff) {
            actions.pop_front();
        }
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("window", &self.window)
            .field("max_actions", &self.max_actions)
            .field("recent_actions", &self.recent_actions())
            .finish_non_exhaustive()
    }
}
