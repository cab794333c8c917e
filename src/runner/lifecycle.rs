use std::fmt;

use tracing::debug;

/// Orchestrator states, in the only order they may be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Idle,
    Running,
    Draining,
    Terminated,
}

impl RunState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Terminated => "terminated",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            RunState::Idle => Some(RunState::Running),
            RunState::Running => Some(RunState::Draining),
            RunState::Draining => Some(RunState::Terminated),
            RunState::Terminated => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Tracks the orchestrator state and rejects out-of-order transitions.
#[derive(Debug)]
pub struct Lifecycle {
    state: RunState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Moves to the next state. Returns `false`, leaving the state as is,
    /// when `to` is not the immediate successor.
    pub fn advance(&mut self, to: RunState) -> bool {
        if self.state.next() != Some(to) {
            debug!("Ignoring run transition {} -> {}", self.state, to);
            return false;
        }
        debug!("Run state {} -> {}", self.state, to);
        self.state = to;
        true
    }
}
