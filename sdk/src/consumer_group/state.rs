use crate::error::TickerError;
use std::sync::{Mutex, PoisonError};
use strum::Display;
use tracing::debug;

/// Lifecycle of a consumer-group member.
///
/// ```text
/// Created -> Joining -> SessionActive -> Rebalancing -> Joining
///                                     -> ShutdownRequested -> Closing -> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConsumerState {
    Created,
    Joining,
    SessionActive,
    Rebalancing,
    ShutdownRequested,
    Closing,
    Closed,
}

impl ConsumerState {
    pub fn can_transition_to(self, next: ConsumerState) -> bool {
        use ConsumerState::*;
        matches!(
            (self, next),
            (Created, Joining)
                | (Created, Closing)
                | (Joining, SessionActive)
                | (Joining, ShutdownRequested)
                | (Joining, Closing)
                | (SessionActive, Rebalancing)
                | (SessionActive, ShutdownRequested)
                | (SessionActive, Closing)
                | (Rebalancing, Joining)
                | (ShutdownRequested, Closing)
                | (Closing, Closed)
        )
    }
}

/// Current [`ConsumerState`], guarded against invalid transitions.
#[derive(Debug)]
pub struct StateTracker {
    state: Mutex<ConsumerState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    pub fn new() -> Self {
        StateTracker {
            state: Mutex::new(ConsumerState::Created),
        }
    }

    pub fn current(&self) -> ConsumerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `next`. Staying in the current state is always accepted.
    pub fn transition(&self, next: ConsumerState) -> Result<(), TickerError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = *state;
        if current == next {
            return Ok(());
        }

        if !current.can_transition_to(next) {
            return Err(TickerError::InvalidStateTransition {
                from: current,
                to: next,
            });
        }

        debug!("Consumer state: {current} -> {next}");
        *state = next;
        Ok(())
    }
}
