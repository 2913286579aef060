use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::session::{FinishReason, Progress, SessionConfig};

/// Game state shared between the dispatcher and the timer thread
pub type SharedState = Arc<Mutex<GameState>>;

/// Lock the shared state. A panicked holder leaves the record intact,
/// so a poisoned lock is taken over rather than propagated.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, GameState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Typed symbol differs from the current target; nothing changed.
    Mismatch,
    /// Target accepted, more symbols remain.
    Advanced,
    /// Target accepted and the sequence is now empty.
    Completed,
    /// The session already finished (or had nothing to type).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Running,
    /// This tick reached the time limit and ended the session.
    Expired,
    /// The session had already ended before this tick.
    Finished,
}

pub struct GameState {
    config: SessionConfig,
    sequence: VecDeque<char>,
    progress: Progress,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("config", &self.config)
            .field("sequence", &self.sequence)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl GameState {
    pub fn new(config: SessionConfig, sequence: Vec<char>) -> Self {
        Self::with_rng(config, sequence, StdRng::from_entropy())
    }

    pub fn with_rng<R: RngCore + Send + 'static>(
        config: SessionConfig,
        sequence: Vec<char>,
        rng: R,
    ) -> Self {
        Self {
            config,
            sequence: sequence.into(),
            progress: Progress::default(),
            rng: Box::new(rng),
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn remaining(&self) -> usize {
        self.sequence.len()
    }

    pub fn finished(&self) -> Option<FinishReason> {
        self.progress.finished
    }

    pub fn current_target(&self) -> Option<char> {
        self.sequence.front().copied()
    }

    pub fn next_target(&self) -> Option<char> {
        self.sequence.get(1).copied()
    }

    /// Consume the current target and count it.
    ///
    /// In time-limited mode the symbol goes back into the queue at a uniformly
    /// random position, so the length never changes. Returns whether the
    /// sequence is now empty.
    pub fn record_match(&mut self) -> bool {
        let Some(symbol) = self.sequence.pop_front() else {
            return true;
        };

        if self.config.mode.is_time_limited() {
            let at = self.rng.gen_range(0..=self.sequence.len());
            self.sequence.insert(at, symbol);
        }

        self.progress.symbols_typed += 1;
        self.sequence.is_empty()
    }

    /// Compare a typed character against the current target.
    pub fn try_match(&mut self, c: char) -> MatchOutcome {
        if self.progress.finished.is_some() {
            return MatchOutcome::Ignored;
        }
        match self.current_target() {
            None => MatchOutcome::Ignored,
            Some(target) if target != c => MatchOutcome::Mismatch,
            Some(_) => {
                if self.record_match() {
                    MatchOutcome::Completed
                } else {
                    MatchOutcome::Advanced
                }
            }
        }
    }

    /// Record elapsed time; in time-limited mode ends the session at the limit.
    pub fn tick(&mut self, elapsed_secs: u64) -> TickStatus {
        if self.progress.finished.is_some() {
            return TickStatus::Finished;
        }
        self.progress.elapsed_secs = self.progress.elapsed_secs.max(elapsed_secs);

        match self.config.mode.limit_secs() {
            Some(limit) if self.progress.elapsed_secs >= limit => {
                self.progress.finished = Some(FinishReason::TimeExpired);
                TickStatus::Expired
            }
            _ => TickStatus::Running,
        }
    }

    /// Declare the session over. Only the first call has an effect; it also
    /// records the final elapsed time. Returns whether this call ended it.
    pub fn finish(&mut self, reason: FinishReason, elapsed_secs: u64) -> bool {
        if self.progress.finished.is_some() {
            return false;
        }
        self.progress.elapsed_secs = self.progress.elapsed_secs.max(elapsed_secs);
        self.progress.finished = Some(reason);
        true
    }
}
