//! The session event loop.
//!
//! The dispatcher owns the terminal. The timer and key reader threads only
//! mutate the shared state (timer) or forward input (reader); both report
//! through one channel, so a single blocking `recv` waits on every source.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use ratatui::{backend::Backend, Terminal};

use crate::{
    error::DrillError,
    runtime::{FixedTicker, GameEvent, InputEvent, InputReader, KeySource, Timer},
    session::{FinishReason, SessionOutcome},
    state::{lock_state, MatchOutcome, SharedState},
    ui::View,
};

pub struct Dispatcher<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    state: SharedState,
    ticker: FixedTicker,
    reader_poll: Duration,
}

impl<'a, B: Backend> Dispatcher<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, state: SharedState) -> Self {
        Self {
            terminal,
            state,
            ticker: FixedTicker::every_second(),
            reader_poll: crate::runtime::READER_POLL,
        }
    }

    /// Override the timer interval (tests run faster than once per second).
    pub fn with_ticker(mut self, ticker: FixedTicker) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn with_reader_poll(mut self, poll: Duration) -> Self {
        self.reader_poll = poll;
        self
    }

    /// Run the session until it finishes, then report the final statistics.
    pub fn run<K: KeySource>(mut self, keys: K) -> Result<SessionOutcome, DrillError> {
        let started = Instant::now();

        {
            let mut state = lock_state(&self.state);
            if state.current_target().is_none() {
                state.finish(FinishReason::AllTyped, 0);
            }
        }
        self.draw()?;

        let (tx, rx) = mpsc::channel();
        let timer = Timer::spawn(Arc::clone(&self.state), tx.clone(), self.ticker, started);
        let reader = InputReader::spawn(keys, tx, self.reader_poll);

        let looped = self.event_loop(&rx, started);

        timer.stop();
        reader.stop();
        let reader_error = looped?;

        self.draw()?;

        let state = lock_state(&self.state);
        let progress = state.progress();
        let outcome = SessionOutcome {
            reason: progress.finished.unwrap_or(FinishReason::ReaderError),
            symbols_typed: progress.symbols_typed,
            elapsed_secs: progress.elapsed_secs,
            reader_error,
        };
        info!(
            "session finished: {} ({} typed in {}s)",
            outcome.reason, outcome.symbols_typed, outcome.elapsed_secs
        );
        Ok(outcome)
    }

    /// Consume events until the session is finished. Yields the reader's
    /// failure message, if that is what ended it.
    fn event_loop(
        &mut self,
        rx: &Receiver<GameEvent>,
        started: Instant,
    ) -> Result<Option<String>, DrillError> {
        loop {
            if lock_state(&self.state).finished().is_some() {
                return Ok(None);
            }

            let event = match rx.recv() {
                Ok(event) => event,
                Err(_) => {
                    let elapsed = started.elapsed().as_secs();
                    if lock_state(&self.state).finish(FinishReason::ReaderError, elapsed) {
                        return Ok(Some("event sources disconnected".to_string()));
                    }
                    return Ok(None);
                }
            };

            match event {
                GameEvent::Tick => self.draw()?,
                GameEvent::Terminated => return Ok(None),
                GameEvent::ReaderFailed(msg) => {
                    let elapsed = started.elapsed().as_secs();
                    if !lock_state(&self.state).finish(FinishReason::ReaderError, elapsed) {
                        warn!("reader failed after the session ended: {}", msg);
                        return Ok(None);
                    }
                    return Ok(Some(msg));
                }
                GameEvent::Input(InputEvent::Named(key)) => {
                    // escape quits, same as ctrl-c
                    info!("{:?} pressed, quitting", key);
                    let elapsed = started.elapsed().as_secs();
                    lock_state(&self.state).finish(FinishReason::UserQuit, elapsed);
                    return Ok(None);
                }
                GameEvent::Input(InputEvent::Char(c)) => {
                    let outcome = {
                        let mut state = lock_state(&self.state);
                        let outcome = state.try_match(c);
                        if outcome == MatchOutcome::Completed {
                            state.finish(FinishReason::AllTyped, started.elapsed().as_secs());
                        }
                        outcome
                    };
                    match outcome {
                        MatchOutcome::Advanced => self.draw()?,
                        MatchOutcome::Completed => return Ok(None),
                        MatchOutcome::Mismatch | MatchOutcome::Ignored => {}
                    }
                }
            }
        }
    }

    fn draw(&mut self) -> Result<(), DrillError> {
        let view = View::from(&*lock_state(&self.state));
        self.terminal.draw(|f| f.render_widget(&view, f.area()))?;
        Ok(())
    }
}
