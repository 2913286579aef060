use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info, warn};

use crate::state::{lock_state, SharedState, TickStatus};

/// How long the reader waits for a key before re-checking its stop flag
pub const READER_POLL: Duration = Duration::from_millis(50);

/// Keys with a meaning beyond "a character was typed"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamedKey {
    Escape,
    Interrupt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Named(NamedKey),
}

/// Unified event type consumed by the dispatcher
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Input(InputEvent),
    /// Elapsed time changed; redraw.
    Tick,
    /// The timer ended the session.
    Terminated,
    /// The key source failed; no further input will arrive.
    ReaderFailed(String),
}

/// Turn a terminal key event into game input. Releases, repeats and keys
/// without a game meaning yield `None`.
pub fn decode_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc => Some(InputEvent::Named(NamedKey::Escape)),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Named(NamedKey::Interrupt))
        }
        // AltGr arrives as ctrl+alt on some platforms; keep those characters
        KeyCode::Char(_)
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            None
        }
        KeyCode::Char(c) => Some(InputEvent::Char(c)),
        _ => None,
    }
}

/// Source of raw key presses
pub trait KeySource: Send + 'static {
    /// Wait up to `timeout` for the next key. `Ok(None)` means nothing arrived.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Production key source reading the crossterm event stream
#[derive(Debug, Default)]
pub struct CrosstermKeySource;

impl KeySource for CrosstermKeySource {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            CtEvent::Key(key) => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

/// Scripted key source fed through a channel, for headless runs
pub struct ChannelKeySource {
    rx: Receiver<io::Result<KeyEvent>>,
}

impl ChannelKeySource {
    pub fn new(rx: Receiver<io::Result<KeyEvent>>) -> Self {
        Self { rx }
    }
}

impl KeySource for ChannelKeySource {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.rx.recv_timeout(timeout) {
            Ok(key) => key.map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "key source closed",
            )),
        }
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Background thread forwarding decoded key presses
pub struct InputReader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl InputReader {
    pub fn spawn<K: KeySource>(mut keys: K, tx: Sender<GameEvent>, poll: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Acquire) {
                match keys.poll_key(poll) {
                    Ok(Some(key)) => {
                        if let Some(input) = decode_key(key) {
                            if tx.send(GameEvent::Input(input)).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!("key reader stopped: {}", err);
                        let _ = tx.send(GameEvent::ReaderFailed(err.to_string()));
                        break;
                    }
                }
            }
            debug!("key reader exited");
        });

        Self { stop, handle }
    }

    pub fn stop(self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.handle.join();
    }
}

/// Time left until tick number `n`, counted from `started`. Deadlines are
/// fixed multiples of `interval`, so slow ticks don't push later ones back.
pub fn until_tick(started: Instant, interval: Duration, n: u32, now: Instant) -> Duration {
    let deadline = started + interval.saturating_mul(n);
    deadline.saturating_duration_since(now)
}

/// Background thread advancing elapsed time once per interval
pub struct Timer {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Timer {
    pub fn spawn<T: Ticker>(
        state: SharedState,
        tx: Sender<GameEvent>,
        ticker: T,
        started: Instant,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut ticks: u32 = 0;
            loop {
                ticks = ticks.saturating_add(1);
                let wait = until_tick(started, ticker.interval(), ticks, Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let elapsed = started.elapsed().as_secs();
                let status = lock_state(&state).tick(elapsed);
                match status {
                    TickStatus::Running => {
                        if tx.send(GameEvent::Tick).is_err() {
                            break;
                        }
                    }
                    TickStatus::Expired => {
                        info!("time limit reached after {}s", elapsed);
                        let _ = tx.send(GameEvent::Terminated);
                        break;
                    }
                    TickStatus::Finished => break,
                }
            }
        });

        Self { stop_tx, handle }
    }

    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FinishReason, SessionConfig};
    use crate::state::GameState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn decodes_characters_and_named_keys() {
        assert_eq!(
            decode_key(press(KeyCode::Char('a'), KeyModifiers::NONE)),
            Some(InputEvent::Char('a'))
        );
        assert_eq!(
            decode_key(press(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(InputEvent::Char('A'))
        );
        assert_eq!(
            decode_key(press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(InputEvent::Named(NamedKey::Escape))
        );
        assert_eq!(
            decode_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputEvent::Named(NamedKey::Interrupt))
        );
    }

    #[test]
    fn altgr_characters_pass_through() {
        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        assert_eq!(
            decode_key(press(KeyCode::Char('@'), altgr)),
            Some(InputEvent::Char('@'))
        );
        assert_eq!(
            decode_key(press(KeyCode::Char('{'), altgr)),
            Some(InputEvent::Char('{'))
        );
    }

    #[test]
    fn ignores_other_keys() {
        assert_eq!(decode_key(press(KeyCode::Left, KeyModifiers::NONE)), None);
        assert_eq!(decode_key(press(KeyCode::Enter, KeyModifiers::NONE)), None);
        assert_eq!(
            decode_key(press(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            None
        );

        let mut release = press(KeyCode::Char('a'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(decode_key(release), None);
    }

    #[test]
    fn reader_forwards_decoded_keys() {
        let (key_tx, key_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let reader = InputReader::spawn(
            ChannelKeySource::new(key_rx),
            tx,
            Duration::from_millis(5),
        );

        key_tx
            .send(Ok(press(KeyCode::Left, KeyModifiers::NONE)))
            .unwrap();
        key_tx
            .send(Ok(press(KeyCode::Char('k'), KeyModifiers::NONE)))
            .unwrap();

        let ev = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(ev, GameEvent::Input(InputEvent::Char('k')));

        reader.stop();
        drop(key_tx);
    }

    #[test]
    fn reader_reports_an_error_once_and_stops() {
        let (key_tx, key_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let reader = InputReader::spawn(
            ChannelKeySource::new(key_rx),
            tx,
            Duration::from_millis(5),
        );

        key_tx.send(Err(io::Error::other("tty gone"))).unwrap();
        key_tx
            .send(Ok(press(KeyCode::Char('k'), KeyModifiers::NONE)))
            .unwrap();

        let ev = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(ev, GameEvent::ReaderFailed("tty gone".to_string()));

        reader.stop();
        // the thread dropped its sender without forwarding anything else
        assert!(rx.recv().is_err());
    }

    #[test]
    fn tick_deadlines_do_not_drift() {
        let started = Instant::now();
        let second = Duration::from_secs(1);

        assert_eq!(until_tick(started, second, 1, started), second);
        // the third tick is due at 3s no matter how late the second one ran
        assert_eq!(
            until_tick(started, second, 3, started + Duration::from_millis(2300)),
            Duration::from_millis(700)
        );
        // an overdue tick fires at once
        assert_eq!(
            until_tick(started, second, 2, started + Duration::from_millis(2500)),
            Duration::ZERO
        );
    }

    #[test]
    fn timer_sends_ticks_until_stopped() {
        let state =
            GameState::new(SessionConfig::fixed_length(3), vec!['a', 'b', 'c']).into_shared();
        let (tx, rx) = mpsc::channel();
        let timer = Timer::spawn(
            Arc::clone(&state),
            tx,
            FixedTicker::new(Duration::from_millis(5)),
            Instant::now(),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(GameEvent::Tick));
        timer.stop();

        while rx.try_recv().is_ok() {}
        assert!(rx.recv().is_err());
        assert_eq!(lock_state(&state).finished(), None);
    }

    #[test]
    fn timer_terminates_time_limited_sessions_once() {
        let state = GameState::new(SessionConfig::time_limited(0), vec!['a']).into_shared();
        let (tx, rx) = mpsc::channel();
        let timer = Timer::spawn(
            Arc::clone(&state),
            tx,
            FixedTicker::new(Duration::from_millis(5)),
            Instant::now(),
        );

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)),
            Ok(GameEvent::Terminated)
        );
        assert!(rx.recv().is_err());
        timer.stop();
        assert_eq!(
            lock_state(&state).finished(),
            Some(FinishReason::TimeExpired)
        );
    }

    #[test]
    fn timer_stays_quiet_after_someone_else_finished() {
        let state = GameState::new(SessionConfig::time_limited(0), vec!['a']).into_shared();
        lock_state(&state).finish(FinishReason::UserQuit, 0);

        let (tx, rx) = mpsc::channel();
        let timer = Timer::spawn(
            Arc::clone(&state),
            tx,
            FixedTicker::new(Duration::from_millis(5)),
            Instant::now(),
        );

        assert!(rx.recv_timeout(Duration::from_secs(1)).is_err());
        timer.stop();
        assert_eq!(lock_state(&state).finished(), Some(FinishReason::UserQuit));
    }
}
