use std::fmt;

/// How a session decides that it is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ends once `target_length` symbols have been typed.
    FixedLength { target_length: usize },
    /// Ends when `limit_secs` have elapsed; typed symbols are recycled.
    TimeLimited { limit_secs: u64 },
}

impl Mode {
    pub fn is_time_limited(&self) -> bool {
        matches!(self, Mode::TimeLimited { .. })
    }

    pub fn limit_secs(&self) -> Option<u64> {
        match self {
            Mode::TimeLimited { limit_secs } => Some(*limit_secs),
            Mode::FixedLength { .. } => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::FixedLength { target_length } => write!(f, "{} symbols", target_length),
            Mode::TimeLimited { limit_secs } => write!(f, "{} seconds", limit_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub show_preview: bool,
}

impl SessionConfig {
    pub fn fixed_length(target_length: usize) -> Self {
        Self {
            mode: Mode::FixedLength { target_length },
            show_preview: true,
        }
    }

    pub fn time_limited(limit_secs: u64) -> Self {
        Self {
            mode: Mode::TimeLimited { limit_secs },
            show_preview: true,
        }
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum FinishReason {
    AllTyped,
    TimeExpired,
    UserQuit,
    ReaderError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub symbols_typed: usize,
    pub elapsed_secs: u64,
    pub finished: Option<FinishReason>,
}

/// Final report handed back to the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub reason: FinishReason,
    pub symbols_typed: usize,
    pub elapsed_secs: u64,
    pub reader_error: Option<String>,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        self.reason != FinishReason::ReaderError
    }
}
