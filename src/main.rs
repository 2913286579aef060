use std::io::{self, stdin};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::tty::IsTty;
use log::{info, warn};

use glyphdrill::{
    app_dirs::AppDirs,
    config::{Config, FileConfigStore},
    dispatcher::Dispatcher,
    logging,
    runtime::CrosstermKeySource,
    sequence::SequenceGenerator,
    session::{Mode, SessionConfig, SessionOutcome},
    source::load_with_fallback,
    state::{lock_state, GameState},
    term::RawModeGuard,
    ui::View,
};

/// type the symbol shown, as many as asked or as fast as the clock allows
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Drill single symbols from a file. Each screen shows one symbol to type; \
                  a session ends after a fixed number of symbols or when time runs out. \
                  Esc or Ctrl-C quits."
)]
pub struct Cli {
    /// number of symbols to type (default 15 when the value is missing or not a number)
    #[clap(
        long,
        value_name = "COUNT",
        num_args = 0..=1,
        default_missing_value = "",
        conflicts_with = "time"
    )]
    length: Option<String>,

    /// seconds to keep typing (default 15 when the value is missing or not a number)
    #[clap(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "")]
    time: Option<String>,

    /// symbol file to read instead of input.txt
    #[clap(short = 'i', long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// hide the preview of the next symbol
    #[clap(long)]
    no_preview: bool,
}

/// Parse a count argument, falling back to `default` when it is absent or invalid.
fn count_or<T: std::str::FromStr + std::fmt::Display>(
    flag: &str,
    value: &str,
    default: T,
) -> T {
    match value.trim().parse() {
        Ok(n) => n,
        Err(_) if value.trim().is_empty() => {
            warn!("--{} given without a value, using {}", flag, default);
            default
        }
        Err(_) => {
            warn!("--{} {:?} is not a number, using {}", flag, value, default);
            default
        }
    }
}

impl Cli {
    fn session_config(&self, defaults: &Config) -> SessionConfig {
        let mode = match (&self.length, &self.time) {
            (_, Some(secs)) => Mode::TimeLimited {
                limit_secs: count_or("time", secs, defaults.number_of_secs),
            },
            (Some(count), None) => Mode::FixedLength {
                target_length: count_or("length", count, defaults.number_of_symbols),
            },
            (None, None) => Mode::FixedLength {
                target_length: defaults.number_of_symbols,
            },
        };
        SessionConfig {
            mode,
            show_preview: defaults.show_preview && !self.no_preview,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("\x1b[31;1merror\x1b[0m: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        logging::init(&log_path);
    }

    let defaults = FileConfigStore::new().load_or_init();
    let session = cli.session_config(&defaults);

    let primary = cli.input.clone().unwrap_or_else(|| defaults.input_file.clone());
    let source = load_with_fallback(&primary, &defaults.fallback_file)?;
    let symbols =
        SequenceGenerator::new(session.mode).generate_from(&source, &mut rand::thread_rng())?;
    info!(
        "starting {} session from {} ({} symbols queued)",
        session.mode,
        source.path.display(),
        symbols.len()
    );

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let state = GameState::new(session, symbols).into_shared();
    let outcome = {
        let guard = RawModeGuard::acquire().context("could not enter raw mode")?;
        let mut terminal = guard.terminal()?;
        Dispatcher::new(&mut terminal, state.clone()).run(CrosstermKeySource)?
    };

    let view = View::from(&*lock_state(&state));
    print_farewell(&view, &outcome)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_farewell(view: &View, outcome: &SessionOutcome) -> io::Result<()> {
    use std::io::Write;

    let mut out = io::stdout().lock();
    for line in view.summary_lines() {
        writeln!(out, "{}", line)?;
    }
    if let Some(err) = &outcome.reader_error {
        writeln!(out, "Input error: {}", err)?;
    }
    writeln!(out, "Exiting game...")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config_for(args: &[&str]) -> SessionConfig {
        Cli::parse_from(args).session_config(&Config::default())
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["glyphdrill"]);
        assert_eq!(cli.length, None);
        assert_eq!(cli.time, None);
        assert_eq!(cli.input, None);
        assert!(!cli.no_preview);

        let session = config_for(&["glyphdrill"]);
        assert_eq!(session.mode, Mode::FixedLength { target_length: 15 });
        assert!(session.show_preview);
    }

    #[test]
    fn test_cli_length() {
        assert_eq!(
            config_for(&["glyphdrill", "--length", "25"]).mode,
            Mode::FixedLength { target_length: 25 }
        );
    }

    #[test]
    fn test_cli_time() {
        assert_eq!(
            config_for(&["glyphdrill", "--time", "60"]).mode,
            Mode::TimeLimited { limit_secs: 60 }
        );
    }

    #[test]
    fn test_cli_missing_values_fall_back() {
        assert_eq!(
            config_for(&["glyphdrill", "--length"]).mode,
            Mode::FixedLength { target_length: 15 }
        );
        assert_eq!(
            config_for(&["glyphdrill", "--time"]).mode,
            Mode::TimeLimited { limit_secs: 15 }
        );
    }

    #[test]
    fn test_cli_non_numeric_values_fall_back() {
        assert_eq!(
            config_for(&["glyphdrill", "--length", "lots"]).mode,
            Mode::FixedLength { target_length: 15 }
        );
        assert_eq!(
            config_for(&["glyphdrill", "--time", "1.5"]).mode,
            Mode::TimeLimited { limit_secs: 15 }
        );
    }

    #[test]
    fn test_cli_fallback_uses_stored_defaults() {
        let defaults = Config {
            number_of_symbols: 40,
            number_of_secs: 90,
            ..Config::default()
        };
        let cli = Cli::parse_from(["glyphdrill", "--time", "soon"]);
        assert_eq!(
            cli.session_config(&defaults).mode,
            Mode::TimeLimited { limit_secs: 90 }
        );
        let cli = Cli::parse_from(["glyphdrill"]);
        assert_eq!(
            cli.session_config(&defaults).mode,
            Mode::FixedLength { target_length: 40 }
        );
    }

    #[test]
    fn test_cli_modes_are_exclusive() {
        let err = Cli::try_parse_from(["glyphdrill", "--length", "5", "--time", "5"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_unknown_flag_is_an_error() {
        let err = Cli::try_parse_from(["glyphdrill", "--speed", "9"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["glyphdrill", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_cli_input_and_preview() {
        let cli = Cli::parse_from(["glyphdrill", "-i", "keys.txt", "--no-preview"]);
        assert_eq!(cli.input, Some(PathBuf::from("keys.txt")));
        assert!(!cli.session_config(&Config::default()).show_preview);
    }

    #[test]
    fn test_cli_command_is_well_formed() {
        Cli::command().debug_assert();
    }
}
