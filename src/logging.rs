use std::fs::{self, OpenOptions};
use std::path::Path;

use env_logger::{Builder, Env, Target};

pub const LOG_ENV: &str = "GLYPHDRILL_LOG";

/// Send log records to `path`, filtered by `GLYPHDRILL_LOG` (default `info`).
///
/// The terminal belongs to the game while it runs, so records never go to
/// stderr. Returns false when the file can't be opened; the game then runs
/// without a logger.
pub fn init(path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };

    Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()
        .is_ok()
}
