use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures that stop a drill before or during play.
#[derive(Debug, Error)]
pub enum DrillError {
    /// A symbol file could not be opened or read.
    #[error("{}", input_source_message(.path, .source))]
    InputSource { path: PathBuf, source: io::Error },
    /// The symbol file held no one-character lines.
    #[error("{}", empty_pool_message(.path.as_deref()))]
    EmptyPool { path: Option<PathBuf> },
    /// Raw mode, the alternate screen, or a draw call failed.
    #[error("terminal error")]
    Terminal(#[from] io::Error),
}

fn input_source_message(path: &Path, source: &io::Error) -> String {
    if source.kind() == io::ErrorKind::NotFound {
        format!("{} not found", path.display())
    } else {
        format!("could not read {}", path.display())
    }
}

fn empty_pool_message(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!(
            "{} contains no single-character lines to practice",
            path.display()
        ),
        None => "no single-character lines to practice".to_string(),
    }
}

impl DrillError {
    /// Attach the file the lines came from, if the error doesn't name one yet.
    pub fn with_path(self, p: impl Into<PathBuf>) -> Self {
        match self {
            DrillError::EmptyPool { path: None } => DrillError::EmptyPool {
                path: Some(p.into()),
            },
            other => other,
        }
    }
}
