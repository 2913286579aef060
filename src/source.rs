use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::DrillError;

pub const PRIMARY_INPUT: &str = "input.txt";
pub const FALLBACK_INPUT: &str = "example-input.txt";

/// Lines loaded from whichever symbol file could be opened
#[derive(Debug, Clone)]
pub struct SymbolSource {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// Read a newline-delimited file. Trailing `\r` is dropped from each line.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DrillError> {
    let path = path.as_ref();
    let to_err = |source| DrillError::InputSource {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_err)?;
    BufReader::new(file)
        .lines()
        .map(|line| {
            line.map(|l| l.strip_suffix('\r').map(str::to_string).unwrap_or(l))
                .map_err(to_err)
        })
        .collect()
}

/// Try `primary`, then `fallback` if `primary` does not exist. A primary
/// that exists but cannot be read is reported, not replaced.
pub fn load_with_fallback<P: AsRef<Path>, F: AsRef<Path>>(
    primary: P,
    fallback: F,
) -> Result<SymbolSource, DrillError> {
    match read_lines(&primary) {
        Ok(lines) => Ok(SymbolSource {
            path: primary.as_ref().to_path_buf(),
            lines,
        }),
        Err(DrillError::InputSource { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            warn!(
                "{} not found; using {}",
                primary.as_ref().display(),
                fallback.as_ref().display()
            );
            let lines = read_lines(&fallback)?;
            Ok(SymbolSource {
                path: fallback.as_ref().to_path_buf(),
                lines,
            })
        }
        Err(err) => Err(err),
    }
}
