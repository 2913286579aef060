use rand::Rng;

use crate::{error::DrillError, session::Mode, source::SymbolSource};

/// Builds the practice sequence for a session from raw input lines
pub struct SequenceGenerator {
    mode: Mode,
}

impl SequenceGenerator {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Generate the ordered symbols to practice.
    ///
    /// Lines that are not exactly one character long are skipped. An empty
    /// pool is rejected before any random index is drawn.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        lines: &[String],
        rng: &mut R,
    ) -> Result<Vec<char>, DrillError> {
        let pool = symbol_pool(lines);
        if pool.is_empty() {
            return Err(DrillError::EmptyPool { path: None });
        }

        match self.mode {
            Mode::FixedLength { target_length } => {
                let mut symbols = pad_to(&pool, target_length, rng);
                shuffle(&mut symbols, rng);
                // after the shuffle, so original pool entries can be dropped too
                symbols.truncate(target_length);
                Ok(symbols)
            }
            Mode::TimeLimited { .. } => {
                let mut symbols = pool;
                shuffle(&mut symbols, rng);
                Ok(symbols)
            }
        }
    }

    /// Same as [`generate`](Self::generate), naming the file in an empty-pool error.
    pub fn generate_from<R: Rng + ?Sized>(
        &self,
        source: &SymbolSource,
        rng: &mut R,
    ) -> Result<Vec<char>, DrillError> {
        self.generate(&source.lines, rng)
            .map_err(|err| err.with_path(&source.path))
    }
}

/// Keep the lines that hold exactly one character.
pub fn symbol_pool(lines: &[String]) -> Vec<char> {
    lines
        .iter()
        .filter_map(|line| {
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        })
        .collect()
}

/// Append uniformly chosen pool entries until `len` is reached.
pub fn pad_to<R: Rng + ?Sized>(pool: &[char], len: usize, rng: &mut R) -> Vec<char> {
    let mut symbols = pool.to_vec();
    if pool.is_empty() {
        return symbols;
    }
    while symbols.len() < len {
        symbols.push(pool[rng.gen_range(0..pool.len())]);
    }
    symbols
}

/// Fisher-Yates: walk from the back, swapping each slot with one in `[0, i]`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
