//! Example corpus used by `/random`.
//!
//! File format:
//!
//! ```text
//! %TOTAL 2
//! %BEGIN 1
//! a^2 + b^2 = c^2
//! %END 1
//! %BEGIN 2
//! e^{i\pi} + 1 = 0
//! %END 2
//! ```
//!
//! The corpus is re-read on every sample; nothing is cached between calls.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

use rand::Rng;

const TOTAL_MARKER: &str = "%TOTAL";
const BEGIN_MARKER: &str = "%BEGIN";
const END_MARKER: &str = "%END";

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("no %TOTAL on first line")]
    MissingTotal,

    #[error("invalid %TOTAL value: {0:?}")]
    InvalidTotal(String),

    #[error("cannot read corpus {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One block pulled out of the corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    pub index: u32,
    pub text: String,
}

/// Handle to a corpus file. Holds only the path.
#[derive(Clone, Debug)]
pub struct Corpus {
    path: PathBuf,
}

impl Corpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checks the header without sampling. Returns the declared total.
    pub fn preflight(&self) -> Result<u32, CorpusError> {
        let mut reader = self.open()?;
        read_total(&mut reader).map_err(|e| self.annotate(e))
    }

    pub fn sample(&self) -> Result<Example, CorpusError> {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng>(&self, rng: &mut R) -> Result<Example, CorpusError> {
        let reader = self.open()?;
        sample_from(reader, rng).map_err(|e| self.annotate(e))
    }

    fn open(&self) -> Result<BufReader<File>, CorpusError> {
        File::open(&self.path)
            .map(BufReader::new)
            .map_err(|source| CorpusError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn annotate(&self, e: CorpusError) -> CorpusError {
        match e {
            CorpusError::Read { source, .. } => CorpusError::Read {
                path: self.path.clone(),
                source,
            },
            other => other,
        }
    }
}

/// Reads the `%TOTAL <n>` header line. `n` must be a positive integer.
pub fn read_total<R: BufRead>(reader: &mut R) -> Result<u32, CorpusError> {
    let mut line = String::new();
    reader.read_line(&mut line).map_err(read_err)?;

    let Some(rest) = line.strip_prefix(TOTAL_MARKER) else {
        return Err(CorpusError::MissingTotal);
    };
    // `%TOTAL5` is not the marker.
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(CorpusError::MissingTotal);
    }
    let value = rest.split_whitespace().next().unwrap_or("");
    match value.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CorpusError::InvalidTotal(value.to_string())),
    }
}

/// Scans the remaining lines for block `index`.
///
/// Recording starts after a `%BEGIN <index>` line and stops at the next line
/// starting with `%END`, whatever index that marker carries. Lines are kept
/// verbatim, newlines included.
pub fn extract_block<R: BufRead>(
    reader: &mut R,
    index: u32,
) -> Result<Option<String>, CorpusError> {
    let mut block: Option<String> = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).map_err(read_err)? == 0 {
            break;
        }

        match block.as_mut() {
            None => {
                if begin_index(&line) == Some(index) {
                    block = Some(String::new());
                }
            }
            Some(text) => {
                if line.starts_with(END_MARKER) {
                    return Ok(block);
                }
                text.push_str(&line);
            }
        }
    }

    // Unterminated block at EOF: keep what was recorded.
    Ok(block)
}

/// Reads the header, draws an index uniformly from `1..=total` and extracts
/// that block. A missing block is an empty example.
pub fn sample_from<R: BufRead, G: Rng>(mut reader: R, rng: &mut G) -> Result<Example, CorpusError> {
    let total = read_total(&mut reader)?;
    let index = rng.gen_range(1..=total);

    let text = match extract_block(&mut reader, index)? {
        Some(text) => text,
        None => {
            tracing::warn!(index, total, "corpus has no block for sampled index");
            String::new()
        }
    };

    Ok(Example { index, text })
}

fn begin_index(line: &str) -> Option<u32> {
    let rest = line.strip_prefix(BEGIN_MARKER)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.split_whitespace().next()?.parse().ok()
}

fn read_err(source: io::Error) -> CorpusError {
    CorpusError::Read {
        path: PathBuf::new(),
        source,
    }
}
