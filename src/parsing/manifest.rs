//! Reader for batch manifest files.
//!
//! Format: plain text, one sample per line, whitespace-delimited filename tokens.
//! Lines starting with `#` are comments. Blank lines are kept so the validator
//! can flag them.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest unreadable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One sample's file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    /// 1-based line number in the manifest
    pub number: usize,
    pub tokens: Vec<String>,
}

impl ManifestLine {
    #[must_use]
    pub fn new(number: usize, text: &str) -> Self {
        Self {
            number,
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True if any token contains `needle`
    #[must_use]
    pub fn any_token_contains(&self, needle: &str) -> bool {
        self.tokens.iter().any(|t| t.contains(needle))
    }
}

/// Read every manifest line from a file.
///
/// The whole file is read and the handle released before parsing, so no
/// handle outlives a mid-read I/O failure.
///
/// # Errors
///
/// Returns `ManifestError::Unreadable` if the file cannot be opened or read.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestLine>, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_manifest_text(&text))
}

/// Parse manifest lines from text.
///
/// `#` lines are skipped. Blank and whitespace-only lines are kept, wherever
/// they appear, so validation flags them.
#[must_use]
pub fn parse_manifest_text(text: &str) -> Vec<ManifestLine> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with('#'))
        .map(|(idx, line)| ManifestLine::new(idx + 1, line))
        .collect()
}
