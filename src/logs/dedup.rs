//! Deduplication of verbose tool logs.
//!
//! The raw log is opened read-only and left untouched. The compacted copy is
//! written next to it as `<stem>.dedup.<ext>` through a temp file in the same
//! directory, then persisted, so a reader never sees a half-written artifact.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Log unavailable: {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write deduplicated log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite source log {0}")]
    SameFile(PathBuf),
}

/// Which records count as redundant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupRule {
    /// Collapse runs of equivalent adjacent records
    #[default]
    Consecutive,
    /// Keep only the first occurrence of each record anywhere in the log
    Global,
}

/// Collapses redundant log records, keeping each first occurrence in order.
#[derive(Debug, Clone, Copy)]
pub struct LogDeduplicator {
    pub rule: DedupRule,
    /// Compare records with surrounding whitespace trimmed and inner runs collapsed
    pub normalize_whitespace: bool,
}

impl Default for LogDeduplicator {
    fn default() -> Self {
        Self {
            rule: DedupRule::Consecutive,
            normalize_whitespace: true,
        }
    }
}

/// Summary of one deduplication pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub records_in: usize,
    pub records_out: usize,
}

impl LogDeduplicator {
    #[must_use]
    pub fn new(rule: DedupRule, normalize_whitespace: bool) -> Self {
        Self {
            rule,
            normalize_whitespace,
        }
    }

    fn key<'a>(&self, record: &'a str) -> Cow<'a, str> {
        if self.normalize_whitespace {
            Cow::Owned(record.split_whitespace().collect::<Vec<_>>().join(" "))
        } else {
            Cow::Borrowed(record)
        }
    }

    /// Deduplicate records in memory
    #[must_use]
    pub fn dedup_records<'a, I>(&self, records: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut kept = Vec::new();
        match self.rule {
            DedupRule::Consecutive => {
                let mut previous: Option<Cow<'a, str>> = None;
                for record in records {
                    let key = self.key(record);
                    if previous.as_ref() != Some(&key) {
                        kept.push(record);
                        previous = Some(key);
                    }
                }
            }
            DedupRule::Global => {
                let mut seen = HashSet::new();
                for record in records {
                    if seen.insert(self.key(record).into_owned()) {
                        kept.push(record);
                    }
                }
            }
        }
        kept
    }

    /// Deduplicate a whole text blob, one record per line
    #[must_use]
    pub fn dedup_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for record in self.dedup_records(text.lines()) {
            out.push_str(record);
            out.push('\n');
        }
        out
    }

    /// Deduplicate `source` into its sibling artifact (see [`dedup_output_path`]).
    ///
    /// # Errors
    ///
    /// Returns `LogError::Unavailable` if the source cannot be opened or read,
    /// or `LogError::Write` if the output cannot be written.
    pub fn dedup_file(&self, source: &Path) -> Result<DedupReport, LogError> {
        self.dedup_file_to(source, &dedup_output_path(source))
    }

    /// Deduplicate `source` into `output`.
    ///
    /// # Errors
    ///
    /// Returns `LogError::SameFile` if `output` is `source`, `LogError::Unavailable`
    /// if the source cannot be read, or `LogError::Write` on output failure.
    pub fn dedup_file_to(&self, source: &Path, output: &Path) -> Result<DedupReport, LogError> {
        if same_file(source, output) {
            return Err(LogError::SameFile(source.to_path_buf()));
        }

        let unavailable = |source_err| LogError::Unavailable {
            path: source.to_path_buf(),
            source: source_err,
        };
        let write_err = |source_err| LogError::Write {
            path: output.to_path_buf(),
            source: source_err,
        };

        // Read everything first so the source handle is closed before writing.
        let records: Vec<String> = {
            let reader = File::open(source).map(BufReader::new).map_err(unavailable)?;
            reader
                .lines()
                .collect::<Result<_, _>>()
                .map_err(unavailable)?
        };
        let kept = self.dedup_records(records.iter().map(String::as_str));

        let dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for record in &kept {
                writeln!(writer, "{record}").map_err(write_err)?;
            }
            writer.flush().map_err(write_err)?;
        }
        tmp.persist(output).map_err(|e| write_err(e.error))?;

        Ok(DedupReport {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            records_in: records.len(),
            records_out: kept.len(),
        })
    }
}

/// Sibling path for the deduplicated artifact:
/// `mothur.logfile` becomes `mothur.dedup.logfile`, `run` becomes `run.dedup`.
#[must_use]
pub fn dedup_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{stem}.dedup.{}", ext.to_string_lossy()),
        None => format!("{stem}.dedup"),
    };
    source.with_file_name(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
