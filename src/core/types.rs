use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which structural rule a manifest line broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// No token contains "R1" or no token contains "R2"
    MissingReadPair,
    /// No token contains "I1" or "I2"
    MissingIndex,
    /// At least one token contains '-'
    Hyphen,
    /// A token names a file that does not exist in the input directory
    MissingFile,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingReadPair => write!(f, "missing R1/R2 read pair"),
            Self::MissingIndex => write!(f, "missing index file (I1 or I2)"),
            Self::Hyphen => write!(f, "hyphen in filename"),
            Self::MissingFile => write!(f, "file not found"),
        }
    }
}

/// A single rule violation on one manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// 1-based line number in the manifest
    pub line: usize,
    pub kind: ViolationKind,
    pub detail: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.kind, self.detail)
    }
}

/// Aggregate result of validating every line of a manifest.
///
/// Built once by the validator and never mutated afterwards; the only way to
/// construct one is [`ValidationOutcome::from_violations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    violations: Vec<Violation>,
    lines_checked: usize,
    failed_lines: usize,
}

impl ValidationOutcome {
    /// Build an outcome from violations in any order.
    #[must_use]
    pub fn from_violations(violations: Vec<Violation>, lines_checked: usize) -> Self {
        let failed_lines = violations
            .iter()
            .map(|v| v.line)
            .collect::<BTreeSet<_>>()
            .len();
        Self {
            violations,
            lines_checked,
            failed_lines,
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    #[must_use]
    pub fn lines_checked(&self) -> usize {
        self.lines_checked
    }

    /// Number of distinct lines with at least one violation
    #[must_use]
    pub fn failed_lines(&self) -> usize {
        self.failed_lines
    }

    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Terminal status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Pipeline state. Declaration order is execution order; a run only ever
/// moves forward through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CheckTool,
    ValidateManifest,
    Execute,
    Succeeded,
    Failed,
    /// Terminal error before the tool ran (missing tool, bad manifest)
    Aborted,
    Finalize,
    Done,
}

/// Final observable outcome of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,

    /// Human-readable cause when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,

    /// Return code recovered from the tool failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,

    /// Location of the deduplicated tool log, if one was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_log: Option<PathBuf>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub violations: Vec<Violation>,

    /// States visited, in order
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl RunOutcome {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            status: RunStatus::Succeeded,
            diagnostic: None,
            error_code: None,
            dedup_log: None,
            violations: Vec::new(),
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            diagnostic: Some(diagnostic.into()),
            error_code: None,
            dedup_log: None,
            violations: Vec::new(),
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Process exit code: 0 on success, 1 on any failure
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.status {
            RunStatus::Succeeded => 0,
            RunStatus::Failed => 1,
        }
    }
}
