//! Pipeline orchestration.
//!
//! A run moves strictly forward through
//! `CheckTool -> ValidateManifest -> Execute -> (Succeeded | Failed) -> Finalize -> Done`.
//! A missing tool or a bad manifest ends the pre-execution stages early in
//! `Aborted`. Finalize (log deduplication) is attempted on every path.

pub mod orchestrator;

use thiserror::Error;

use crate::core::types::{Stage, Violation};
use crate::parsing::manifest::ManifestError;
use crate::tool::ToolError;

pub use orchestrator::Pipeline;

/// Why a run failed
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required tool not discoverable; nothing else runs
    #[error("Precondition failed: {0}")]
    Precondition(#[source] ToolError),

    #[error(transparent)]
    ManifestUnreadable(#[from] ManifestError),

    /// All structural violations found in the manifest
    #[error("Manifest has {failed_lines} invalid line(s)")]
    ManifestFormat {
        failed_lines: usize,
        violations: Vec<Violation>,
    },

    /// The tool ran and failed; carries the raw error text
    #[error("Execution failed: {0}")]
    Execution(#[source] ToolError),
}

/// Records visited stages and enforces forward-only progress
#[derive(Debug, Default)]
pub(crate) struct StageTrace {
    stages: Vec<Stage>,
}

impl StageTrace {
    pub(crate) fn enter(&mut self, stage: Stage) {
        debug_assert!(
            self.stages.last().map_or(true, |last| *last < stage),
            "stage {stage:?} entered after {:?}",
            self.stages.last()
        );
        tracing::debug!("Entering stage {stage:?}");
        self.stages.push(stage);
    }

    pub(crate) fn into_stages(self) -> Vec<Stage> {
        self.stages
    }
}
