use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::core::config::PipelineConfig;
use crate::core::types::{RunOutcome, Stage};
use crate::failure::classify;
use crate::failure::code::{ErrorCodeExtractor, ReturnCodePattern};
use crate::logs::dedup::LogDeduplicator;
use crate::pipeline::{PipelineError, StageTrace};
use crate::tool::mothur::{self, ProcessRunner};
use crate::tool::{ToolError, ToolLocator, ToolRunner};
use crate::utils::validation::validate_manifest;

/// Drives one single-pass run of the QC workflow.
///
/// The tool runner, locator, and error-code extractor are swappable so the
/// state machine can be exercised without a real mothur install.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    locator: ToolLocator,
    runner: Box<dyn ToolRunner + 'a>,
    extractor: Box<dyn ErrorCodeExtractor + 'a>,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            locator: ToolLocator::default(),
            runner: Box::new(ProcessRunner),
            extractor: Box::new(ReturnCodePattern),
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: impl ToolRunner + 'a) -> Self {
        self.runner = Box::new(runner);
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: impl ErrorCodeExtractor + 'a) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Run the pipeline to completion.
    ///
    /// Never returns early: every failure is folded into the outcome after the
    /// finalize step has been attempted.
    pub fn run(&self) -> RunOutcome {
        let mut trace = StageTrace::default();
        let mut tool_ran = false;

        let mut outcome = match self.run_stages(&mut trace, &mut tool_ran) {
            Ok(()) => {
                trace.enter(Stage::Succeeded);
                RunOutcome::succeeded()
            }
            Err(err) => self.report_failure(err, &mut trace),
        };

        trace.enter(Stage::Finalize);
        outcome.dedup_log = self.finalize(tool_ran);

        trace.enter(Stage::Done);
        outcome.stages = trace.into_stages();

        match &outcome.diagnostic {
            None => info!("Pipeline {}", outcome.status),
            Some(cause) => error!("Pipeline {}: {cause}", outcome.status),
        }
        outcome
    }

    fn run_stages(&self, trace: &mut StageTrace, tool_ran: &mut bool) -> Result<(), PipelineError> {
        trace.enter(Stage::CheckTool);
        let program = self
            .locator
            .require(&self.config.tool.executable)
            .map_err(PipelineError::Precondition)?;
        debug!("Found {} at {}", self.config.tool.executable, program.display());

        trace.enter(Stage::ValidateManifest);
        info!("Validating manifest {}", self.config.batch_file.display());
        let validation =
            validate_manifest(&self.config.batch_file, self.config.input_dir.as_deref())?;
        if !validation.passed() {
            return Err(PipelineError::ManifestFormat {
                failed_lines: validation.failed_lines(),
                violations: validation.into_violations(),
            });
        }
        info!(
            "Manifest OK: {} sample line(s)",
            validation.lines_checked()
        );

        trace.enter(Stage::Execute);
        let invocation = mothur::prepare(self.config, &program).map_err(|source| {
            PipelineError::Execution(ToolError::Spawn {
                program: program.display().to_string(),
                source,
            })
        })?;
        *tool_ran = true;
        self.runner
            .run(&invocation)
            .map_err(PipelineError::Execution)
    }

    fn report_failure(&self, err: PipelineError, trace: &mut StageTrace) -> RunOutcome {
        match err {
            PipelineError::Execution(tool_err) => {
                trace.enter(Stage::Failed);
                let diagnosis = classify(&tool_err.to_string(), self.extractor.as_ref());
                debug!("Raw tool error: {}", diagnosis.message);
                let mut outcome = RunOutcome::failed(diagnosis.summary());
                outcome.error_code = diagnosis.code.value();
                outcome
            }
            PipelineError::ManifestFormat {
                failed_lines,
                violations,
            } => {
                trace.enter(Stage::Aborted);
                for v in &violations {
                    error!("{v}");
                }
                let mut outcome = RunOutcome::failed(format!(
                    "Manifest {} has {failed_lines} invalid line(s)",
                    self.config.batch_file.display()
                ));
                outcome.violations = violations;
                outcome
            }
            other @ (PipelineError::Precondition(_) | PipelineError::ManifestUnreadable(_)) => {
                trace.enter(Stage::Aborted);
                RunOutcome::failed(other.to_string())
            }
        }
    }

    /// Best-effort log deduplication; problems are warnings only
    fn finalize(&self, tool_ran: bool) -> Option<PathBuf> {
        let raw_log = self.config.tool_log_path();
        if !tool_ran && !raw_log.exists() {
            debug!("Tool did not run and no log at {}; nothing to deduplicate", raw_log.display());
            return None;
        }

        let dedup = LogDeduplicator::new(
            self.config.dedup.rule,
            self.config.dedup.normalize_whitespace,
        );
        match dedup.dedup_file(&raw_log) {
            Ok(report) => {
                info!(
                    "Deduplicated {} -> {} ({} of {} records kept)",
                    report.source.display(),
                    report.output.display(),
                    report.records_out,
                    report.records_in
                );
                Some(report.output)
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}
