//! End-to-end pipeline scenarios driven through the library API.
//!
//! The tool runner is replaced with an in-process fake so each scenario can
//! control what mothur "does" without mothur installed.

#![cfg(unix)]

use std::cell::Cell;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::rc::Rc;

use amplicon_qc::core::types::{RunStatus, Stage, ViolationKind};
use amplicon_qc::tool::{Invocation, ToolError, ToolLocator, ToolRunner};
use amplicon_qc::{Pipeline, PipelineConfig};
use tempfile::TempDir;

const GOOD_MANIFEST: &str = "sample1_R1.fastq sample1_R2.fastq sample1_I1.fastq\n";

const RAW_LOG: &str = "\
mothur > make.contigs(file=samples.batch)
Processing sample1
Processing sample1
Processing sample1
Done.
";

/// Stand-in for mothur: writes a log into the working dir and returns a canned result
struct FakeRunner {
    write_log: bool,
    failure: Option<&'static str>,
    calls: Rc<Cell<usize>>,
}

impl FakeRunner {
    fn succeeding(calls: &Rc<Cell<usize>>) -> Self {
        Self {
            write_log: true,
            failure: None,
            calls: Rc::clone(calls),
        }
    }

    fn failing(message: &'static str, calls: &Rc<Cell<usize>>) -> Self {
        Self {
            write_log: true,
            failure: Some(message),
            calls: Rc::clone(calls),
        }
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolError> {
        self.calls.set(self.calls.get() + 1);
        if self.write_log {
            std::fs::write(invocation.working_dir.join("mothur.logfile"), RAW_LOG).unwrap();
        }
        match self.failure {
            None => Ok(()),
            Some(message) => Err(ToolError::Failed {
                message: message.to_string(),
            }),
        }
    }
}

struct Fixture {
    dir: TempDir,
    config: PipelineConfig,
}

impl Fixture {
    fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let mothur = bin.join("mothur");
        std::fs::write(&mothur, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&mothur, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let batch = dir.path().join("samples.batch");
        std::fs::write(&batch, manifest).unwrap();

        let config = PipelineConfig::from_toml(&format!(
            "output_dir = \"{}\"\nbatch_file = \"{}\"\n",
            out.display(),
            batch.display()
        ))
        .unwrap();
        Self { dir, config }
    }

    fn locator(&self) -> ToolLocator {
        ToolLocator::with_search_path(self.dir.path().join("bin"))
    }

    fn out(&self) -> PathBuf {
        self.config.output_dir.clone()
    }
}

/// Scenario A: well-formed manifest, tool succeeds, log deduplicated, exit 0
#[test]
fn test_successful_run() {
    let fx = Fixture::new(GOOD_MANIFEST);
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::succeeding(&calls))
        .run();

    assert_eq!(outcome.status, RunStatus::Succeeded);
    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.diagnostic.is_none());
    assert_eq!(calls.get(), 1);
    assert_eq!(
        outcome.stages,
        vec![
            Stage::CheckTool,
            Stage::ValidateManifest,
            Stage::Execute,
            Stage::Succeeded,
            Stage::Finalize,
            Stage::Done,
        ]
    );

    let dedup = outcome.dedup_log.expect("dedup log should be produced");
    assert_eq!(dedup, fx.out().join("mothur.dedup.logfile"));
    assert_eq!(
        std::fs::read_to_string(&dedup).unwrap(),
        "mothur > make.contigs(file=samples.batch)\nProcessing sample1\nDone.\n"
    );
    assert_eq!(
        std::fs::read_to_string(fx.out().join("mothur.logfile")).unwrap(),
        RAW_LOG
    );
    assert!(fx.out().join("amplicon-qc.batch").is_file());
}

/// Scenario B: no index files, manifest rejected, tool never invoked
#[test]
fn test_manifest_without_index_is_rejected() {
    let fx = Fixture::new("sample1_R1.fastq sample1_R2.fastq\n");
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::succeeding(&calls))
        .run();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(calls.get(), 0);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].kind, ViolationKind::MissingIndex);
    assert_eq!(outcome.violations[0].line, 1);
    assert!(outcome.dedup_log.is_none());
    assert_eq!(
        outcome.stages,
        vec![
            Stage::CheckTool,
            Stage::ValidateManifest,
            Stage::Aborted,
            Stage::Finalize,
            Stage::Done,
        ]
    );
}

#[test]
fn test_all_manifest_violations_reported() {
    let fx = Fixture::new(
        "a_R1.fq a_I1.fq\n\
         b_R1.fq b_R2.fq b_I2.fq\n\
         c-1_R1.fq c_R2.fq\n",
    );
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::succeeding(&calls))
        .run();

    let found: Vec<(usize, ViolationKind)> =
        outcome.violations.iter().map(|v| (v.line, v.kind)).collect();
    assert_eq!(
        found,
        vec![
            (1, ViolationKind::MissingReadPair),
            (3, ViolationKind::MissingIndex),
            (3, ViolationKind::Hyphen),
        ]
    );
    assert!(outcome.diagnostic.unwrap().contains("2 invalid line(s)"));
    assert_eq!(calls.get(), 0);
}

/// Scenario C: tool killed by signal 9, diagnosis names the cause, finalize still runs
#[test]
fn test_tool_killed_by_signal() {
    let fx = Fixture::new(GOOD_MANIFEST);
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::failing(
            "mothur exited abnormally (return_code=-9)",
            &calls,
        ))
        .run();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.error_code, Some(-9));
    let diagnostic = outcome.diagnostic.unwrap();
    assert!(diagnostic.contains("immediately terminate the process"), "{diagnostic}");
    assert!(diagnostic.contains("SIGKILL"), "{diagnostic}");
    assert!(outcome.dedup_log.is_some());
    assert_eq!(
        outcome.stages,
        vec![
            Stage::CheckTool,
            Stage::ValidateManifest,
            Stage::Execute,
            Stage::Failed,
            Stage::Finalize,
            Stage::Done,
        ]
    );
}

#[test]
fn test_tool_failure_without_code_degrades() {
    let fx = Fixture::new(GOOD_MANIFEST);
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::failing("mothur could not read oligos", &calls))
        .run();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.error_code, None);
    let diagnostic = outcome.diagnostic.unwrap();
    assert!(diagnostic.contains("error code unavailable"), "{diagnostic}");
    assert!(diagnostic.contains("mothur could not read oligos"), "{diagnostic}");
}

/// Scenario D: tool missing, nothing else runs, manifest never read
#[test]
fn test_missing_tool_aborts_before_manifest() {
    let mut fx = Fixture::new(GOOD_MANIFEST);
    fx.config.batch_file = fx.dir.path().join("does-not-exist.batch");
    let empty = tempfile::tempdir().unwrap();
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(ToolLocator::with_search_path(empty.path()))
        .with_runner(FakeRunner::succeeding(&calls))
        .run();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(calls.get(), 0);
    let diagnostic = outcome.diagnostic.unwrap();
    assert!(diagnostic.contains("mothur not found on path"), "{diagnostic}");
    assert!(!diagnostic.contains("does-not-exist"), "{diagnostic}");
    assert_eq!(
        outcome.stages,
        vec![Stage::CheckTool, Stage::Aborted, Stage::Finalize, Stage::Done]
    );
    assert_eq!(std::fs::read_dir(fx.out()).unwrap().count(), 0);
}

#[test]
fn test_blank_lines_at_end_of_manifest_are_rejected() {
    for manifest in ["\n\n", "sample1_R1.fastq sample1_R2.fastq sample1_I1.fastq\n   \n"] {
        let fx = Fixture::new(manifest);
        let calls = Rc::new(Cell::new(0));

        let outcome = Pipeline::new(&fx.config)
            .with_locator(fx.locator())
            .with_runner(FakeRunner::succeeding(&calls))
            .run();

        assert_eq!(outcome.exit_code(), 1, "{manifest:?}");
        assert_eq!(calls.get(), 0, "{manifest:?}");
        assert!(
            outcome
                .violations
                .iter()
                .any(|v| v.line == 2 && v.kind == ViolationKind::MissingReadPair),
            "{manifest:?}"
        );
    }
}

#[test]
fn test_unreadable_manifest_is_distinct() {
    let mut fx = Fixture::new(GOOD_MANIFEST);
    fx.config.batch_file = fx.dir.path().join("missing.batch");
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::succeeding(&calls))
        .run();

    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.violations.is_empty());
    assert!(outcome
        .diagnostic
        .unwrap()
        .starts_with("Manifest unreadable"));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_missing_log_does_not_change_success() {
    let fx = Fixture::new(GOOD_MANIFEST);
    let calls = Rc::new(Cell::new(0));
    let runner = FakeRunner {
        write_log: false,
        failure: None,
        calls: Rc::clone(&calls),
    };

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(runner)
        .run();

    assert_eq!(outcome.status, RunStatus::Succeeded);
    assert!(outcome.dedup_log.is_none());
}

#[test]
fn test_input_dir_existence_check() {
    let mut fx = Fixture::new(GOOD_MANIFEST);
    let raw = fx.dir.path().join("raw");
    std::fs::create_dir(&raw).unwrap();
    for name in ["sample1_R1.fastq", "sample1_R2.fastq"] {
        std::fs::write(raw.join(name), "").unwrap();
    }
    fx.config.input_dir = Some(raw);
    let calls = Rc::new(Cell::new(0));

    let outcome = Pipeline::new(&fx.config)
        .with_locator(fx.locator())
        .with_runner(FakeRunner::succeeding(&calls))
        .run();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].kind, ViolationKind::MissingFile);
    assert!(outcome.violations[0].detail.contains("sample1_I1.fastq"));
}
