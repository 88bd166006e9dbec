//! Running mothur in batch mode.
//!
//! The configured commands are rendered into a batch script and handed to
//! `mothur <script>`. The child runs under a single-threaded tokio runtime so
//! the wait can be bounded; on timeout the child is killed.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::core::config::PipelineConfig;
use crate::tool::{Invocation, ToolError, ToolRunner};

/// Name of the rendered batch script inside the output directory
pub const BATCH_SCRIPT_NAME: &str = "amplicon-qc.batch";

/// Most stderr bytes kept for the failure message
const STDERR_TAIL_BYTES: usize = 2048;

/// Render the batch script for a run.
///
/// Placeholders `{manifest}`, `{output_dir}`, and `{processors}` are filled in;
/// anything else in braces is passed through untouched.
#[must_use]
pub fn render_batch_script(config: &PipelineConfig) -> String {
    let output_dir = config.output_dir.display().to_string();
    let manifest = config.batch_file.display().to_string();
    let processors = config.tool.processors.to_string();

    let mut script = String::new();
    script.push_str(&format!("set.dir(output={output_dir})\n"));
    script.push_str(&format!(
        "set.logfile(name={})\n",
        config.tool_log_path().display()
    ));
    for command in config.tool.commands.iter().filter(|c| !c.trim().is_empty()) {
        let line = command
            .trim()
            .replace("{manifest}", &manifest)
            .replace("{output_dir}", &output_dir)
            .replace("{processors}", &processors);
        script.push_str(&line);
        script.push('\n');
    }
    script.push_str("quit()\n");
    script
}

/// Write the batch script and build the invocation for `program`.
///
/// # Errors
///
/// Returns an I/O error if the script cannot be written.
pub fn prepare(config: &PipelineConfig, program: &Path) -> std::io::Result<Invocation> {
    let script_path = batch_script_path(config);
    std::fs::write(&script_path, render_batch_script(config))?;
    debug!("Wrote batch script to {}", script_path.display());

    Ok(Invocation {
        program: program.to_path_buf(),
        args: vec![script_path.into_os_string()],
        working_dir: config.output_dir.clone(),
        timeout: config.tool.timeout(),
    })
}

/// Runs the tool as a child process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolError> {
        let program = invocation.program.display().to_string();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;
        rt.block_on(run_child(invocation, program))
    }
}

async fn run_child(invocation: &Invocation, program: String) -> Result<(), ToolError> {
    info!(
        "Running {} {}",
        program,
        invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

    let mut stderr = child.stderr.take();
    let wait = async {
        let mut captured = Vec::new();
        if let Some(stderr) = stderr.as_mut() {
            // A read error only loses diagnostic text; the exit status still decides.
            let _ = stderr.read_to_end(&mut captured).await;
        }
        let status = child.wait().await;
        (status, captured)
    };

    let (status, captured) = match invocation.timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(done) => done,
            // `child` is killed when it drops on return.
            Err(_) => return Err(ToolError::TimedOut(limit)),
        },
        None => wait.await,
    };

    let status = status.map_err(|source| ToolError::Spawn {
        program: program.clone(),
        source,
    })?;

    if status.success() {
        info!("{program} finished successfully");
        return Ok(());
    }

    Err(ToolError::Failed {
        message: failure_message(&program, status, &captured),
    })
}

/// Embedded return code: exit code, negated signal number, or `None`
#[must_use]
pub fn return_code(status: ExitStatus) -> Option<i32> {
    if let Some(code) = status.code() {
        return Some(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(-signal);
        }
    }
    None
}

fn failure_message(program: &str, status: ExitStatus, stderr: &[u8]) -> String {
    let code = return_code(status).map_or_else(|| "None".to_string(), |c| c.to_string());
    let tail_start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    let tail = String::from_utf8_lossy(&stderr[tail_start..]);
    let tail = tail.trim();
    if tail.is_empty() {
        format!("{program} exited abnormally (return_code={code})")
    } else {
        format!("{program} exited abnormally (return_code={code}): {tail}")
    }
}

/// Path to the rendered batch script for a config
#[must_use]
pub fn batch_script_path(config: &PipelineConfig) -> PathBuf {
    config.output_dir.join(BATCH_SCRIPT_NAME)
}
