use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::PipelineError;
use crate::notebook::{CellType, Notebook};

const STDERR_TAIL_LINES: usize = 20;

/// Runs a notebook's code cells and attaches their outputs in place.
#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn execute(&self, notebook: &mut Notebook, workdir: &Path) -> Result<()>;
}

/// Executes through `jupyter nbconvert`, piping the document through stdin/stdout.
/// Cell errors are recorded as outputs (`--allow-errors`); the whole run is
/// bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct JupyterExecutor {
    pub command: Vec<String>,
    pub kernel: String,
    pub timeout: Duration,
}

impl JupyterExecutor {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            command: cfg.jupyter.clone(),
            kernel: cfg.kernel.clone(),
            timeout: cfg.timeout,
        }
    }

    fn nbconvert_args(&self) -> Vec<String> {
        vec![
            "nbconvert".into(),
            "--to".into(),
            "notebook".into(),
            "--execute".into(),
            "--allow-errors".into(),
            "--stdin".into(),
            "--stdout".into(),
            format!("--ExecutePreprocessor.timeout={}", self.timeout.as_secs()),
            format!("--ExecutePreprocessor.kernel_name={}", self.kernel),
        ]
    }

    /// Spawn the executor, feed it `input`, and return its stdout.
    async fn run(&self, input: Vec<u8>, workdir: &Path) -> Result<Vec<u8>> {
        let (program, prefix) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("jupyter command is empty"))?;

        let mut cmd = Command::new(program);
        cmd.args(prefix)
            .args(self.nbconvert_args())
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| PipelineError::ExecutorUnavailable {
            program: program.clone(),
            source,
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("executor has no stdin"))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        // Dropping the child on timeout kills it (kill_on_drop).
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.context("waiting for notebook executor")?,
            Err(_) => return Err(PipelineError::ExecutionTimeout(self.timeout).into()),
        };

        if let Err(e) = writer.await? {
            debug!("Executor closed stdin early: {}", e);
        }

        let stderr = stderr_tail(&output.stderr);
        if !output.status.success() {
            return Err(PipelineError::ExecutorFailed {
                status: output.status.to_string(),
                stderr,
            }
            .into());
        }
        if !stderr.is_empty() {
            debug!("Executor stderr:\n{}", stderr);
        }
        Ok(output.stdout)
    }
}

impl Executor for JupyterExecutor {
    async fn execute(&self, notebook: &mut Notebook, workdir: &Path) -> Result<()> {
        let input = serde_json::to_vec(notebook).context("serializing notebook for execution")?;
        info!(
            "Executing {} code cells with kernel {} (timeout {}s)",
            notebook.code_cell_count(),
            self.kernel,
            self.timeout.as_secs()
        );

        let started = Instant::now();
        let pb = spinner("running notebook cells")?;
        let stdout = self.run(input, workdir).await;
        pb.finish_and_clear();
        let stdout = stdout?;

        let text = String::from_utf8(stdout).context("executed notebook is not UTF-8")?;
        let executed = Notebook::parse(&text).context("parsing executed notebook")?;
        merge_outputs(notebook, executed);

        info!("Notebook executed in {:.1}s", started.elapsed().as_secs_f64());
        Ok(())
    }
}

/// Copy outputs and execution counts from `executed` back into `notebook`,
/// cell by cell. A cell count mismatch adopts the executed cells wholesale.
pub fn merge_outputs(notebook: &mut Notebook, executed: Notebook) {
    if executed.cells.len() != notebook.cells.len() {
        warn!(
            "Executor returned {} cells, expected {}; using its cells as-is",
            executed.cells.len(),
            notebook.cells.len()
        );
        notebook.cells = executed.cells;
        return;
    }

    for (cell, done) in notebook.cells.iter_mut().zip(executed.cells) {
        if cell.cell_type != CellType::Code {
            continue;
        }
        cell.outputs = done.outputs;
        if let Some(count) = done.rest.get("execution_count") {
            cell.rest.insert("execution_count".into(), count.clone());
        }
    }
}

/// Log every cell that raised during execution. Returns how many did.
pub fn log_cell_errors(notebook: &Notebook) -> usize {
    let errors = notebook.cell_errors();
    for e in &errors {
        warn!("Cell {} raised {}: {}", e.cell, e.name, e.value);
    }
    errors.len()
}

fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

// ── Tests ──
