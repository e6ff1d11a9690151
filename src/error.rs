use std::path::PathBuf;
use std::time::Duration;

/// Conditions that abort a run. Everything else is logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("notebook not found at {}", .0.display())]
    NotebookNotFound(PathBuf),

    #[error("notebook execution timed out after {}s", .0.as_secs())]
    ExecutionTimeout(Duration),

    #[error("could not start `{program}`: {source}")]
    ExecutorUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("notebook execution failed ({status}): {stderr}")]
    ExecutorFailed { status: String, stderr: String },
}
