use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_NOTEBOOK: &str = "notebooks/01_eda_desempleo.ipynb";
pub const DEFAULT_OUTPUT: &str = "docs/plots.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_KERNEL: &str = "python3";
pub const DEFAULT_JUPYTER: &str = "jupyter";

/// Resolved settings for one run. Paths are joined onto `root`.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub notebook: PathBuf,
    pub output: PathBuf,
    pub timeout: Duration,
    pub kernel: String,
    pub jupyter: Vec<String>,
    pub execute: bool,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            notebook: root.join(DEFAULT_NOTEBOOK),
            output: root.join(DEFAULT_OUTPUT),
            root,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            kernel: DEFAULT_KERNEL.to_string(),
            jupyter: split_command(DEFAULT_JUPYTER),
            execute: true,
        }
    }

    /// Directory the notebook lives in; cells run with it as the working directory.
    pub fn notebook_dir(&self) -> &Path {
        self.notebook.parent().unwrap_or(&self.root)
    }

    /// `path` relative to the project root, for display.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}

/// Split a command line like `python -m jupyter` into program + args.
pub fn split_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(str::to_string).collect()
}
