use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::executor::{self, Executor};
use crate::notebook;
use crate::scanner;
use crate::writer;

pub struct RunSummary {
    pub sections: usize,
    pub cell_errors: usize,
    pub output: PathBuf,
}

/// load → execute → scan → write. Only a missing notebook, executor failure
/// or timeout, and I/O errors abort; everything else is logged.
pub async fn run<E: Executor>(cfg: &Config, executor: &E) -> Result<RunSummary> {
    let mut notebook = notebook::load(&cfg.notebook)?;

    let mut cell_errors = 0;
    if cfg.execute {
        println!("Executing {} to collect charts...", cfg.display_path(&cfg.notebook));
        executor.execute(&mut notebook, cfg.notebook_dir()).await?;
        cell_errors = executor::log_cell_errors(&notebook);
    } else {
        info!("Execution skipped; scanning stored outputs");
    }

    println!("Collecting Plotly charts...");
    let sections = scanner::build_sections(&notebook);
    if sections.is_empty() {
        warn!("No Plotly charts found; writing an empty sections list");
    }

    let written = writer::write_sections(&cfg.output, &sections)?;
    Ok(RunSummary {
        sections: written,
        cell_errors,
        output: cfg.output.clone(),
    })
}

// ── Tests ──
