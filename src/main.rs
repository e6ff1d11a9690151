mod config;
mod error;
mod executor;
mod notebook;
mod pipeline;
mod scanner;
mod writer;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use config::Config;
use executor::JupyterExecutor;

#[derive(Parser)]
#[command(
    name = "plots_builder",
    about = "Execute the analysis notebook and export its Plotly charts to plots.json"
)]
struct Cli {
    /// Project root; notebook and output paths are relative to it
    #[arg(long, env = "PLOTS_ROOT", default_value = ".")]
    root: PathBuf,

    /// Notebook to execute
    #[arg(long, env = "PLOTS_NOTEBOOK", default_value = config::DEFAULT_NOTEBOOK)]
    notebook: PathBuf,

    /// Where to write the sections JSON
    #[arg(short, long, env = "PLOTS_OUTPUT", default_value = config::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Upper bound in seconds for the whole notebook run
    #[arg(long, env = "PLOTS_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Jupyter kernel to execute with
    #[arg(long, env = "PLOTS_KERNEL", default_value = config::DEFAULT_KERNEL)]
    kernel: String,

    /// Jupyter command line (e.g. "python -m jupyter")
    #[arg(long, env = "PLOTS_JUPYTER", default_value = config::DEFAULT_JUPYTER)]
    jupyter: String,

    /// Scan the outputs already stored in the notebook instead of executing it
    #[arg(long)]
    no_execute: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut cfg = Config::new(self.root);
        cfg.notebook = cfg.root.join(self.notebook);
        cfg.output = cfg.root.join(self.output);
        cfg.timeout = Duration::from_secs(self.timeout);
        cfg.kernel = self.kernel;
        cfg.jupyter = config::split_command(&self.jupyter);
        cfg.execute = !self.no_execute;
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cfg = Cli::parse().into_config();
    let executor = JupyterExecutor::from_config(&cfg);

    let summary = pipeline::run(&cfg, &executor).await?;
    if summary.cell_errors > 0 {
        println!("{} cells raised errors during execution (see warnings above)", summary.cell_errors);
    }
    println!(
        "Wrote {} ({} charts)",
        cfg.display_path(&summary.output),
        summary.sections
    );

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_match_fixed_layout() {
        let cfg = Cli::parse_from(["plots_builder", "--root", "/srv/site"]).into_config();
        assert_eq!(cfg.notebook, Path::new("/srv/site/notebooks/01_eda_desempleo.ipynb"));
        assert_eq!(cfg.output, Path::new("/srv/site/docs/plots.json"));
        assert_eq!(cfg.timeout, Duration::from_secs(600));
        assert!(cfg.execute);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Cli::parse_from([
            "plots_builder",
            "--root",
            "/srv/site",
            "--notebook",
            "nb/other.ipynb",
            "-o",
            "/tmp/out.json",
            "--timeout",
            "30",
            "--jupyter",
            "python -m jupyter",
            "--no-execute",
        ])
        .into_config();
        assert_eq!(cfg.notebook, Path::new("/srv/site/nb/other.ipynb"));
        assert_eq!(cfg.output, Path::new("/tmp/out.json"));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.jupyter, vec!["python", "-m", "jupyter"]);
        assert!(!cfg.execute);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
