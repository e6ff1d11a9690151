pub mod chart;
pub mod heading;

use serde::Serialize;
use tracing::debug;

use crate::notebook::{Cell, CellType, Notebook};
use chart::ChartPayload;

/// Title used when a chart has no embedded title and no heading precedes it.
pub const FALLBACK_TITLE: &str = "Gráfico";

/// One chart destined for `plots.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub plotly: ChartPayload,
}

/// Accumulator threaded through the cell walk.
#[derive(Debug, Default)]
struct Scan {
    current_title: Option<String>,
    sections: Vec<Section>,
}

impl Scan {
    fn visit(mut self, (idx, cell): (usize, &Cell)) -> Self {
        match cell.cell_type {
            CellType::Markdown => {
                let source = cell.source.text();
                if let Some(title) = heading::first_heading(&source) {
                    self.current_title = Some(title.to_string());
                }
            }
            CellType::Code => {
                for chart in cell.outputs().iter().filter_map(chart::extract) {
                    let title = resolve_title(&chart, self.current_title.as_deref());
                    debug!("Cell {}: chart \"{}\"", idx, title);
                    self.sections.push(Section { title, plotly: chart });
                }
            }
            _ => {}
        }
        self
    }
}

/// Embedded layout title, else the last heading seen, else [`FALLBACK_TITLE`].
fn resolve_title(chart: &ChartPayload, current_title: Option<&str>) -> String {
    chart::layout_title(&chart.layout)
        .or(current_title)
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

/// Walk the cells in document order and collect every Plotly chart with its title.
pub fn build_sections(notebook: &Notebook) -> Vec<Section> {
    notebook
        .cells
        .iter()
        .enumerate()
        .fold(Scan::default(), Scan::visit)
        .sections
}

// ── Tests ──
