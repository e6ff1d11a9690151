use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::PipelineError;

const SUPPORTED_NBFORMAT: u64 = 4;

/// An nbformat v4 document. Fields the pipeline does not read (`metadata`,
/// `nbformat`, ...) ride along in `rest` so the document can be handed to the
/// executor unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
    Raw,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default)]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Value>>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// nbformat allows cell source as one string or as a list of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Source::Text(s) => Cow::Borrowed(s),
            Source::Lines(lines) => Cow::Owned(lines.concat()),
        }
    }
}

impl Cell {
    pub fn outputs(&self) -> &[Value] {
        self.outputs.as_deref().unwrap_or_default()
    }
}

/// An `error` output left behind by a cell that raised during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellError {
    pub cell: usize,
    pub name: String,
    pub value: String,
}

impl Notebook {
    pub fn parse(text: &str) -> Result<Self> {
        let notebook: Notebook = serde_json::from_str(text)?;
        match notebook.rest.get("nbformat").and_then(Value::as_u64) {
            Some(SUPPORTED_NBFORMAT) => {}
            other => warn!(
                "Notebook format {:?} is not v{}; reading it anyway",
                other, SUPPORTED_NBFORMAT
            ),
        }
        Ok(notebook)
    }

    pub fn code_cell_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.cell_type == CellType::Code)
            .count()
    }

    /// Every `error` output across all code cells, in document order.
    pub fn cell_errors(&self) -> Vec<CellError> {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(i, cell)| cell.outputs().iter().map(move |o| (i, o)))
            .filter(|(_, o)| o.get("output_type").and_then(Value::as_str) == Some("error"))
            .map(|(i, o)| CellError {
                cell: i,
                name: str_field(o, "ename"),
                value: str_field(o, "evalue"),
            })
            .collect()
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Read and parse the notebook at `path`. A missing file is reported as
/// [`PipelineError::NotebookNotFound`] before anything is read.
pub fn load(path: &Path) -> Result<Notebook> {
    if !path.exists() {
        return Err(PipelineError::NotebookNotFound(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading notebook {}", path.display()))?;
    let notebook = Notebook::parse(&text)
        .with_context(|| format!("parsing notebook {}", path.display()))?;
    debug!(
        "Loaded {} cells ({} code) from {}",
        notebook.cells.len(),
        notebook.code_cell_count(),
        path.display()
    );
    Ok(notebook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Notebook {
        load(Path::new("tests/fixtures/eda.ipynb")).unwrap()
    }

    #[test]
    fn eda_fixture_shape() {
        let nb = fixture();
        assert_eq!(nb.cells.len(), 11);
        assert_eq!(nb.code_cell_count(), 7);
        assert_eq!(nb.cells[0].cell_type, CellType::Markdown);
        assert_eq!(nb.cells[1].cell_type, CellType::Code);
        assert!(nb.cells[1].outputs().is_empty());
        assert_eq!(nb.rest["nbformat"], json!(4));
    }

    #[test]
    fn source_lines_are_concatenated() {
        let nb = fixture();
        assert_eq!(
            nb.cells[0].source.text(),
            "# Análisis exploratorio del desempleo\n\nDatos trimestrales."
        );
        assert_eq!(
            nb.cells[1].source.text(),
            "import pandas as pd\nimport plotly.express as px"
        );
    }

    #[test]
    fn missing_source_defaults_to_empty() {
        let nb = Notebook::parse(r#"{"cells":[{"cell_type":"markdown"}],"nbformat":4}"#).unwrap();
        assert_eq!(nb.cells[0].source.text(), "");
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let nb = fixture();
        let back: Value = serde_json::to_value(&nb).unwrap();
        let orig: Value =
            serde_json::from_str(&fs::read_to_string("tests/fixtures/eda.ipynb").unwrap()).unwrap();
        assert_eq!(back, orig);
    }

    #[test]
    fn markdown_cells_serialize_without_outputs() {
        let nb = fixture();
        let md = serde_json::to_value(&nb.cells[0]).unwrap();
        assert!(md.get("outputs").is_none());
    }

    #[test]
    fn raw_and_unknown_cell_types() {
        let nb = Notebook::parse(
            r#"{"cells":[
                {"cell_type":"raw","source":"x","metadata":{}},
                {"cell_type":"widget","source":"y","metadata":{}}
            ],"nbformat":4,"nbformat_minor":5,"metadata":{}}"#,
        )
        .unwrap();
        assert_eq!(nb.cells[0].cell_type, CellType::Raw);
        assert_eq!(nb.cells[1].cell_type, CellType::Other("widget".into()));
        assert_eq!(serde_json::to_value(&nb.cells[1]).unwrap()["cell_type"], "widget");
    }

    #[test]
    fn older_format_still_parses() {
        let nb = Notebook::parse(r#"{"cells":[],"nbformat":3}"#).unwrap();
        assert!(nb.cells.is_empty());
    }

    #[test]
    fn cell_errors_found() {
        let errors = fixture().cell_errors();
        assert_eq!(
            errors,
            vec![CellError {
                cell: 6,
                name: "KeyError".into(),
                value: "'region'".into(),
            }]
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load(Path::new("tests/fixtures/does_not_exist.ipynb")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NotebookNotFound(_))
        ));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Notebook::parse("{not json").is_err());
        assert!(Notebook::parse(r#"{"metadata":{}}"#).is_err());
    }
}
