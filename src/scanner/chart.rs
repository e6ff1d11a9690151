use serde::Serialize;
use serde_json::Value;

pub const PLOTLY_MIME: &str = "application/vnd.plotly.v1+json";

/// The `{data, layout}` pair of one Plotly figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub data: Value,
    pub layout: Value,
}

/// Pull the Plotly figure out of a cell output's MIME bundle. Outputs without
/// the Plotly MIME type, or whose figure lacks `data` or `layout`, yield `None`.
pub fn extract(output: &Value) -> Option<ChartPayload> {
    let figure = output.get("data")?.as_object()?.get(PLOTLY_MIME)?.as_object()?;
    Some(ChartPayload {
        data: figure.get("data")?.clone(),
        layout: figure.get("layout")?.clone(),
    })
}

/// Title embedded in a figure layout, either `layout.title.text` or a plain
/// string `layout.title`. Blank titles and unexpected shapes count as absent.
pub fn layout_title(layout: &Value) -> Option<&str> {
    let text = match layout.get("title")? {
        Value::Object(title) => title.get("text")?.as_str()?,
        Value::String(title) => title.as_str(),
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}
