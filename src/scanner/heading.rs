use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+(.*)$").unwrap());

/// Text of the first heading line in a markdown cell, `#` markers stripped.
/// Later heading lines in the same cell are ignored.
pub fn first_heading(markdown: &str) -> Option<&str> {
    let caps = markdown
        .split(['\n', '\r'])
        .map(str::trim)
        .find_map(|line| HEADING_RE.captures(line))?;
    let text = caps.get(1)?.as_str().trim();
    (!text.is_empty()).then_some(text)
}
