use crate::models::ContentBlock;

/// Splits free text into paragraph blocks on blank-line boundaries.
///
/// Segments are trimmed and empty ones dropped; source order is kept.
pub fn split_paragraph_blocks(content: &str) -> Vec<ContentBlock> {
    let normalized = content.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(ContentBlock::paragraph)
        .collect()
}

/// Parses comma separated tag input.
///
/// Names are trimmed, empty entries dropped, and repeats (case-sensitive)
/// removed keeping the first occurrence.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in input.split(',').map(str::trim) {
        if name.is_empty() || names.iter().any(|existing| existing == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Trims an optional form field, mapping blank input to `None`.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
