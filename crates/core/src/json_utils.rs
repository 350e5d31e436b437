//! JSON helpers for model output.

/// Strip a markdown code fence wrapped around a JSON body.
///
/// Models asked for JSON-only output still occasionally answer with
/// `` ```json ... ``` ``; any language tag after the opening fence is dropped.
#[must_use]
pub fn strip_markdown_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")) else {
        return trimmed;
    };
    match inner.split_once('\n') {
        Some((_lang, body)) => body.trim(),
        None => inner.trim(),
    }
}
