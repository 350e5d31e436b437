//! Validation of the untyped model answer against [`crate::schema`].
//!
//! Every field is checked for presence, type and enum membership before the
//! typed [`AnalysisReport`] is built; nothing from the wire is trusted as-is.

use delivery_guard_core::{strip_markdown_json, AnalysisReport};
use serde_json::{Map, Value};

use crate::client::truncate;
use crate::error::LlmError;
use crate::schema::{FieldKind, FieldSpec, ANALYSIS_FIELDS};

/// Parses raw model text and validates the resulting document.
///
/// # Errors
/// [`LlmError::EmptyResponse`] for blank text, [`LlmError::JsonParse`] when the
/// text is not JSON, and the errors of [`validate_payload`] otherwise.
pub fn parse_payload(text: &str) -> Result<AnalysisReport, LlmError> {
    let body = strip_markdown_json(text);
    if body.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    let value: Value = serde_json::from_str(body).map_err(|e| LlmError::JsonParse {
        context: format!("analysis payload (content: {})", truncate(body, 300)),
        source: e,
    })?;
    validate_payload(&value)
}

/// Checks a parsed document field by field and normalizes it.
///
/// Text is trimmed, enum values are matched case-insensitively and rewritten
/// to their canonical casing, blank list entries are dropped, and unknown
/// keys are ignored. An absent optional list becomes empty.
///
/// # Errors
/// [`LlmError::MissingField`] if a required field is absent or null,
/// [`LlmError::InvalidField`] if a field has the wrong type, an empty text
/// value or a value outside its enumeration.
pub fn validate_payload(value: &Value) -> Result<AnalysisReport, LlmError> {
    let obj = value.as_object().ok_or_else(|| LlmError::InvalidField {
        field: "<root>".to_owned(),
        reason: "expected a JSON object".to_owned(),
    })?;

    let mut normalized = Map::new();
    for field in ANALYSIS_FIELDS {
        let Some(raw) = obj.get(field.name).filter(|v| !v.is_null()) else {
            if field.required {
                return Err(LlmError::MissingField(field.name.to_owned()));
            }
            continue;
        };
        normalized.insert(field.name.to_owned(), check_field(field, raw)?);
    }

    serde_json::from_value(Value::Object(normalized)).map_err(|e| LlmError::JsonParse {
        context: "validated analysis payload".to_owned(),
        source: e,
    })
}

fn check_field(field: &FieldSpec, raw: &Value) -> Result<Value, LlmError> {
    let invalid = |reason: String| LlmError::InvalidField { field: field.name.to_owned(), reason };

    match field.kind {
        FieldKind::Text => {
            let s = raw.as_str().ok_or_else(|| invalid(format!("expected a string, got {raw}")))?;
            if s.trim().is_empty() {
                return Err(invalid("must not be empty".to_owned()));
            }
            Ok(Value::from(s.trim()))
        },
        FieldKind::Choice { values, canonical } => {
            let s = raw.as_str().ok_or_else(|| invalid(format!("expected a string, got {raw}")))?;
            canonical(s)
                .map(Value::from)
                .map_err(|e| invalid(format!("{e}; expected one of {}", values.join(", "))))
        },
        FieldKind::TextList => {
            let items = raw.as_array().ok_or_else(|| invalid("expected an array".to_owned()))?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let s = item
                    .as_str()
                    .ok_or_else(|| invalid(format!("expected string items, got {item}")))?;
                if !s.trim().is_empty() {
                    out.push(Value::from(s.trim()));
                }
            }
            Ok(Value::Array(out))
        },
    }
}
