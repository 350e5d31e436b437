//! Declared shape of the structured output requested from the model.
//!
//! The same table drives the `response_format` sent with every request and
//! the validator applied to every answer. `id` and `timestamp` are assigned
//! locally and never requested.

use delivery_guard_core::{CoreError, EffortLevel, RiskLevel};
use serde_json::{json, Map, Value};

/// Name under which the schema is sent in `response_format.json_schema`.
pub const SCHEMA_NAME: &str = "delivery_analysis";

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Non-empty string
    Text,
    /// String restricted to `values`; `canonical` maps any accepted spelling
    /// to its canonical form
    Choice {
        values: &'static [&'static str],
        canonical: fn(&str) -> Result<&'static str, CoreError>,
    },
    /// Array of strings, may be empty
    TextList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// camelCase wire name
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: Option<&'static str>,
    pub required: bool,
}

const fn text(name: &'static str, description: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Text, description: Some(description), required: true }
}

const fn list(name: &'static str, description: &'static str, required: bool) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::TextList, description: Some(description), required }
}

const fn choice(
    name: &'static str,
    values: &'static [&'static str],
    canonical: fn(&str) -> Result<&'static str, CoreError>,
) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Choice { values, canonical },
        description: None,
        required: true,
    }
}

fn canonical_risk(s: &str) -> Result<&'static str, CoreError> {
    s.parse::<RiskLevel>().map(|level| level.as_str())
}

fn canonical_effort(s: &str) -> Result<&'static str, CoreError> {
    s.parse::<EffortLevel>().map(|level| level.as_str())
}

pub const ANALYSIS_FIELDS: &[FieldSpec] = &[
    text("projectTitle", "A short, 3-5 word title derived from the requirements."),
    text("understanding", "Executive summary of the requirements."),
    text("functionalComplexity", "Analysis of functional complexity."),
    text(
        "nonFunctionalConstraints",
        "Analysis of non-functional constraints (performance, security, etc).",
    ),
    choice("riskLevel", RiskLevel::ALL_VARIANTS, canonical_risk),
    text("riskJustification", "Why this risk level was assigned."),
    list("highRiskModules", "List of specific modules that are high risk.", false),
    choice("effort", EffortLevel::ALL_VARIANTS, canonical_effort),
    text("architectureRecommendation", "Recommended architecture pattern."),
    list("techStack", "Recommended technologies.", true),
    text("automationStrategy", "CI/CD and testing automation recommendations."),
    list("qualityGates", "Specific quality gates before release.", true),
    list("finalRecommendations", "Actionable next steps.", true),
];

/// Names of the fields the model must always return.
pub fn required_fields() -> impl Iterator<Item = &'static str> {
    ANALYSIS_FIELDS.iter().filter(|f| f.required).map(|f| f.name)
}

/// JSON Schema document for the `response_format` directive.
#[must_use]
pub fn response_schema() -> Value {
    let mut properties = Map::new();
    for field in ANALYSIS_FIELDS {
        let mut property = match field.kind {
            FieldKind::Text => json!({ "type": "string" }),
            FieldKind::Choice { values, .. } => json!({ "type": "string", "enum": values }),
            FieldKind::TextList => json!({ "type": "array", "items": { "type": "string" } }),
        };
        if let (Some(description), Some(obj)) = (field.description, property.as_object_mut()) {
            obj.insert("description".to_owned(), Value::from(description));
        }
        properties.insert(field.name.to_owned(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required_fields().collect::<Vec<_>>(),
    })
}
