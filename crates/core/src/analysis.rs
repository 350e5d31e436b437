//! Analysis request, report and result types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Free-text input collected from the user for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Business requirements; must not be blank
    pub requirements: String,
    /// Expected timelines, may be empty
    #[serde(default)]
    pub timelines: String,
    /// Known constraints, may be empty
    #[serde(default)]
    pub constraints: String,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(requirements: impl Into<String>) -> Self {
        Self { requirements: requirements.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_timelines(mut self, timelines: impl Into<String>) -> Self {
        self.timelines = timelines.into();
        self
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    /// Checks that `requirements` carries non-whitespace text.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` if `requirements` is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.requirements.trim().is_empty() {
            return Err(CoreError::InvalidInput("requirements must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Overall delivery risk assigned by the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL_VARIANTS: &'static [&'static str] = &["Low", "Medium", "High", "Critical"];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(CoreError::InvalidRiskLevel(s.trim().to_owned())),
        }
    }
}

/// Development effort estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

impl EffortLevel {
    pub const ALL_VARIANTS: &'static [&'static str] = &["Low", "Medium", "High"];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffortLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(CoreError::InvalidEffortLevel(s.trim().to_owned())),
        }
    }
}

/// Validated structured output of the remote model, before identity is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Short 3-5 word title derived from the requirements
    pub project_title: String,
    /// Executive summary of the requirements
    pub understanding: String,
    pub functional_complexity: String,
    pub non_functional_constraints: String,
    pub risk_level: RiskLevel,
    pub risk_justification: String,
    #[serde(default)]
    pub high_risk_modules: Vec<String>,
    pub effort: EffortLevel,
    pub architecture_recommendation: String,
    pub tech_stack: Vec<String>,
    /// CI/CD and testing automation recommendations
    pub automation_strategy: String,
    pub quality_gates: Vec<String>,
    /// Actionable next steps
    pub final_recommendations: Vec<String>,
}

impl AnalysisReport {
    /// Checks that every required text field carries non-whitespace text.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` naming the first blank field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("projectTitle", &self.project_title),
            ("understanding", &self.understanding),
            ("functionalComplexity", &self.functional_complexity),
            ("nonFunctionalConstraints", &self.non_functional_constraints),
            ("riskJustification", &self.risk_justification),
            ("architectureRecommendation", &self.architecture_recommendation),
            ("automationStrategy", &self.automation_strategy),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(CoreError::InvalidInput(format!("{name} must not be blank"))),
            None => Ok(()),
        }
    }
}

/// Canonical persisted report: a validated [`AnalysisReport`] plus identity and capture time.
///
/// Serializes flat, with `timestamp` as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

impl AnalysisResult {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.report.project_title
    }

    #[must_use]
    pub const fn risk_level(&self) -> RiskLevel {
        self.report.risk_level
    }
}
