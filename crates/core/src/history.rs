use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, RiskLevel};

/// Lightweight summary of an [`AnalysisResult`] used for list rendering.
///
/// Frozen at insertion time; shares its `id` with the full result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
}

impl From<&AnalysisResult> for HistoryItem {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            id: result.id.clone(),
            title: result.report.project_title.clone(),
            timestamp: result.timestamp,
            risk_level: result.report.risk_level,
        }
    }
}
