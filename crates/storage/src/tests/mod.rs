//! Test utilities and module declarations for storage tests.

use chrono::{TimeZone, Utc};
use delivery_guard_core::{AnalysisReport, AnalysisResult, EffortLevel, RiskLevel};

pub fn create_test_result(
    id: &str,
    title: &str,
    risk_level: RiskLevel,
    millis: i64,
) -> AnalysisResult {
    AnalysisResult {
        id: id.to_owned(),
        timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
        report: AnalysisReport {
            project_title: title.to_owned(),
            understanding: "Understanding".to_owned(),
            functional_complexity: "Complexity".to_owned(),
            non_functional_constraints: "Constraints".to_owned(),
            risk_level,
            risk_justification: "Justification".to_owned(),
            high_risk_modules: vec!["Payments".to_owned()],
            effort: EffortLevel::High,
            architecture_recommendation: "Event-driven".to_owned(),
            tech_stack: vec!["Rust".to_owned()],
            automation_strategy: "CI".to_owned(),
            quality_gates: vec![],
            final_recommendations: vec!["Ship small".to_owned()],
        },
    }
}
