use std::collections::{BTreeMap, HashSet};

use delivery_guard_core::{AnalysisResult, HistoryItem};
use serde::{Deserialize, Serialize};

/// Persisted form of the history: both named slots in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Summaries, most recent first
    #[serde(rename = "dg_history")]
    pub history: Vec<HistoryItem>,
    /// Full reports keyed by id
    #[serde(rename = "dg_results")]
    pub results: BTreeMap<String, AnalysisResult>,
}

impl HistorySnapshot {
    /// Checks the invariants a loaded document must hold: summary ids are
    /// unique and equal the key set of `results`, every body is stored under
    /// its own id and is complete, and every summary is exactly the
    /// projection of its body.
    ///
    /// # Errors
    /// Returns a description of the first violation found.
    pub fn verify(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(self.history.len());
        for item in &self.history {
            if !seen.insert(item.id.as_str()) {
                return Err(format!("summary {} appears twice", item.id));
            }
            let Some(result) = self.results.get(&item.id) else {
                return Err(format!("summary {} has no report", item.id));
            };
            if HistoryItem::from(result) != *item {
                return Err(format!("summary {} does not match its report", item.id));
            }
        }

        for (id, result) in &self.results {
            if !seen.contains(id.as_str()) {
                return Err(format!("report {id} has no summary"));
            }
            if *id != result.id {
                return Err(format!("report stored under {id} carries id {}", result.id));
            }
            result.report.validate().map_err(|e| format!("report {id} is incomplete: {e}"))?;
        }
        Ok(())
    }
}
