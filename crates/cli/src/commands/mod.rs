use std::sync::Arc;

use anyhow::Result;
use delivery_guard_core::Settings;
use delivery_guard_llm::{LlmClient, RemoteAnalysisClient};
use delivery_guard_service::{Orchestrator, ResultAssembler};
use delivery_guard_storage::HistoryStore;

pub(crate) mod analyze;
pub(crate) mod history;
pub(crate) mod status;

/// `store` comes from [`HistoryStore::open`] for commands that may write and
/// [`HistoryStore::peek_file`] for those that only read.
pub(crate) fn build_orchestrator(settings: &Settings, store: HistoryStore) -> Result<Orchestrator> {
    let llm = LlmClient::from_settings(settings)?;
    Ok(Orchestrator::new(
        Arc::new(RemoteAnalysisClient::new(llm)),
        store,
        ResultAssembler::default(),
    ))
}
