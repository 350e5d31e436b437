use std::process::ExitCode;

use anyhow::Result;
use delivery_guard_core::Settings;
use delivery_guard_storage::HistoryStore;

use super::build_orchestrator;

pub(crate) fn run_history(settings: &Settings, limit: usize) -> Result<ExitCode> {
    let store = HistoryStore::peek_file(settings.history_path.clone());
    let orchestrator = build_orchestrator(settings, store)?;
    let items: Vec<_> = orchestrator.history().into_iter().take(limit).collect();
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn run_show(settings: &Settings, id: &str) -> Result<ExitCode> {
    let store = HistoryStore::peek_file(settings.history_path.clone());
    let orchestrator = build_orchestrator(settings, store)?;
    match orchestrator.select_history(id) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        },
        Err(_) => {
            println!("Analysis not found: {id}");
            Ok(ExitCode::FAILURE)
        },
    }
}
