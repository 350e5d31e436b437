use std::process::ExitCode;

use anyhow::Result;
use delivery_guard_core::{AnalysisRequest, Settings};
use delivery_guard_service::{AnalysisPhase, ServiceError};
use delivery_guard_storage::HistoryStore;

use super::build_orchestrator;

pub(crate) async fn run(
    settings: &Settings,
    requirements: String,
    timelines: String,
    constraints: String,
) -> Result<ExitCode> {
    let orchestrator =
        build_orchestrator(settings, HistoryStore::open(settings.history_path.clone()))?;
    let request = AnalysisRequest::new(requirements)
        .with_timelines(timelines)
        .with_constraints(constraints);

    let outcome = match orchestrator.submit(request) {
        Ok(handle) => handle.await.unwrap_or_else(|e| Err(ServiceError::Task(e.to_string()))),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        },
        Err(e) => {
            let message = match orchestrator.state().phase {
                AnalysisPhase::Error { message, .. } => message,
                _ => e.user_message(),
            };
            eprintln!("{message}");
            // A result that failed to persist is still shown.
            if let Some(kept) = orchestrator.selected() {
                println!("{}", serde_json::to_string_pretty(&kept)?);
            }
            Ok(ExitCode::FAILURE)
        },
    }
}
