use std::process::ExitCode;

use anyhow::Result;
use delivery_guard_core::Settings;
use delivery_guard_storage::HistoryStore;

pub(crate) fn run(settings: &Settings) -> Result<ExitCode> {
    let store = HistoryStore::peek_file(settings.history_path.clone());
    let key = if settings.has_credential() { "set" } else { "missing" };

    println!("api key:   {key}");
    println!("base url:  {}", settings.base_url);
    println!("model:     {}", settings.model);
    println!("timeout:   {}s", settings.timeout_secs);
    println!("retries:   {}", settings.max_retries);
    println!("history:   {}", settings.history_path.display());
    println!("analyses:  {}", store.len());
    Ok(ExitCode::SUCCESS)
}
