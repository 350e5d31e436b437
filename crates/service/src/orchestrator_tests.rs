use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use delivery_guard_core::{AnalysisReport, AnalysisRequest, EffortLevel, RiskLevel};
use delivery_guard_llm::{
    AnalysisPrompt, LlmClient, LlmError, RemoteAnalysisClient, RequirementAnalyzer,
};
use delivery_guard_storage::{HistoryStore, MemoryBackend};
use tokio::sync::Notify;

use crate::{
    AnalysisPhase, Clock, ErrorKind, IdGenerator, Orchestrator, ResultAssembler, ServiceError,
};

pub(crate) fn sample_report(title: &str) -> AnalysisReport {
    AnalysisReport {
        project_title: title.to_owned(),
        understanding: "Sales team needs a CRM.".to_owned(),
        functional_complexity: "Moderate".to_owned(),
        non_functional_constraints: "SSO".to_owned(),
        risk_level: RiskLevel::Medium,
        risk_justification: "Familiar domain".to_owned(),
        high_risk_modules: vec![],
        effort: EffortLevel::Medium,
        architecture_recommendation: "Modular monolith".to_owned(),
        tech_stack: vec!["Rust".to_owned()],
        automation_strategy: "CI".to_owned(),
        quality_gates: vec!["Green build".to_owned()],
        final_recommendations: vec!["Pilot with one team".to_owned()],
    }
}

struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Each call moves the clock by `step` milliseconds, which may be negative.
struct SteppingClock {
    millis: AtomicI64,
    step: i64,
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.fetch_add(self.step, Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).unwrap()
    }
}

fn deterministic_assembler(step: i64) -> ResultAssembler {
    ResultAssembler::new(
        Arc::new(SequentialIds(AtomicUsize::new(0))),
        Arc::new(SteppingClock { millis: AtomicI64::new(1_700_000_000_000), step }),
    )
}

/// Replays scripted outcomes in order; `Ok` once the script runs out.
#[derive(Default)]
struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Result<AnalysisReport, LlmError>>>,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    fn with(outcomes: Vec<Result<AnalysisReport, LlmError>>) -> Self {
        Self { script: Mutex::new(outcomes.into()), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl RequirementAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, _prompt: &AnalysisPrompt) -> Result<AnalysisReport, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(sample_report(&format!("Project {n}"))))
    }
}

/// Holds every call until released, recording peak concurrency.
#[derive(Default)]
struct GatedAnalyzer {
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl RequirementAnalyzer for GatedAnalyzer {
    async fn analyze(&self, _prompt: &AnalysisPrompt) -> Result<AnalysisReport, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(sample_report("Gated Project"))
    }
}

struct PanickingAnalyzer;

#[async_trait]
impl RequirementAnalyzer for PanickingAnalyzer {
    async fn analyze(&self, _prompt: &AnalysisPrompt) -> Result<AnalysisReport, LlmError> {
        panic!("analyzer exploded")
    }
}

fn orchestrator(analyzer: Arc<dyn RequirementAnalyzer>, backend: &MemoryBackend) -> Orchestrator {
    Orchestrator::new(analyzer, HistoryStore::load(backend.clone()), deterministic_assembler(1))
}

fn crm() -> AnalysisRequest {
    AnalysisRequest::new("Build a CRM")
}

#[tokio::test]
async fn successful_analysis_appends_and_selects() {
    let backend = MemoryBackend::new();
    let orch = orchestrator(Arc::new(ScriptedAnalyzer::default()), &backend);

    let handle = orch.submit(crm()).unwrap();
    let result = handle.await.unwrap().unwrap();

    let state = orch.state();
    assert_eq!(state.phase, AnalysisPhase::Idle);
    assert_eq!(state.selection.as_deref(), Some("id-1"));
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.history[0].id, result.id);
    assert_eq!(orch.get("id-1"), Some(result.clone()));
    assert_eq!(orch.selected(), Some(result));
    assert_eq!(backend.write_count(), 1);
}

#[tokio::test]
async fn history_is_most_recent_first_even_with_backwards_clock() {
    let backend = MemoryBackend::new();
    let orch = Orchestrator::new(
        Arc::new(ScriptedAnalyzer::default()),
        HistoryStore::load(backend.clone()),
        deterministic_assembler(-60_000),
    );

    for _ in 0..3 {
        orch.analyze(crm()).await.unwrap();
    }
    let ids: Vec<_> = orch.history().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["id-3", "id-2", "id-1"]);
    assert!(orch.history()[0].timestamp < orch.history()[2].timestamp);
}

#[tokio::test]
async fn malformed_response_leaves_history_untouched() {
    let backend = MemoryBackend::new();
    let analyzer = ScriptedAnalyzer::with(vec![
        Ok(sample_report("Kept")),
        Err(LlmError::MissingField("riskLevel".to_owned())),
    ]);
    let orch = orchestrator(Arc::new(analyzer), &backend);
    orch.analyze(crm()).await.unwrap();

    let err = orch.analyze(crm()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);

    let state = orch.state();
    assert!(matches!(state.phase, AnalysisPhase::Error { kind: ErrorKind::MalformedResponse, .. }));
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.selection.as_deref(), Some("id-1"));
    assert_eq!(backend.write_count(), 1);
}

#[tokio::test]
async fn missing_credential_fails_without_network() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::any())
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let llm = LlmClient::new(String::new(), server.uri(), 5).unwrap();
    let backend = MemoryBackend::new();
    let orch = orchestrator(Arc::new(RemoteAnalysisClient::new(llm)), &backend);

    let err = orch.analyze(AnalysisRequest::new("Build a CRM")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    match orch.state().phase {
        AnalysisPhase::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::Configuration);
            assert!(message.contains("API key is missing"));
        },
        other => panic!("unexpected phase {other:?}"),
    }
    assert!(orch.history().is_empty());
    assert!(backend.document().is_none());
}

#[tokio::test]
async fn blank_requirements_rejected_before_remote_call() {
    let backend = MemoryBackend::new();
    let analyzer = Arc::new(ScriptedAnalyzer::default());
    let orch = orchestrator(analyzer.clone(), &backend);

    let err = orch.analyze(AnalysisRequest::new("   ")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_submit_while_analyzing_is_busy() {
    let backend = MemoryBackend::new();
    let analyzer = Arc::new(GatedAnalyzer::default());
    let orch = orchestrator(analyzer.clone(), &backend);

    let first = orch.submit(crm()).unwrap();
    assert_eq!(orch.state().phase, AnalysisPhase::Analyzing);
    analyzer.entered.notified().await;

    assert!(matches!(orch.submit(crm()), Err(ServiceError::Busy)));
    assert!(matches!(orch.analyze(crm()).await, Err(ServiceError::Busy)));
    assert_eq!(orch.state().phase, AnalysisPhase::Analyzing);

    analyzer.release.notify_one();
    first.await.unwrap().unwrap();

    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(analyzer.peak.load(Ordering::SeqCst), 1);
    assert_eq!(orch.history().len(), 1);
}

#[tokio::test]
async fn resubmit_after_error_clears_it() {
    let backend = MemoryBackend::new();
    let analyzer = ScriptedAnalyzer::with(vec![Err(LlmError::EmptyResponse)]);
    let orch = orchestrator(Arc::new(analyzer), &backend);

    assert!(orch.analyze(crm()).await.is_err());
    assert!(matches!(orch.state().phase, AnalysisPhase::Error { kind: ErrorKind::EmptyResponse, .. }));

    let mut rx = orch.subscribe();
    let handle = orch.submit(crm()).unwrap();
    assert_eq!(rx.borrow_and_update().phase, AnalysisPhase::Analyzing);
    handle.await.unwrap().unwrap();
    assert_eq!(orch.state().phase, AnalysisPhase::Idle);
}

#[tokio::test]
async fn selecting_history_mid_analysis_does_not_cancel() {
    let backend = MemoryBackend::new();
    let analyzer = Arc::new(GatedAnalyzer::default());
    let orch = orchestrator(analyzer.clone(), &backend);

    let first = orch.submit(crm()).unwrap();
    analyzer.entered.notified().await;
    analyzer.release.notify_one();
    first.await.unwrap().unwrap();

    let second = orch.submit(crm()).unwrap();
    analyzer.entered.notified().await;
    let shown = orch.select_history("id-1").unwrap();
    assert_eq!(orch.state().selection.as_deref(), Some("id-1"));
    assert_eq!(orch.state().phase, AnalysisPhase::Analyzing);

    analyzer.release.notify_one();
    let produced = second.await.unwrap().unwrap();
    assert_eq!(produced.id, "id-2");
    assert_eq!(orch.state().selection.as_deref(), Some("id-2"));
    assert_eq!(orch.get("id-1"), Some(shown));
}

#[tokio::test]
async fn selecting_unknown_id_is_not_found_and_keeps_selection() {
    let backend = MemoryBackend::new();
    let orch = orchestrator(Arc::new(ScriptedAnalyzer::default()), &backend);
    orch.analyze(crm()).await.unwrap();

    let err = orch.select_history("nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(orch.state().selection.as_deref(), Some("id-1"));

    orch.new_analysis();
    assert_eq!(orch.state().selection, None);
    assert!(orch.selected().is_none());
}

#[tokio::test]
async fn cancel_aborts_in_flight_call_without_storing() {
    let backend = MemoryBackend::new();
    let analyzer = Arc::new(GatedAnalyzer::default());
    let orch = orchestrator(analyzer.clone(), &backend);

    let handle = orch.submit(crm()).unwrap();
    analyzer.entered.notified().await;
    assert!(orch.cancel());

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, ServiceError::Llm(LlmError::Cancelled)));
    assert!(matches!(orch.state().phase, AnalysisPhase::Error { kind: ErrorKind::Transport, .. }));
    assert!(orch.history().is_empty());
    assert_eq!(backend.write_count(), 0);
    assert!(!orch.cancel());
}

#[tokio::test]
async fn storage_failure_keeps_result_in_memory() {
    let backend = MemoryBackend::new();
    backend.set_fail_writes(true);
    let orch = orchestrator(Arc::new(ScriptedAnalyzer::default()), &backend);

    let err = orch.analyze(crm()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    let state = orch.state();
    assert!(matches!(state.phase, AnalysisPhase::Error { kind: ErrorKind::Storage, .. }));
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.selection.as_deref(), Some("id-1"));
    assert!(backend.document().is_none());

    assert!(orch.retry_persist().is_err());
    assert!(matches!(orch.state().phase, AnalysisPhase::Error { kind: ErrorKind::Storage, .. }));

    backend.set_fail_writes(false);
    orch.retry_persist().unwrap();
    assert_eq!(orch.state().phase, AnalysisPhase::Idle);
    assert_eq!(orch.state().selection.as_deref(), Some("id-1"));
    assert!(HistoryStore::load(backend).contains("id-1"));
}

#[tokio::test]
async fn dropped_analyze_settles_as_cancelled() {
    let backend = MemoryBackend::new();
    let analyzer = Arc::new(GatedAnalyzer::default());
    let orch = orchestrator(analyzer.clone(), &backend);

    let timed_out = tokio::time::timeout(Duration::from_millis(50), orch.analyze(crm())).await;
    assert!(timed_out.is_err());

    match orch.state().phase {
        AnalysisPhase::Error { kind, .. } => assert_eq!(kind, ErrorKind::Transport),
        other => panic!("unexpected phase {other:?}"),
    }
    assert!(!orch.cancel());
    assert!(orch.history().is_empty());

    let handle = orch.submit(crm()).unwrap();
    analyzer.release.notify_one();
    handle.await.unwrap().unwrap();
    assert_eq!(orch.state().phase, AnalysisPhase::Idle);
    assert_eq!(orch.history().len(), 1);
}

#[tokio::test]
async fn aborted_submit_settles_as_cancelled() {
    let backend = MemoryBackend::new();
    let analyzer = Arc::new(GatedAnalyzer::default());
    let orch = orchestrator(analyzer.clone(), &backend);

    let handle = orch.submit(crm()).unwrap();
    analyzer.entered.notified().await;
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    assert!(matches!(orch.state().phase, AnalysisPhase::Error { kind: ErrorKind::Transport, .. }));
    assert!(!orch.cancel());
    assert_eq!(backend.write_count(), 0);
    assert!(orch.submit(crm()).is_ok());
}

#[tokio::test]
async fn analyzer_panic_settles_as_task_error() {
    let backend = MemoryBackend::new();
    let orch = orchestrator(Arc::new(PanickingAnalyzer), &backend);

    let err = orch.submit(crm()).unwrap().await.unwrap().unwrap_err();
    assert!(matches!(err, ServiceError::Task(ref m) if m.contains("analyzer exploded")));

    match orch.state().phase {
        AnalysisPhase::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::Transport);
            assert!(message.contains("analyzer exploded"));
        },
        other => panic!("unexpected phase {other:?}"),
    }
    assert!(!orch.cancel());

    assert!(matches!(orch.analyze(crm()).await, Err(ServiceError::Task(_))));
    assert!(orch.history().is_empty());
}

#[tokio::test]
async fn existing_history_is_published_at_start() {
    let backend = MemoryBackend::new();
    orchestrator(Arc::new(ScriptedAnalyzer::default()), &backend).analyze(crm()).await.unwrap();

    let reopened = orchestrator(Arc::new(ScriptedAnalyzer::default()), &backend);
    let state = reopened.state();
    assert_eq!(state.phase, AnalysisPhase::Idle);
    assert_eq!(state.selection, None);
    assert_eq!(state.history.len(), 1);
    assert!(reopened.select_history("id-1").is_ok());
}
