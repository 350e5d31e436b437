//! Analysis state machine.
//!
//! `Idle --submit--> Analyzing --ok--> Idle` (new result selected),
//! `Analyzing --err--> Error`, `Error --submit--> Analyzing`. Selection is
//! orthogonal and may change at any time, including mid-analysis.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use delivery_guard_core::{AnalysisRequest, AnalysisResult, HistoryItem};
use delivery_guard_llm::{build_prompt, LlmError, RequirementAnalyzer};
use delivery_guard_storage::HistoryStore;
use futures_util::FutureExt;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::assembler::ResultAssembler;
use crate::error::{ErrorKind, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisPhase {
    Idle,
    Analyzing,
    Error { kind: ErrorKind, message: String },
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub phase: AnalysisPhase,
    /// Id of the displayed result; `None` shows the input form.
    pub selection: Option<String>,
    /// Summaries, most recent first
    pub history: Vec<HistoryItem>,
}

/// Coordinates prompt building, the remote call, assembly and history.
///
/// At most one analysis is in flight; a `submit` while `Analyzing` is
/// rejected with [`ServiceError::Busy`]. Clones share the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    analyzer: Arc<dyn RequirementAnalyzer>,
    assembler: ResultAssembler,
    store: Mutex<HistoryStore>,
    state: watch::Sender<ViewState>,
    cancel: Mutex<Option<Arc<Notify>>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        analyzer: Arc<dyn RequirementAnalyzer>,
        store: HistoryStore,
        assembler: ResultAssembler,
    ) -> Self {
        let initial = ViewState {
            phase: AnalysisPhase::Idle,
            selection: None,
            history: store.items().to_vec(),
        };
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                analyzer,
                assembler,
                store: Mutex::new(store),
                state,
                cancel: Mutex::new(None),
            }),
        }
    }

    /// Receiver for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    /// Starts an analysis on a background task and returns immediately.
    ///
    /// The state is `Analyzing` when this returns `Ok`. The handle resolves
    /// to the same outcome that is published as state.
    ///
    /// # Errors
    /// [`ServiceError::Busy`] if an analysis is already in flight.
    pub fn submit(
        &self,
        request: AnalysisRequest,
    ) -> Result<JoinHandle<Result<AnalysisResult, ServiceError>>, ServiceError> {
        let flight = self.begin()?;
        let this = self.clone();
        Ok(tokio::spawn(async move { this.run(&request, flight).await }))
    }

    /// Runs an analysis to completion on the current task.
    ///
    /// Same state transitions as [`Orchestrator::submit`]. Dropping the
    /// returned future before it completes settles the state as a cancelled
    /// transport error.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, ServiceError> {
        let flight = self.begin()?;
        self.run(&request, flight).await
    }

    /// Aborts the in-flight remote call, if any. The analysis then fails
    /// with a cancelled transport error and history is untouched.
    pub fn cancel(&self) -> bool {
        match lock(&self.inner.cancel).as_ref() {
            Some(notify) => {
                notify.notify_one();
                true
            },
            None => false,
        }
    }

    /// Displays a stored result. Does not affect an in-flight analysis.
    ///
    /// # Errors
    /// [`ServiceError::NotFound`] for an unknown id; selection is unchanged.
    pub fn select_history(&self, id: &str) -> Result<AnalysisResult, ServiceError> {
        let result = self.get(id).ok_or_else(|| ServiceError::NotFound(id.to_owned()))?;
        self.inner.state.send_modify(|s| s.selection = Some(result.id.clone()));
        Ok(result)
    }

    /// Clears the selection to show the input form.
    pub fn new_analysis(&self) {
        self.inner.state.send_if_modified(|s| s.selection.take().is_some());
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<AnalysisResult> {
        lock(&self.inner.store).get(id).cloned()
    }

    /// The currently displayed result, if any.
    #[must_use]
    pub fn selected(&self) -> Option<AnalysisResult> {
        let selection = self.inner.state.borrow().selection.clone()?;
        self.get(&selection)
    }

    #[must_use]
    pub fn history(&self) -> Vec<HistoryItem> {
        lock(&self.inner.store).items().to_vec()
    }

    /// Retries writing history after a failed append. On success a pending
    /// storage error is cleared back to `Idle`.
    pub fn retry_persist(&self) -> Result<(), ServiceError> {
        lock(&self.inner.store).persist()?;
        self.inner.state.send_if_modified(|s| {
            if !matches!(s.phase, AnalysisPhase::Error { kind: ErrorKind::Storage, .. }) {
                return false;
            }
            s.phase = AnalysisPhase::Idle;
            true
        });
        tracing::info!("history flushed");
        Ok(())
    }

    /// `Idle | Error -> Analyzing`, or `Busy` if already analyzing.
    fn begin(&self) -> Result<InFlight, ServiceError> {
        let started = self.inner.state.send_if_modified(|s| {
            if s.phase == AnalysisPhase::Analyzing {
                return false;
            }
            s.phase = AnalysisPhase::Analyzing;
            true
        });
        if !started {
            tracing::warn!("analysis rejected: another one is in flight");
            return Err(ServiceError::Busy);
        }
        let cancel = Arc::new(Notify::new());
        *lock(&self.inner.cancel) = Some(Arc::clone(&cancel));
        Ok(InFlight { orchestrator: self.clone(), cancel, armed: true })
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        flight: InFlight,
    ) -> Result<AnalysisResult, ServiceError> {
        let produced = self.produce(request, &flight.cancel).await;
        lock(&self.inner.cancel).take();

        let outcome = match produced {
            Ok(result) => self.commit(result),
            Err(e) => {
                self.fail(&e, None);
                Err(e)
            },
        };
        flight.disarm();
        outcome
    }

    /// Appends a produced result and publishes `Idle` with it selected.
    fn commit(&self, result: AnalysisResult) -> Result<AnalysisResult, ServiceError> {
        let (appended, history) = {
            let mut store = lock(&self.inner.store);
            let appended = store.append(result.clone());
            (appended, store.items().to_vec())
        };

        match appended {
            Ok(_) => {
                tracing::info!(id = %result.id, risk = %result.risk_level(), "analysis stored");
                self.inner.state.send_modify(|s| {
                    s.phase = AnalysisPhase::Idle;
                    s.selection = Some(result.id.clone());
                    s.history = history;
                });
                Ok(result)
            },
            Err(e) => {
                let err = ServiceError::from(e);
                let kept = history.iter().any(|item| item.id == result.id);
                self.fail(&err, kept.then(|| (history, result.id.clone())));
                Err(err)
            },
        }
    }

    async fn produce(
        &self,
        request: &AnalysisRequest,
        cancel: &Notify,
    ) -> Result<AnalysisResult, ServiceError> {
        let prompt = build_prompt(request)?;
        tracing::info!(
            requirements_len = request.requirements.len(),
            "starting delivery analysis"
        );

        let call = AssertUnwindSafe(self.inner.analyzer.analyze(&prompt)).catch_unwind();
        let report = tokio::select! {
            outcome = call => match outcome {
                Ok(report) => report?,
                Err(panic) => return Err(ServiceError::Task(panic_message(panic.as_ref()))),
            },
            () = cancel.notified() => return Err(LlmError::Cancelled.into()),
        };
        Ok(self.inner.assembler.assemble(report))
    }

    /// `Analyzing -> Error`. `kept` carries the history and id of a result
    /// that stayed in memory despite a failed write.
    fn fail(&self, err: &ServiceError, kept: Option<(Vec<HistoryItem>, String)>) {
        tracing::warn!(error = %err, kind = ?err.kind(), "analysis failed");
        let phase = AnalysisPhase::Error { kind: err.kind(), message: err.user_message() };
        self.inner.state.send_modify(|s| {
            s.phase = phase;
            if let Some((history, id)) = kept {
                s.history = history;
                s.selection = Some(id);
            }
        });
    }
}

/// Ticket for the analysis in flight, owned by `run`.
///
/// Dropped while still armed (the `analyze` future was dropped or the
/// spawned task aborted), it clears the cancel slot and settles the phase as
/// a cancelled transport error so later submits are not refused.
struct InFlight {
    orchestrator: Orchestrator,
    cancel: Arc<Notify>,
    armed: bool,
}

impl InFlight {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        lock(&self.orchestrator.inner.cancel).take();
        self.orchestrator.fail(&ServiceError::Llm(LlmError::Cancelled), None);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "analyzer panicked".to_owned())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
