use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use delivery_guard_core::{AnalysisReport, AnalysisResult};

/// Source of result identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random (v4) UUIDs: 122 random bits from the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Attaches identity and capture time to a validated report.
#[derive(Clone)]
pub struct ResultAssembler {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator), Arc::new(SystemClock))
    }
}

impl ResultAssembler {
    #[must_use]
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// Timestamps are truncated to milliseconds, the persisted precision, so
    /// a stored result reloads equal to the one returned here.
    #[must_use]
    pub fn assemble(&self, report: AnalysisReport) -> AnalysisResult {
        AnalysisResult {
            id: self.ids.generate(),
            timestamp: self.clock.now().trunc_subsecs(3),
            report,
        }
    }
}
