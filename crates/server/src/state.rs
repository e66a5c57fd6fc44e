use deskpilot_protocol::ExecutionRecord;
use deskpilot_retrieval::{ConversationHistory, RetrievalService};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

/// Records kept before the oldest ones are dropped.
pub(crate) const EXECUTION_LOG_CAPACITY: usize = 256;

/// Records `GET /monitor` reports.
pub(crate) const MONITOR_WINDOW: usize = 10;

/// Bounded record of resolved executions, newest last.
#[derive(Debug, Default)]
pub struct ExecutionLog {
    records: VecDeque<ExecutionRecord>,
}

impl ExecutionLog {
    pub fn push(&mut self, record: ExecutionRecord) {
        if self.records.len() == EXECUTION_LOG_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The most recent `count` records, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<ExecutionRecord> {
        let skip = self.records.len().saturating_sub(count);
        self.records.iter().skip(skip).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared state behind the HTTP handlers.
///
/// Resolution takes the service read lock; registration takes the write
/// lock for the duration of the index rebuild, so a rebuild can never run
/// concurrently with a resolve. History and log are independent locks
/// held only for snapshots and appends.
#[derive(Clone)]
pub struct AppState {
    pub(crate) service: Arc<RwLock<RetrievalService>>,
    pub(crate) history: Arc<Mutex<ConversationHistory>>,
    pub(crate) log: Arc<Mutex<ExecutionLog>>,
}

impl AppState {
    #[must_use]
    pub fn new(service: RetrievalService) -> Self {
        Self {
            service: Arc::new(RwLock::new(service)),
            history: Arc::new(Mutex::new(ConversationHistory::new())),
            log: Arc::new(Mutex::new(ExecutionLog::default())),
        }
    }
}
