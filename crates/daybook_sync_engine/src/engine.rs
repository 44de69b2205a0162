//! The sync engine: two periodic loops and the cursor they share.

use crate::client::ApiClient;
use crate::config::SyncConfig;
use crate::cursor::CursorStore;
use crate::error::SyncResult;
use crate::http::{HttpClient, ReqwestClient};
use crate::queue::OperationQueue;
use crate::session::SessionStore;
use daybook_core::{KeyValueStore, RecordStore};
use daybook_sync_protocol::{Conflict, PullChange, PullResponse, PushRequest, PushResponse, SyncOperation};
use parking_lot::{Mutex, RwLock};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Callback invoked with each non-empty pull batch.
///
/// The host routes the batch to a [`crate::PullApplier`] and refreshes
/// any derived state.
pub type PullCallback = Arc<dyn Fn(&[PullChange]) + Send + Sync>;

/// Outcome of one push cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The queue was empty; no network call was made.
    Idle,
    /// The server acknowledged the batch.
    Completed {
        /// Number of operations the server applied.
        applied: usize,
        /// Number of conflicts the server reported.
        conflicts: usize,
    },
    /// Transient failure; the batch stays queued for the next tick.
    Failed(String),
}

/// Outcome of one pull cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The feed had nothing new; the cursor is unchanged.
    Empty,
    /// A batch was received and handed to the callback.
    Received {
        /// Number of changes in the batch.
        changes: usize,
    },
    /// Transient failure; retried on the next tick.
    Failed(String),
}

/// Running totals over the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Push cycles attempted (including idle ones).
    pub push_cycles: u64,
    /// Pull cycles attempted.
    pub pull_cycles: u64,
    /// Operations acknowledged as applied by the server.
    pub operations_pushed: u64,
    /// Changes received from the pull feed.
    pub changes_pulled: u64,
    /// Conflicts reported by the server.
    pub conflicts_seen: u64,
    /// Most recent cycle failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// Orchestrates the push and pull loops.
///
/// The engine owns its timer handles and injected dependencies, so
/// multiple independent instances can coexist (one per test, typically).
/// Loops are spawned on the ambient tokio runtime by [`start`] and wound
/// down by [`stop`]; each loop is a single task that awaits one cycle to
/// completion before taking the next tick, so cycles of the same kind
/// never overlap even when a request outlives the interval.
///
/// [`start`]: SyncEngine::start
/// [`stop`]: SyncEngine::stop
pub struct SyncEngine<C: HttpClient> {
    config: SyncConfig,
    api: Arc<ApiClient<C>>,
    session: SessionStore,
    queue: Arc<OperationQueue>,
    cursor: CursorStore,
    records: Arc<dyn RecordStore>,
    stats: Arc<RwLock<SyncStats>>,
    /// Shutdown signal for the running loops, if armed.
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl<C: HttpClient> SyncEngine<C> {
    /// Creates an engine over the given HTTP client and stores.
    ///
    /// The key-value store carries the session tokens, the operation
    /// queue, and the cursor; the record store is the host's local
    /// record table.
    pub fn new(
        config: SyncConfig,
        client: C,
        kv: Arc<dyn KeyValueStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let session = SessionStore::new(Arc::clone(&kv));
        let api = Arc::new(ApiClient::new(
            config.base_url.clone().unwrap_or_default(),
            client,
            session.clone(),
        ));
        let queue = Arc::new(OperationQueue::new(Arc::clone(&kv)));
        let cursor = CursorStore::new(kv);

        Self {
            config,
            api,
            session,
            queue,
            cursor,
            records,
            stats: Arc::new(RwLock::new(SyncStats::default())),
            shutdown: Mutex::new(None),
        }
    }

    /// Returns the session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Returns the operation queue the host enqueues into.
    pub fn queue(&self) -> &Arc<OperationQueue> {
        &self.queue
    }

    /// Returns the current cursor watermark.
    pub fn cursor(&self) -> String {
        self.cursor.get()
    }

    /// Returns a snapshot of the running totals.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true while the loops are armed.
    pub fn is_running(&self) -> bool {
        self.shutdown.lock().is_some()
    }

    /// Stops both loops.
    ///
    /// Idempotent and safe to call when not running. Pending timers are
    /// cancelled but an in-flight cycle is not aborted: its side effects
    /// (queue mutation, cursor update) still apply, and no further tick
    /// is scheduled afterwards.
    pub fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().take() {
            let _ = shutdown.send(true);
            info!("sync engine stopped");
        }
    }

    fn push_worker(&self) -> PushWorker<C> {
        PushWorker {
            api: Arc::clone(&self.api),
            queue: Arc::clone(&self.queue),
            cursor: self.cursor.clone(),
            records: Arc::clone(&self.records),
            stats: Arc::clone(&self.stats),
        }
    }

    fn pull_worker(&self, callback: Option<PullCallback>) -> PullWorker<C> {
        PullWorker {
            api: Arc::clone(&self.api),
            cursor: self.cursor.clone(),
            stats: Arc::clone(&self.stats),
            limit: self.config.pull_limit,
            callback,
        }
    }

    /// Runs one push cycle immediately, outside the timer schedule.
    pub async fn push_once(&self) -> PushOutcome {
        self.push_worker().cycle().await
    }

    /// Runs one pull cycle immediately, outside the timer schedule.
    ///
    /// The callback, when given, receives the batch exactly as the timer
    /// loop would deliver it.
    pub async fn pull_once(&self, callback: Option<PullCallback>) -> PullOutcome {
        self.pull_worker(callback).cycle().await
    }
}

impl<C: HttpClient + 'static> SyncEngine<C> {
    /// Arms both loops, each with one immediate run.
    ///
    /// A no-op when no remote endpoint is configured or no session tokens
    /// are stored; sync is an optional enhancement, not a precondition
    /// for local use. Calling `start` while running restarts the loops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, on_pull_changes: Option<PullCallback>) {
        if !self.config.has_endpoint() {
            debug!("sync not started: no remote endpoint configured");
            return;
        }
        if !self.session.has_tokens() {
            debug!("sync not started: no session tokens");
            return;
        }

        self.stop();

        let (shutdown, rx) = watch::channel(false);
        let push = Arc::new(self.push_worker());
        let pull = Arc::new(self.pull_worker(on_pull_changes));
        tokio::spawn(run_push_loop(push, self.config.push_interval, rx.clone()));
        tokio::spawn(run_pull_loop(pull, self.config.pull_interval, rx));

        *self.shutdown.lock() = Some(shutdown);
        info!(
            push_interval_ms = self.config.push_interval.as_millis() as u64,
            pull_interval_ms = self.config.pull_interval.as_millis() as u64,
            "sync engine started"
        );
    }
}

impl SyncEngine<ReqwestClient> {
    /// Creates an engine with the shipped reqwest-backed HTTP client,
    /// using the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns a fatal transport error if the HTTP client cannot be
    /// constructed.
    pub fn with_reqwest(
        config: SyncConfig,
        kv: Arc<dyn KeyValueStore>,
        records: Arc<dyn RecordStore>,
    ) -> SyncResult<Self> {
        let client = ReqwestClient::new(config.timeout)?;
        Ok(Self::new(config, client, kv, records))
    }
}

impl<C: HttpClient> Drop for SyncEngine<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Push side of the engine, shared with its loop task.
struct PushWorker<C: HttpClient> {
    api: Arc<ApiClient<C>>,
    queue: Arc<OperationQueue>,
    cursor: CursorStore,
    records: Arc<dyn RecordStore>,
    stats: Arc<RwLock<SyncStats>>,
}

impl<C: HttpClient> PushWorker<C> {
    async fn cycle(&self) -> PushOutcome {
        let pending = self.queue.pending();
        if pending.is_empty() {
            self.stats.write().push_cycles += 1;
            return PushOutcome::Idle;
        }

        let request = PushRequest::new(pending.clone());
        match self
            .api
            .post::<PushResponse, PushRequest>("/sync/push", Some(&request))
            .await
        {
            Ok(response) => {
                self.queue.mark_applied(&response.applied);
                self.cursor.set(&response.new_cursor);
                self.note_conflicts(&pending, &response.conflicts);

                {
                    let mut stats = self.stats.write();
                    stats.push_cycles += 1;
                    stats.operations_pushed += response.applied.len() as u64;
                    stats.conflicts_seen += response.conflicts.len() as u64;
                    stats.last_error = None;
                }
                debug!(
                    applied = response.applied.len(),
                    conflicts = response.conflicts.len(),
                    new_cursor = %response.new_cursor,
                    "push cycle completed"
                );
                PushOutcome::Completed {
                    applied: response.applied.len(),
                    conflicts: response.conflicts.len(),
                }
            }
            Err(e) => {
                let mut stats = self.stats.write();
                stats.push_cycles += 1;
                stats.last_error = Some(e.to_string());
                warn!(error = %e, "push cycle failed, batch stays queued");
                PushOutcome::Failed(e.to_string())
            }
        }
    }

    /// Records the server-side version for each conflicting operation.
    ///
    /// Only the record's version bookmark moves; its content is left
    /// untouched and the operation stays queued with its original payload
    /// and base version. The full server state arrives through the pull
    /// feed, which reconciles content.
    fn note_conflicts(&self, pending: &[SyncOperation], conflicts: &[Conflict]) {
        if conflicts.is_empty() {
            return;
        }
        let by_op_id: HashMap<&str, &SyncOperation> =
            pending.iter().map(|op| (op.op_id.as_str(), op)).collect();

        for conflict in conflicts {
            let Some(op) = conflict
                .op_id
                .as_deref()
                .and_then(|id| by_op_id.get(id).copied())
            else {
                continue;
            };
            let Some(version) = conflict.latest_version().filter(|v| *v > 0) else {
                continue;
            };

            match self.records.get(&op.entity_id) {
                Ok(Some(mut record)) => {
                    record.version = version as u64;
                    if let Err(e) = self.records.upsert(record) {
                        warn!(entity_id = %op.entity_id, error = %e, "failed to bump record version");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(entity_id = %op.entity_id, error = %e, "failed to read record for conflict bookkeeping");
                }
            }
        }
    }
}

/// Pull side of the engine, shared with its loop task.
struct PullWorker<C: HttpClient> {
    api: Arc<ApiClient<C>>,
    cursor: CursorStore,
    stats: Arc<RwLock<SyncStats>>,
    limit: u32,
    callback: Option<PullCallback>,
}

impl<C: HttpClient> PullWorker<C> {
    async fn cycle(&self) -> PullOutcome {
        let cursor = self.cursor.get();
        let path = format!(
            "/sync/pull?cursor={}&limit={}",
            utf8_percent_encode(&cursor, NON_ALPHANUMERIC),
            self.limit
        );

        match self.api.get::<PullResponse>(&path).await {
            Ok(response) => {
                if response.changes.is_empty() {
                    let mut stats = self.stats.write();
                    stats.pull_cycles += 1;
                    stats.last_error = None;
                    return PullOutcome::Empty;
                }

                self.cursor.set(&response.next_cursor);
                if let Some(callback) = &self.callback {
                    callback(&response.changes);
                }

                {
                    let mut stats = self.stats.write();
                    stats.pull_cycles += 1;
                    stats.changes_pulled += response.changes.len() as u64;
                    stats.last_error = None;
                }
                debug!(
                    changes = response.changes.len(),
                    next_cursor = %response.next_cursor,
                    "pull cycle received changes"
                );
                PullOutcome::Received {
                    changes: response.changes.len(),
                }
            }
            Err(e) => {
                let mut stats = self.stats.write();
                stats.pull_cycles += 1;
                stats.last_error = Some(e.to_string());
                warn!(error = %e, "pull cycle failed");
                PullOutcome::Failed(e.to_string())
            }
        }
    }
}

async fn run_push_loop<C: HttpClient>(
    worker: Arc<PushWorker<C>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                worker.cycle().await;
            }
        }
    }
    debug!("push loop stopped");
}

async fn run_pull_loop<C: HttpClient>(
    worker: Arc<PullWorker<C>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                worker.cycle().await;
            }
        }
    }
    debug!("pull loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};
    use daybook_core::{MemoryKeyValueStore, MemoryRecordStore};
    use daybook_sync_protocol::SessionTokens;

    fn engine(client: Arc<MockHttpClient>) -> SyncEngine<Arc<MockHttpClient>> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let engine = SyncEngine::new(SyncConfig::new("https://api.example.com"), client, kv, records);
        engine.session().set_tokens(SessionTokens::new("acc", "ref"));
        engine
    }

    #[tokio::test]
    async fn empty_queue_makes_no_network_call() {
        let mock = Arc::new(MockHttpClient::new());
        let engine = engine(Arc::clone(&mock));

        assert_eq!(engine.push_once().await, PushOutcome::Idle);
        assert_eq!(mock.request_count(), 0);
        assert_eq!(engine.stats().push_cycles, 1);
    }

    #[tokio::test]
    async fn push_failure_keeps_queue_and_records_error() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_error(crate::SyncError::transport_retryable("offline"));
        let engine = engine(Arc::clone(&mock));
        engine
            .queue()
            .add(daybook_sync_protocol::SyncOperation::delete("r1", 1));

        let outcome = engine.push_once().await;
        assert!(matches!(outcome, PushOutcome::Failed(_)));
        assert_eq!(engine.queue().len(), 1);
        assert!(engine.stats().last_error.is_some());
    }

    #[tokio::test]
    async fn pull_encodes_cursor_and_limit() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_response(HttpResponse::json(
            200,
            r#"{"changes":[],"next_cursor":"0"}"#,
        ));
        let engine = engine(Arc::clone(&mock));
        engine.cursor.set("a b/c");

        assert_eq!(engine.pull_once(None).await, PullOutcome::Empty);

        let url = mock.requests()[0].url.clone();
        assert!(url.contains("cursor=a%20b%2Fc"), "url was {url}");
        assert!(url.contains("limit=200"));
    }

    #[tokio::test]
    async fn start_is_a_no_op_without_endpoint_or_tokens() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let engine = SyncEngine::new(
            SyncConfig::disabled(),
            MockHttpClient::new(),
            Arc::clone(&kv),
            Arc::clone(&records),
        );
        engine.start(None);
        assert!(!engine.is_running());

        // Endpoint configured but no stored session.
        let engine = SyncEngine::new(
            SyncConfig::new("https://api.example.com"),
            MockHttpClient::new(),
            kv,
            records,
        );
        engine.start(None);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let engine = engine(Arc::new(MockHttpClient::new()));
        engine.stop();
        engine.start(None);
        assert!(engine.is_running());
        engine.stop();
        assert!(!engine.is_running());
        engine.stop();
    }
}
