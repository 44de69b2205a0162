//! # Daybook Sync Engine
//!
//! Offline-first synchronization engine for Daybook.
//!
//! This crate provides:
//! - Session token storage with fail-closed loading
//! - An authenticated API client with one-shot 401 refresh-and-retry
//! - A durable, idempotent operation queue
//! - Record/task translation in both directions
//! - A pull applier that merges remote changes without echoing them back
//! - The sync engine itself: two independent periodic loops owning the
//!   change-feed cursor
//!
//! ## Architecture
//!
//! Local mutations are enqueued by the host as [`SyncOperation`]s
//! (from `daybook_sync_protocol`) whenever they need to reach the server.
//! The push loop submits the full pending batch in queue order; the pull
//! loop follows the server's change feed from the persisted cursor and
//! hands each non-empty batch to the host's callback, which routes it to
//! the [`PullApplier`].
//!
//! ## Key Invariants
//!
//! - An operation leaves the queue only on an explicit `applied`
//!   acknowledgement from the server
//! - Record versions advance only from server responses, never locally
//! - Pulled changes never re-enter the operation queue
//! - The cursor moves only on non-empty pull batches or cursor-bearing
//!   push acknowledgements
//! - Transient failures never stop the timers; the next tick retries
//!
//! [`SyncOperation`]: daybook_sync_protocol::SyncOperation

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod client;
mod config;
mod cursor;
mod engine;
mod error;
mod http;
mod mapper;
mod queue;
mod session;

pub use applier::PullApplier;
pub use client::ApiClient;
pub use config::SyncConfig;
pub use cursor::CursorStore;
pub use engine::{PullCallback, PullOutcome, PushOutcome, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MockHttpClient, ReqwestClient};
pub use mapper::{record_to_payload, snapshot_to_patch, RecordPatch};
pub use queue::OperationQueue;
pub use session::SessionStore;
