//! # Daybook Sync Protocol
//!
//! Wire types for the Daybook sync protocol.
//!
//! This crate provides:
//! - [`SyncOperation`] for queued local mutations
//! - [`TaskPayload`] and [`TaskSnapshot`] for the server task shape
//! - Push, pull, and token-refresh messages
//! - [`Conflict`] for version-mismatch reports
//!
//! All types serialize as JSON. Deserialization is deliberately tolerant:
//! unknown or missing fields fall back to defaults so that a malformed
//! server payload degrades to safe values instead of failing a whole batch.
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod messages;
mod operation;
mod task;

pub use conflict::{Conflict, ConflictLatest};
pub use messages::{
    PullChange, PullResponse, PushRequest, PushResponse, RefreshRequest, SessionTokens,
};
pub use operation::{new_op_id, OperationKind, SyncOperation};
pub use task::{TaskPayload, TaskSnapshot};
