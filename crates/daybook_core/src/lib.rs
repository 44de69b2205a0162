//! # Daybook Core
//!
//! Domain model and local storage traits for Daybook.
//!
//! This crate provides:
//! - The [`Record`] entity and its [`RecordStatus`] lifecycle
//! - The [`RecordStore`] trait for the host's local record table
//! - The [`KeyValueStore`] trait for the host's persistent key-value storage
//!
//! It is a pure domain crate: no network access and no async runtime.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod kv;
mod record;
mod store;

pub use error::{CoreError, CoreResult};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use record::{Record, RecordStatus};
pub use store::{MemoryRecordStore, RecordStore};
