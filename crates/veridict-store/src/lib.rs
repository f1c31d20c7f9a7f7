//! veridict-store — Persisted verdict cache keyed by content fingerprint.
//!
//! The cache is append-only from the application's point of view: entries
//! are inserted once, read many times, and never updated or evicted.
//! Retention is an operational concern, not managed here.

pub mod error;
pub mod repository;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use repository::{CachedVerdict, InsertOutcome, VerdictRepository};
pub use sqlite::SqliteVerdictRepository;
