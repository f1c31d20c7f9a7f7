//! veridict-common — Shared types and errors used across all Veridict crates.

pub mod error;
pub mod text;
pub mod verdict;

// Re-export commonly used types
pub use error::{Result, VeridictError};
pub use text::{fingerprint, sanitize, NormalizedText};
pub use verdict::{SourceRef, Verdict, VerdictStatus};
