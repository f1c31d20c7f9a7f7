//! veridict-web — HTTP surface for the claim checker.
//! Provides the verification endpoint:
//!   - input sanitization and payload bounds
//!   - per-client rate limiting
//!   - fingerprint cache in front of the external classifier
//!   - structurally guaranteed response shapes, including the 500 path

pub mod config;
pub mod handlers;
pub mod pipeline;
pub mod ratelimit;
pub mod router;
pub mod state;
