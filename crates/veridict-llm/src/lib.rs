//! veridict-llm — LLM backend abstraction and verdict extraction.
//! Wraps the external classification API behind the LlmBackend trait and
//! turns its prose-adjacent replies into validated verdicts.

pub mod audit;
pub mod backend;
pub mod extract;
pub mod prompt;
pub mod requester;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use requester::{Classification, VerdictRequester};
