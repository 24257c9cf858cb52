//! Vector client walkthrough
//!
//! Runs the reference flow of the `domain_vector` client against a live index: read the
//! index dimension, upsert two sample vectors, fetch them back, patch metadata, query, and
//! remove the samples again.
//!
//! ## Architecture
//!
//! ```text
//! runner::run
//!   ↓ (APP_ENV, tracing, PINECONE_* resolution)
//! flow::reference_flow
//!   ↓
//! VectorClient (domain layer)
//!   ↓ (HTTPS + Api-Key)
//! Index host
//! ```
//!
//! ## Modules
//!
//! - `runner`: Environment, tracing and client setup
//! - `flow`: The walkthrough itself, independent of how the client was built

pub mod flow;
pub mod runner;

// Re-export for convenience
pub use flow::{FlowReport, reference_flow};
pub use runner::run;
