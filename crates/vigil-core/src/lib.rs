//! # vigil-core
//!
//! Risk assessment and run orchestration for vigil.
//!
//! - **[`assess`]** -- the pure [`RiskAssessor`]
//! - **[`orchestrator`]** -- [`Orchestrator`], which sequences collection,
//!   assessment and submission and produces the run report
//! - **[`summary`]** -- the human-readable end-of-run summary
//! - **[`error`]** -- [`RunError`] and its exit codes

pub mod assess;
pub mod error;
pub mod orchestrator;
pub mod summary;

pub use assess::{Assessment, RiskAssessor};
pub use error::RunError;
pub use orchestrator::{Orchestrator, RunOptions};
