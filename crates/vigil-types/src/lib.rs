//! # vigil-types
//!
//! Core type definitions for the vigil patient triage client.
//!
//! Every other vigil crate depends on this one. It contains:
//!
//! - **[`patient`]** -- [`PatientRecord`] as received from the clinical API
//! - **[`risk`]** -- per-patient [`RiskFactors`] and the [`AlertSets`] output
//! - **[`report`]** -- the [`RunReport`] produced at the end of every run
//! - **[`config`]** -- configuration schema with defaults
//! - **[`secret`]** -- [`SecretString`] for the API credential
//! - **[`error`]** -- [`VigilError`]

pub mod config;
pub mod error;
pub mod patient;
pub mod report;
pub mod risk;
pub mod secret;

pub use config::Config;
pub use error::{Result, VigilError};
pub use patient::PatientRecord;
pub use report::RunReport;
pub use risk::{AlertSets, AssessmentPayload, RiskFactors};
pub use secret::SecretString;
