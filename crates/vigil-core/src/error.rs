//! Run-level errors.

use thiserror::Error;
use vigil_client::ClientError;

/// Why a run stopped. Each variant maps to a process exit code.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("collection failed: {0}")]
    Collection(#[source] ClientError),

    #[error("no patient records were collected")]
    NoRecords,

    #[error("submission failed: {0}")]
    Submission(#[source] ClientError),

    #[error("run cancelled")]
    Cancelled,
}

impl RunError {
    pub fn collection(err: ClientError) -> Self {
        match err {
            ClientError::Cancelled => Self::Cancelled,
            other => Self::Collection(other),
        }
    }

    pub fn submission(err: ClientError) -> Self {
        match err {
            ClientError::Cancelled => Self::Cancelled,
            other => Self::Submission(other),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Collection(_) | Self::NoRecords => 2,
            Self::Submission(_) => 3,
            Self::Cancelled => 130,
        }
    }
}
