//! Application-level error with a process exit code.
//!
//! Exit codes:
//! - `2`: configuration / file access problems
//! - `3`: no usable input (empty tables, empty catalog)
//! - `4`: malformed data (grid mismatches, inconsistent selections)

use crate::classify::ClassifyError;
use crate::domain::SeriesError;
use crate::fit::SelectError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<SelectError> for AppError {
    fn from(err: SelectError) -> Self {
        let exit_code = match err {
            SelectError::EmptyCandidateSet | SelectError::EmptyTrainingSet => 3,
            SelectError::GridMismatch { .. } | SelectError::InsufficientCandidates { .. } => 4,
        };
        AppError::new(exit_code, format!("Selection failed: {err}"))
    }
}

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        AppError::new(4, format!("Invalid curve data: {err}"))
    }
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        let exit_code = match err {
            ClassifyError::InvalidToleranceFactor(_) => 2,
            ClassifyError::UnknownCandidate { .. } => 4,
        };
        AppError::new(exit_code, format!("Classification failed: {err}"))
    }
}
