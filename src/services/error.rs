use thiserror::Error;

use crate::domain::AchievementStatus;
use crate::store::StoreError;

/// Domain errors produced by the achievement coordinator. Store-level errors
/// are translated here rather than leaked to the request surface.
#[derive(Debug, Error)]
pub enum AchievementError {
    #[error("achievement not found")]
    NotFound,

    /// Authenticated but not entitled. The message is deliberately generic;
    /// it must not reveal why access was denied.
    #[error("not authorized")]
    Forbidden,

    #[error("operation not allowed while status is '{current}'; requires {required}")]
    InvalidStateTransition {
        current: AchievementStatus,
        required: &'static str,
    },

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AchievementError {
    pub fn wrong_status(current: AchievementStatus, required: AchievementStatus) -> Self {
        AchievementError::InvalidStateTransition { current, required: required.as_str() }
    }
}

impl From<StoreError> for AchievementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AchievementError::NotFound,
            StoreError::InvalidInput(msg) => AchievementError::Validation(msg),
            StoreError::Backend(msg) => AchievementError::Storage(msg),
        }
    }
}
