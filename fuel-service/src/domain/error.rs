use service_core::error::AppError;
use thiserror::Error;

pub type FuelResult<T> = Result<T, FuelError>;

#[derive(Debug, Error)]
pub enum FuelError {
    /// A CASH entry without a checkpoint, or a custom station direction
    /// switched on without a target column.
    #[error("Missing checkpoint selection: {0}")]
    MissingCheckpointSelection(String),

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    /// Stale version on commit or a double cancellation.
    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl FuelError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        FuelError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<mongodb::error::Error> for FuelError {
    fn from(err: mongodb::error::Error) -> Self {
        FuelError::Store(anyhow::Error::new(err))
    }
}

impl From<FuelError> for AppError {
    fn from(err: FuelError) -> Self {
        match err {
            FuelError::MissingCheckpointSelection(message) => AppError::invalid_field(
                "cancellation_point",
                "missing_checkpoint_selection",
                message,
            ),
            FuelError::Validation { field, message } => {
                AppError::invalid_field(field, "invalid", message)
            }
            FuelError::NotFound(message) => AppError::NotFound(anyhow::anyhow!(message)),
            FuelError::Conflict(message) => AppError::Conflict(anyhow::anyhow!(message)),
            FuelError::Store(e) => AppError::DatabaseError(e),
        }
    }
}
