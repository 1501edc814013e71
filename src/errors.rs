use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TfheError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("{what} mismatch: expected {expected}, got {actual}")]
    ParameterMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Device failure on {device}: {message}")]
    DeviceFailure {
        device: &'static str,
        message: String,
    },
}

pub type TfheResult<T> = Result<T, TfheError>;

impl TfheError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Fails with `ParameterMismatch` unless `actual == expected`.
pub(crate) fn ensure_eq(
    what: &'static str,
    expected: usize,
    actual: usize,
) -> TfheResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(TfheError::ParameterMismatch {
            what,
            expected,
            actual,
        })
    }
}
