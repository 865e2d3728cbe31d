use campus_core::RemoteError;
use campus_models::first_validation_message;
use validator::ValidationErrors;

use crate::storage::StorageError;

/// Failure of a feature-page operation. The message is safe to show the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Invalid(first_validation_message(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_models::CreateNoticeDto;
    use validator::Validate;

    #[test]
    fn test_validation_errors_become_invalid() {
        let dto = CreateNoticeDto {
            title: String::new(),
            content: "Body".into(),
            target_audience: vec![],
        };
        let err: ServiceError = dto.validate().unwrap_err().into();
        assert_eq!(
            err,
            ServiceError::Invalid("Select at least one audience".into())
        );
    }
}
