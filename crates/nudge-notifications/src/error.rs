use thiserror::Error;

/// Failure reported by the external notification service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected by service: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Maximum pending notification count reached")]
    MaxPendingCountReached,

    #[error("Duplicate notification identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Notification service failure: {0}")]
    ServiceFailure(#[from] ServiceError),
}

impl NotificationError {
    /// True for policy rejections, which leave the store untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MaxPendingCountReached | Self::DuplicateIdentifier(_)
        )
    }
}
