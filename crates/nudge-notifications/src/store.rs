use async_trait::async_trait;

use crate::error::ServiceError;
use crate::trigger::Trigger;
use crate::types::{NotificationRequest, PendingItem};

/// Gateway to the external notification service.
///
/// The service owns all pending and delivered state; every call reflects its
/// current view, which other processes may change between calls.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Scheduled notifications that have not fired yet, in service order
    async fn list_pending(&self) -> Result<Vec<PendingItem>, ServiceError>;

    /// Notifications already shown and still retained by the service
    async fn list_delivered(&self) -> Result<Vec<PendingItem>, ServiceError>;

    /// Remove pending notifications. Unknown identifiers are ignored.
    async fn remove_pending(&self, identifiers: &[String]) -> Result<(), ServiceError>;

    /// Remove delivered notifications. Unknown identifiers are ignored.
    async fn remove_delivered(&self, identifiers: &[String]) -> Result<(), ServiceError>;

    /// Enqueue a notification with its concrete trigger
    async fn add(&self, request: &NotificationRequest, trigger: &Trigger)
        -> Result<(), ServiceError>;
}
