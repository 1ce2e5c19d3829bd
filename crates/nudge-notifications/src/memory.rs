use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::category::{CategoryRegistry, NotificationCategory};
use crate::error::ServiceError;
use crate::store::NotificationStore;
use crate::trigger::Trigger;
use crate::types::{NotificationRequest, PendingItem};

/// Notification as held by the in-memory service
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNotification {
    pub request: NotificationRequest,
    pub trigger: Trigger,
}

impl StoredNotification {
    fn item(&self) -> PendingItem {
        PendingItem::from(&self.request)
    }
}

/// Mutating call observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Add(String),
    RemovePending(Vec<String>),
    RemoveDelivered(Vec<String>),
}

#[derive(Debug, Default)]
struct StoreState {
    pending: IndexMap<String, StoredNotification>,
    delivered: IndexMap<String, StoredNotification>,
    categories: Vec<NotificationCategory>,
    operations: Vec<StoreOperation>,
    add_failure: Option<ServiceError>,
}

/// In-process notification service.
///
/// Adding an identifier that is already pending replaces it in place, matching
/// how notification services treat re-submitted identifiers.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    state: RwLock<StoreState>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire a pending notification, moving it to the delivered list.
    pub async fn deliver(&self, identifier: &str) -> bool {
        let mut state = self.state.write().await;
        match state.pending.shift_remove(identifier) {
            Some(notification) => {
                state
                    .delivered
                    .insert(identifier.to_string(), notification);
                true
            }
            None => false,
        }
    }

    /// Make the next `add` fail with `error`.
    pub async fn fail_next_add(&self, error: ServiceError) {
        self.state.write().await.add_failure = Some(error);
    }

    pub async fn pending_notifications(&self) -> Vec<StoredNotification> {
        self.state.read().await.pending.values().cloned().collect()
    }

    pub async fn delivered_notifications(&self) -> Vec<StoredNotification> {
        self.state.read().await.delivered.values().cloned().collect()
    }

    pub async fn get_pending(&self, identifier: &str) -> Option<StoredNotification> {
        self.state.read().await.pending.get(identifier).cloned()
    }

    /// Mutating calls in the order they were received
    pub async fn operations(&self) -> Vec<StoreOperation> {
        self.state.read().await.operations.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn list_pending(&self) -> Result<Vec<PendingItem>, ServiceError> {
        let state = self.state.read().await;
        Ok(state.pending.values().map(StoredNotification::item).collect())
    }

    async fn list_delivered(&self) -> Result<Vec<PendingItem>, ServiceError> {
        let state = self.state.read().await;
        Ok(state
            .delivered
            .values()
            .map(StoredNotification::item)
            .collect())
    }

    async fn remove_pending(&self, identifiers: &[String]) -> Result<(), ServiceError> {
        let mut state = self.state.write().await;
        for id in identifiers {
            state.pending.shift_remove(id);
        }
        state
            .operations
            .push(StoreOperation::RemovePending(identifiers.to_vec()));
        Ok(())
    }

    async fn remove_delivered(&self, identifiers: &[String]) -> Result<(), ServiceError> {
        let mut state = self.state.write().await;
        for id in identifiers {
            state.delivered.shift_remove(id);
        }
        state
            .operations
            .push(StoreOperation::RemoveDelivered(identifiers.to_vec()));
        Ok(())
    }

    async fn add(
        &self,
        request: &NotificationRequest,
        trigger: &Trigger,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().await;
        if let Some(error) = state.add_failure.take() {
            return Err(error);
        }
        state.pending.insert(
            request.identifier.clone(),
            StoredNotification {
                request: request.clone(),
                trigger: trigger.clone(),
            },
        );
        state
            .operations
            .push(StoreOperation::Add(request.identifier.clone()));
        Ok(())
    }
}

#[async_trait]
impl CategoryRegistry for InMemoryNotificationStore {
    async fn categories(&self) -> Result<Vec<NotificationCategory>, ServiceError> {
        Ok(self.state.read().await.categories.clone())
    }

    async fn set_categories(
        &self,
        categories: Vec<NotificationCategory>,
    ) -> Result<(), ServiceError> {
        self.state.write().await.categories = categories;
        Ok(())
    }
}
