use std::sync::Arc;

use tracing::{debug, info};

use crate::category::{CategoryRegistry, NotificationCategory, merge_categories};
use crate::config::{AppConfig, ConfigError};
use crate::engine::AdmissionEngine;
use crate::error::NotificationError;
use crate::memory::InMemoryNotificationStore;
use crate::observability;
use crate::store::NotificationStore;
use crate::types::{NotificationContent, NotificationRequest, NotificationSchedule, TimeOffset};

/// Caller-facing notification API over an explicitly supplied store.
pub struct Notifier<S>
where
    S: NotificationStore,
{
    engine: AdmissionEngine<S>,
    config: AppConfig,
}

pub struct NotifierBuilder<S>
where
    S: NotificationStore,
{
    store: Option<Arc<S>>,
    config: AppConfig,
}

impl<S> NotifierBuilder<S>
where
    S: NotificationStore,
{
    pub fn new() -> Self {
        Self {
            store: None,
            config: AppConfig::default(),
        }
    }

    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Notifier<S>, ConfigError> {
        let store = self
            .store
            .ok_or_else(|| ConfigError::validation("a notification store is required"))?;
        self.config.validate()?;
        observability::apply_logging_config(&self.config.logging);
        let engine = AdmissionEngine::new(store)
            .with_trigger_mapper(self.config.trigger_mapper()?)
            .with_text_limits(self.config.limits);
        Ok(Notifier {
            engine,
            config: self.config,
        })
    }
}

impl<S> Default for NotifierBuilder<S>
where
    S: NotificationStore,
{
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier<InMemoryNotificationStore> {
    /// Notifier over a fresh in-memory store with default configuration.
    pub fn in_memory() -> Self {
        Self {
            engine: AdmissionEngine::new(Arc::new(InMemoryNotificationStore::new())),
            config: AppConfig::default(),
        }
    }
}

impl<S> Notifier<S>
where
    S: NotificationStore,
{
    pub fn builder() -> NotifierBuilder<S> {
        NotifierBuilder::new()
    }

    pub fn store(&self) -> &Arc<S> {
        self.engine.store()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Admit `request`, returning its identifier once enqueued.
    pub async fn schedule(&self, request: NotificationRequest) -> Result<String, NotificationError> {
        let admission = self.engine.admit(request).await?;
        Ok(admission.identifier)
    }

    /// Schedule a one-shot notification `offset` from now under the configured policy.
    pub async fn schedule_simple(
        &self,
        title: &str,
        body: &str,
        offset: TimeOffset,
        thread_id: Option<&str>,
    ) -> Result<String, NotificationError> {
        let content = NotificationContent::new(title, body);
        let content = match thread_id {
            Some(thread) => content.with_thread(thread),
            None => content,
        };
        let request = NotificationRequest::new(content, NotificationSchedule::after(offset))
            .with_policy(self.config.policy.clone());
        self.schedule(request).await
    }

    /// Remove pending notifications by identifier. Delivered ones are kept.
    pub async fn cancel(&self, identifiers: &[String]) -> Result<(), NotificationError> {
        if identifiers.is_empty() {
            return Ok(());
        }
        self.store().remove_pending(identifiers).await?;
        debug!(count = identifiers.len(), "Cancelled notifications");
        Ok(())
    }

    pub async fn cancel_one(&self, identifier: &str) -> Result<(), NotificationError> {
        self.cancel(&[identifier.to_string()]).await
    }

    /// Remove every pending notification, returning how many were removed.
    pub async fn cancel_all(&self) -> Result<usize, NotificationError> {
        let identifiers: Vec<String> = self
            .store()
            .list_pending()
            .await?
            .into_iter()
            .map(|item| item.identifier)
            .collect();
        self.cancel(&identifiers).await?;
        info!(count = identifiers.len(), "Cancelled all pending notifications");
        Ok(identifiers.len())
    }
}

impl<S> Notifier<S>
where
    S: NotificationStore + CategoryRegistry,
{
    /// Add categories to those already registered with the store.
    pub async fn register_categories(
        &self,
        categories: Vec<NotificationCategory>,
    ) -> Result<(), NotificationError> {
        let existing = self.store().categories().await?;
        let merged = merge_categories(existing, categories);
        debug!(total = merged.len(), "Registering notification categories");
        self.store().set_categories(merged).await?;
        Ok(())
    }
}
