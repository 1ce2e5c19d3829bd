//! Policy-driven admission of local notifications.
//!
//! Requests pass through an [`AdmissionEngine`] that checks a fresh snapshot of
//! the external notification service, retracts older items on the same thread,
//! clamps text and maps the schedule to a [`Trigger`] before enqueueing.

pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod notifier;
pub mod observability;
pub mod store;
pub mod trigger;
pub mod types;

pub use category::{
    ActionOptions, ActionStyle, CategoryOptions, CategoryRegistry, NotificationAction,
    NotificationCategory,
};
pub use crate::config::{AppConfig, ConfigError};
pub use engine::{Admission, AdmissionEngine};
pub use error::{NotificationError, ServiceError};
pub use memory::{InMemoryNotificationStore, StoreOperation, StoredNotification};
pub use notifier::{Notifier, NotifierBuilder};
pub use store::NotificationStore;
pub use trigger::{Trigger, TriggerMapper};
pub use types::*;
