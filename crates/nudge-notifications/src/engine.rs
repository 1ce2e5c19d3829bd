use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::NotificationError;
use crate::store::NotificationStore;
use crate::trigger::{Trigger, TriggerMapper};
use crate::types::{NotificationPolicy, NotificationRequest, PendingItem, TextLimits};

/// Outcome of a successful admission
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub identifier: String,
    pub trigger: Trigger,
    /// Pending items retracted by thread coalescing
    pub retracted_pending: Vec<String>,
    /// Delivered items retracted by thread coalescing
    pub retracted_delivered: Vec<String>,
    /// Title or body was shortened
    pub clamped: bool,
}

/// Capacity and duplicate rules, in that order.
pub fn check_admission(
    request: &NotificationRequest,
    pending: &[PendingItem],
) -> Result<(), NotificationError> {
    let policy = &request.policy;

    if let Some(max) = policy.max_pending_count {
        if pending.len() >= max as usize {
            return Err(NotificationError::MaxPendingCountReached);
        }
    }

    if policy.avoid_duplicates && pending.iter().any(|p| p.identifier == request.identifier) {
        return Err(NotificationError::DuplicateIdentifier(
            request.identifier.clone(),
        ));
    }

    Ok(())
}

/// Identifiers in `items` on `thread_id`, excluding `identifier` itself.
pub fn coalescing_targets(items: &[PendingItem], thread_id: &str, identifier: &str) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.thread_id.as_deref() == Some(thread_id) && item.identifier != identifier)
        .map(|item| item.identifier.clone())
        .collect()
}

fn needs_pending_snapshot(policy: &NotificationPolicy, coalesce_thread: Option<&str>) -> bool {
    policy.max_pending_count.is_some() || policy.avoid_duplicates || coalesce_thread.is_some()
}

/// Admission pipeline in front of a notification store.
///
/// Each call takes a fresh snapshot of the store and runs capacity, duplicate,
/// coalescing, clamping and enqueue steps in order. Rejections leave the store
/// untouched. Coalescing retractions are not undone if the final `add` fails.
pub struct AdmissionEngine<S>
where
    S: NotificationStore,
{
    store: Arc<S>,
    mapper: TriggerMapper,
    limits: TextLimits,
}

impl<S> AdmissionEngine<S>
where
    S: NotificationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mapper: TriggerMapper::default(),
            limits: TextLimits::default(),
        }
    }

    pub fn with_trigger_mapper(mut self, mapper: TriggerMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_text_limits(mut self, limits: TextLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn trigger_mapper(&self) -> &TriggerMapper {
        &self.mapper
    }

    pub async fn admit(&self, request: NotificationRequest) -> Result<Admission, NotificationError> {
        let coalesce_thread = if request.policy.coalesce_by_thread_id {
            request.content.coalescing_thread().map(str::to_string)
        } else {
            None
        };

        // 1-2. Capacity and duplicates against one snapshot
        let pending = if needs_pending_snapshot(&request.policy, coalesce_thread.as_deref()) {
            self.store.list_pending().await?
        } else {
            Vec::new()
        };

        if let Err(e) = check_admission(&request, &pending) {
            warn!(
                notification_id = %request.identifier,
                pending = pending.len(),
                error = %e,
                "Notification rejected"
            );
            return Err(e);
        }
        debug!(
            notification_id = %request.identifier,
            pending = pending.len(),
            "Admission checks passed"
        );

        // 3. Coalescing
        let mut retracted_pending = Vec::new();
        let mut retracted_delivered = Vec::new();
        if let Some(thread_id) = coalesce_thread.as_deref() {
            retracted_pending = coalescing_targets(&pending, thread_id, &request.identifier);
            if !retracted_pending.is_empty() {
                self.store.remove_pending(&retracted_pending).await?;
            }

            let delivered = self.store.list_delivered().await?;
            retracted_delivered = coalescing_targets(&delivered, thread_id, &request.identifier);
            if !retracted_delivered.is_empty() {
                self.store.remove_delivered(&retracted_delivered).await?;
            }

            debug!(
                notification_id = %request.identifier,
                thread_id = %thread_id,
                pending = retracted_pending.len(),
                delivered = retracted_delivered.len(),
                "Coalesced thread"
            );
        }

        // 4. Clamping
        let mut request = request;
        let clamped = request.policy.clamp_text_length && request.content.exceeds(&self.limits);
        if clamped {
            request.content = request.content.clamped(&self.limits);
            debug!(notification_id = %request.identifier, "Clamped notification text");
        }

        // 5. Trigger and enqueue
        let trigger = self.mapper.map(&request.schedule);
        if let Err(e) = self.store.add(&request, &trigger).await {
            warn!(
                notification_id = %request.identifier,
                error = %e,
                retracted = retracted_pending.len() + retracted_delivered.len(),
                "Notification service rejected add"
            );
            return Err(e.into());
        }

        info!(
            notification_id = %request.identifier,
            thread_id = ?request.content.thread_id,
            repeats = trigger.repeats(),
            "Notification enqueued"
        );

        Ok(Admission {
            identifier: request.identifier,
            trigger,
            retracted_pending,
            retracted_delivered,
            clamped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NotificationContent, NotificationSchedule, TimeOffset};

    fn request(id: &str, policy: NotificationPolicy) -> NotificationRequest {
        NotificationRequest::new(
            NotificationContent::new("title", "body"),
            NotificationSchedule::after(TimeOffset::Seconds(5.0)),
        )
        .with_identifier(id)
        .with_policy(policy)
    }

    #[test]
    fn test_capacity_counts_all_pending() {
        let pending = vec![PendingItem::new("a", Some("t1")), PendingItem::new("b", None)];
        let req = request("c", NotificationPolicy::default().with_max_pending_count(2));
        assert!(matches!(
            check_admission(&req, &pending),
            Err(NotificationError::MaxPendingCountReached)
        ));

        let req = request("c", NotificationPolicy::default().with_max_pending_count(3));
        assert!(check_admission(&req, &pending).is_ok());
    }

    #[test]
    fn test_zero_cap_rejects_on_empty_store() {
        let req = request("a", NotificationPolicy::default().with_max_pending_count(0));
        assert!(matches!(
            check_admission(&req, &[]),
            Err(NotificationError::MaxPendingCountReached)
        ));
    }

    #[test]
    fn test_duplicate_rejected_only_when_enabled() {
        let pending = vec![PendingItem::new("x", None)];
        assert!(matches!(
            check_admission(&request("x", NotificationPolicy::default()), &pending),
            Err(NotificationError::DuplicateIdentifier(id)) if id == "x"
        ));

        let lenient = NotificationPolicy {
            avoid_duplicates: false,
            ..NotificationPolicy::default()
        };
        assert!(check_admission(&request("x", lenient), &pending).is_ok());
    }

    #[test]
    fn test_capacity_reported_before_duplicate() {
        let pending = vec![PendingItem::new("x", None)];
        let req = request("x", NotificationPolicy::default().with_max_pending_count(1));
        assert!(matches!(
            check_admission(&req, &pending),
            Err(NotificationError::MaxPendingCountReached)
        ));
    }

    #[test]
    fn test_coalescing_targets_skip_own_identifier() {
        let items = vec![
            PendingItem::new("a", Some("t1")),
            PendingItem::new("b", Some("t1")),
            PendingItem::new("c", Some("t2")),
            PendingItem::new("d", None),
        ];
        assert_eq!(coalescing_targets(&items, "t1", "b"), vec!["a".to_string()]);
        assert!(coalescing_targets(&items, "t3", "b").is_empty());
    }

    #[test]
    fn test_snapshot_skipped_for_permissive_policy() {
        assert!(!needs_pending_snapshot(&NotificationPolicy::permissive(), None));
        assert!(needs_pending_snapshot(&NotificationPolicy::permissive(), Some("t")));
        assert!(needs_pending_snapshot(&NotificationPolicy::default(), None));
    }
}
