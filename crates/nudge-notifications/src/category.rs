use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ServiceError;

/// The service displays at most this many actions per category
pub const MAX_CATEGORY_ACTIONS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStyle {
    #[default]
    Normal,
    Destructive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOptions {
    pub foreground: bool,
    pub authentication_required: bool,
    pub destructive: bool,
}

/// Button shown on a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub style: ActionStyle,
    #[serde(default)]
    pub options: ActionOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_name: Option<String>,
}

impl NotificationAction {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            style: ActionStyle::Normal,
            options: ActionOptions::default(),
            symbol_name: None,
        }
    }

    pub fn with_style(self, style: ActionStyle) -> Self {
        Self { style, ..self }
    }

    pub fn with_options(self, options: ActionOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_symbol(self, symbol_name: impl Into<String>) -> Self {
        Self {
            symbol_name: Some(symbol_name.into()),
            ..self
        }
    }

    /// Options as sent to the service; destructive style implies the flag.
    pub fn effective_options(&self) -> ActionOptions {
        match self.style {
            ActionStyle::Normal => self.options,
            ActionStyle::Destructive => ActionOptions {
                destructive: true,
                ..self.options
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOptions {
    pub custom_dismiss_action: bool,
    pub allow_in_car_play: bool,
    pub hidden_previews_show_title: bool,
    pub hidden_previews_show_subtitle: bool,
}

/// Named group of actions referenced by `NotificationContent::category_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCategory {
    identifier: String,
    actions: Vec<NotificationAction>,
    intent_identifiers: Vec<String>,
    options: CategoryOptions,
}

impl NotificationCategory {
    /// Actions beyond `MAX_CATEGORY_ACTIONS` are dropped.
    pub fn new(identifier: impl Into<String>, mut actions: Vec<NotificationAction>) -> Self {
        let identifier = identifier.into();
        if actions.len() > MAX_CATEGORY_ACTIONS {
            warn!(
                category = %identifier,
                dropped = actions.len() - MAX_CATEGORY_ACTIONS,
                "Category has too many actions"
            );
            actions.truncate(MAX_CATEGORY_ACTIONS);
        }
        Self {
            identifier,
            actions,
            intent_identifiers: Vec::new(),
            options: CategoryOptions::default(),
        }
    }

    pub fn with_intents(self, intent_identifiers: Vec<String>) -> Self {
        Self {
            intent_identifiers,
            ..self
        }
    }

    pub fn with_options(self, options: CategoryOptions) -> Self {
        Self { options, ..self }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn actions(&self) -> &[NotificationAction] {
        &self.actions
    }

    pub fn intent_identifiers(&self) -> &[String] {
        &self.intent_identifiers
    }

    pub fn options(&self) -> CategoryOptions {
        self.options
    }
}

/// Union of `existing` and `incoming`; an incoming category replaces an
/// existing one with the same identifier in place.
pub fn merge_categories(
    existing: Vec<NotificationCategory>,
    incoming: Vec<NotificationCategory>,
) -> Vec<NotificationCategory> {
    let mut merged = existing;
    for category in incoming {
        match merged
            .iter_mut()
            .find(|c| c.identifier == category.identifier)
        {
            Some(slot) => *slot = category,
            None => merged.push(category),
        }
    }
    merged
}

/// Stores that can hold notification categories
#[async_trait]
pub trait CategoryRegistry: Send + Sync {
    async fn categories(&self) -> Result<Vec<NotificationCategory>, ServiceError>;

    /// Replace the full category set
    async fn set_categories(&self, categories: Vec<NotificationCategory>)
        -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str) -> NotificationAction {
        NotificationAction::new(id, id.to_uppercase())
    }

    #[test]
    fn test_category_caps_actions() {
        let category = NotificationCategory::new(
            "reminder",
            vec![action("a"), action("b"), action("c"), action("d"), action("e")],
        );
        assert_eq!(category.actions().len(), MAX_CATEGORY_ACTIONS);
        assert_eq!(category.actions()[3].identifier, "d");
    }

    #[test]
    fn test_destructive_style_sets_option() {
        let delete = action("delete").with_style(ActionStyle::Destructive);
        assert!(delete.effective_options().destructive);
        assert!(!delete.options.destructive);
        assert!(!action("snooze").effective_options().destructive);
    }

    #[test]
    fn test_merge_categories_replaces_by_identifier() {
        let existing = vec![
            NotificationCategory::new("reminder", vec![action("done")]),
            NotificationCategory::new("alarm", vec![]),
        ];
        let incoming = vec![
            NotificationCategory::new("reminder", vec![action("done"), action("snooze")]),
            NotificationCategory::new("digest", vec![]),
        ];

        let merged = merge_categories(existing, incoming);
        let ids: Vec<&str> = merged.iter().map(|c| c.identifier()).collect();
        assert_eq!(ids, vec!["reminder", "alarm", "digest"]);
        assert_eq!(merged[0].actions().len(), 2);
    }
}
