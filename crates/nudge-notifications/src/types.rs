use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::{OffsetDateTime, Weekday};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

/// Free-form metadata attached to notification content.
pub type UserInfo = BTreeMap<String, MetadataValue>;

/// Closed value type for `user_info` entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    String(String),
    Map(BTreeMap<String, MetadataValue>),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl TryFrom<serde_json::Value> for MetadataValue {
    type Error = String;

    /// Nulls and arrays have no metadata representation.
    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| format!("Unrepresentable number: {}", n)),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Object(map) => {
                let mut out = BTreeMap::new();
                for (key, value) in map {
                    out.insert(key, Self::try_from(value)?);
                }
                Ok(Self::Map(out))
            }
            serde_json::Value::Null => Err("Null is not a metadata value".to_string()),
            serde_json::Value::Array(_) => Err("Arrays are not metadata values".to_string()),
        }
    }
}

/// Notification sound token.
///
/// The notification service exposes sounds as opaque tokens with no equality
/// operator, so two sounds compare equal when their textual descriptions match.
/// Distinct tokens that happen to describe themselves identically are therefore
/// indistinguishable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSound {
    description: String,
}

impl NotificationSound {
    pub fn default_sound() -> Self {
        Self::from_token("default")
    }

    pub fn named(name: &str) -> Self {
        Self::from_token(format_args!("named:{}", name))
    }

    pub fn critical(volume: f32) -> Self {
        Self::from_token(format_args!("critical:{:.2}", volume.clamp(0.0, 1.0)))
    }

    /// Wrap a service token by its description
    pub fn from_token(token: impl fmt::Display) -> Self {
        Self {
            description: token.to_string(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for NotificationSound {
    fn default() -> Self {
        Self::default_sound()
    }
}

impl PartialEq for NotificationSound {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterruptionLevel {
    #[default]
    Active,
    Passive,
    TimeSensitive,
    Critical,
}

/// Lock-screen preview behavior.
///
/// The placeholder is carried with the content for the service to use; admission
/// never substitutes it into the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyBehavior {
    #[default]
    None,
    GenericPlaceholder(String),
}

/// Maximum title and body lengths, in grapheme clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLimits {
    #[serde(default = "default_title_max")]
    pub title_max_chars: usize,
    #[serde(default = "default_body_max")]
    pub body_max_chars: usize,
}

fn default_title_max() -> usize {
    60
}

fn default_body_max() -> usize {
    200
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            title_max_chars: default_title_max(),
            body_max_chars: default_body_max(),
        }
    }
}

/// Truncate to the first `max` user-perceived characters (extended grapheme
/// clusters). Never splits a cluster.
pub fn clamp_text(text: &str, max: usize) -> String {
    match text.grapheme_indices(true).nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// What a notification shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    pub title: String,
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Thread used for grouping and coalescing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(default)]
    pub user_info: UserInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<NotificationSound>,

    #[serde(default)]
    pub interruption_level: InterruptionLevel,

    #[serde(default)]
    pub privacy: PrivacyBehavior,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            subtitle: None,
            thread_id: None,
            category_id: None,
            user_info: UserInfo::new(),
            badge: None,
            sound: Some(NotificationSound::default_sound()),
            interruption_level: InterruptionLevel::Active,
            privacy: PrivacyBehavior::None,
        }
    }

    pub fn with_subtitle(self, subtitle: impl Into<String>) -> Self {
        Self {
            subtitle: Some(subtitle.into()),
            ..self
        }
    }

    pub fn with_thread(self, thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..self
        }
    }

    pub fn with_category(self, category_id: impl Into<String>) -> Self {
        Self {
            category_id: Some(category_id.into()),
            ..self
        }
    }

    pub fn with_user_info(self, user_info: UserInfo) -> Self {
        Self { user_info, ..self }
    }

    pub fn with_badge(self, badge: Option<u32>) -> Self {
        Self { badge, ..self }
    }

    pub fn with_sound(self, sound: Option<NotificationSound>) -> Self {
        Self { sound, ..self }
    }

    pub fn with_interruption_level(self, interruption_level: InterruptionLevel) -> Self {
        Self {
            interruption_level,
            ..self
        }
    }

    pub fn with_privacy(self, privacy: PrivacyBehavior) -> Self {
        Self { privacy, ..self }
    }

    /// Thread id eligible for coalescing (set and non-empty).
    pub fn coalescing_thread(&self) -> Option<&str> {
        self.thread_id.as_deref().filter(|t| !t.is_empty())
    }

    /// Copy with title and body truncated to `limits`.
    pub fn clamped(self, limits: &TextLimits) -> Self {
        Self {
            title: clamp_text(&self.title, limits.title_max_chars),
            body: clamp_text(&self.body, limits.body_max_chars),
            ..self
        }
    }

    pub fn exceeds(&self, limits: &TextLimits) -> bool {
        self.title.graphemes(true).count() > limits.title_max_chars
            || self.body.graphemes(true).count() > limits.body_max_chars
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOffset {
    Seconds(f64),
    Minutes(f64),
    Hours(f64),
}

impl TimeOffset {
    pub fn as_secs_f64(&self) -> f64 {
        match *self {
            Self::Seconds(s) => s,
            Self::Minutes(m) => m * 60.0,
            Self::Hours(h) => h * 3600.0,
        }
    }
}

/// Calendar fields to match; unset fields match any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
}

impl DateComponents {
    /// Daily match at `hour:minute`.
    pub fn daily_at(hour: u8, minute: u8) -> Self {
        Self {
            hour: Some(hour),
            minute: Some(minute),
            ..Self::default()
        }
    }

    /// Year through second of `at`'s wall clock, in its own offset.
    pub fn from_datetime(at: &OffsetDateTime) -> Self {
        Self {
            year: Some(at.year()),
            month: Some(u8::from(at.month())),
            day: Some(at.day()),
            hour: Some(at.hour()),
            minute: Some(at.minute()),
            second: Some(at.second()),
            weekday: None,
        }
    }
}

/// When a notification should fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationSchedule {
    TimeInterval {
        offset: TimeOffset,
        repeats: bool,
    },
    Calendar {
        components: DateComponents,
        repeats: bool,
    },
    ExactDate {
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
}

impl NotificationSchedule {
    pub fn after(offset: TimeOffset) -> Self {
        Self::TimeInterval {
            offset,
            repeats: false,
        }
    }

    pub fn at(at: OffsetDateTime) -> Self {
        Self::ExactDate { at }
    }
}

/// Admission rules attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPolicy {
    pub avoid_duplicates: bool,
    /// Global ceiling on pending items; `None` is unbounded
    pub max_pending_count: Option<u32>,
    pub coalesce_by_thread_id: bool,
    pub clamp_text_length: bool,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            avoid_duplicates: true,
            max_pending_count: None,
            coalesce_by_thread_id: true,
            clamp_text_length: true,
        }
    }
}

impl NotificationPolicy {
    /// Policy with every rule disabled
    pub fn permissive() -> Self {
        Self {
            avoid_duplicates: false,
            max_pending_count: None,
            coalesce_by_thread_id: false,
            clamp_text_length: false,
        }
    }

    pub fn with_max_pending_count(self, max: u32) -> Self {
        Self {
            max_pending_count: Some(max),
            ..self
        }
    }
}

/// A notification to be scheduled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub schedule: NotificationSchedule,
    #[serde(default)]
    pub policy: NotificationPolicy,
}

impl NotificationRequest {
    /// Request with a generated identifier and the default policy.
    pub fn new(content: NotificationContent, schedule: NotificationSchedule) -> Self {
        Self {
            identifier: Uuid::new_v4().to_string(),
            content,
            schedule,
            policy: NotificationPolicy::default(),
        }
    }

    pub fn with_identifier(self, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..self
        }
    }

    pub fn with_policy(self, policy: NotificationPolicy) -> Self {
        Self { policy, ..self }
    }
}

/// Pending or delivered entry as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl PendingItem {
    pub fn new(identifier: impl Into<String>, thread_id: Option<&str>) -> Self {
        Self {
            identifier: identifier.into(),
            thread_id: thread_id.map(str::to_string),
        }
    }
}

impl From<&NotificationRequest> for PendingItem {
    fn from(request: &NotificationRequest) -> Self {
        Self {
            identifier: request.identifier.clone(),
            thread_id: request.content.thread_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_clamp_text_within_limit_is_noop() {
        assert_eq!(clamp_text("short", 60), "short");
        assert_eq!(clamp_text("", 60), "");
    }

    #[test]
    fn test_clamp_text_counts_characters() {
        let title = "é".repeat(70);
        let clamped = clamp_text(&title, 60);
        assert_eq!(clamped.chars().count(), 60);
        assert_eq!(clamp_text(&clamped, 60), clamped);
    }

    #[test]
    fn test_clamp_text_keeps_grapheme_clusters_whole() {
        let flag_at_limit = format!("{}\u{1F1FA}\u{1F1F8}", "a".repeat(59));
        assert_eq!(clamp_text(&flag_at_limit, 60), flag_at_limit);

        let flag_over_limit = format!("{}\u{1F1FA}\u{1F1F8}", "a".repeat(60));
        assert_eq!(clamp_text(&flag_over_limit, 60), "a".repeat(60));

        let combining = format!("{}e\u{0301}x", "a".repeat(59));
        assert_eq!(clamp_text(&combining, 60), format!("{}e\u{0301}", "a".repeat(59)));

        let content = NotificationContent::new(flag_at_limit.clone(), "body");
        assert!(!content.exceeds(&TextLimits::default()));
    }

    #[test]
    fn test_clamped_content_is_idempotent() {
        let limits = TextLimits::default();
        let content = NotificationContent::new("t".repeat(75), "b".repeat(250));
        let once = content.clone().clamped(&limits);
        let twice = once.clone().clamped(&limits);
        assert_eq!(once, twice);
        assert_eq!(once.title.len(), 60);
        assert_eq!(once.body.len(), 200);
        assert!(content.exceeds(&limits));
        assert!(!once.exceeds(&limits));
    }

    #[test]
    fn test_content_equality_uses_map_equality() {
        let mut a = UserInfo::new();
        a.insert("kind".to_string(), "reminder".into());
        a.insert("count".to_string(), 3_i64.into());

        let mut b = UserInfo::new();
        b.insert("count".to_string(), MetadataValue::Number(3.0));
        b.insert("kind".to_string(), MetadataValue::String("reminder".into()));

        let left = NotificationContent::new("Hi", "there").with_user_info(a);
        let right = NotificationContent::new("Hi", "there").with_user_info(b);
        assert_eq!(left, right);

        let other = right.clone().with_user_info(UserInfo::new());
        assert_ne!(left, other);
    }

    #[test]
    fn test_sound_compares_by_description() {
        assert_eq!(NotificationSound::default(), NotificationSound::from_token("default"));
        assert_ne!(NotificationSound::named("chime"), NotificationSound::default_sound());
        assert_eq!(NotificationSound::named("chime").description(), "named:chime");
    }

    #[test]
    fn test_metadata_from_json() {
        let value = serde_json::json!({"id": 7, "nested": {"flag": true, "name": "x"}});
        let meta = MetadataValue::try_from(value).unwrap();
        let MetadataValue::Map(map) = meta else {
            panic!("expected map");
        };
        assert_eq!(map.get("id"), Some(&MetadataValue::Number(7.0)));
        assert!(matches!(map.get("nested"), Some(MetadataValue::Map(_))));

        assert!(MetadataValue::try_from(serde_json::json!(null)).is_err());
        assert!(MetadataValue::try_from(serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_coalescing_thread_ignores_empty() {
        let content = NotificationContent::new("a", "b");
        assert_eq!(content.coalescing_thread(), None);
        assert_eq!(content.clone().with_thread("").coalescing_thread(), None);
        assert_eq!(content.with_thread("t1").coalescing_thread(), Some("t1"));
    }

    #[test]
    fn test_time_offset_seconds() {
        assert_eq!(TimeOffset::Seconds(5.0).as_secs_f64(), 5.0);
        assert_eq!(TimeOffset::Minutes(2.0).as_secs_f64(), 120.0);
        assert_eq!(TimeOffset::Hours(1.5).as_secs_f64(), 5400.0);
    }

    #[test]
    fn test_date_components_from_datetime() {
        let components = DateComponents::from_datetime(&datetime!(2025-11-27 08:30:15 +02:00));
        assert_eq!(components.year, Some(2025));
        assert_eq!(components.month, Some(11));
        assert_eq!(components.day, Some(27));
        assert_eq!(components.hour, Some(8));
        assert_eq!(components.minute, Some(30));
        assert_eq!(components.second, Some(15));
        assert_eq!(components.weekday, None);
    }

    #[test]
    fn test_policy_defaults() {
        let policy = NotificationPolicy::default();
        assert!(policy.avoid_duplicates);
        assert!(policy.coalesce_by_thread_id);
        assert!(policy.clamp_text_length);
        assert_eq!(policy.max_pending_count, None);
    }

    #[test]
    fn test_request_serializes_schedule_tag() {
        let request = NotificationRequest::new(
            NotificationContent::new("Stretch", "Stand up"),
            NotificationSchedule::after(TimeOffset::Minutes(30.0)),
        )
        .with_identifier("stretch");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["identifier"], "stretch");
        assert_eq!(json["schedule"]["type"], "timeInterval");
        assert_eq!(json["schedule"]["offset"]["minutes"], 30.0);
    }
}
