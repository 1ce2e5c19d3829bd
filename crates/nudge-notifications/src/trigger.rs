use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::UtcOffset;

use crate::types::{DateComponents, NotificationSchedule};

/// Shortest delay accepted for time-interval triggers, in seconds
pub const DEFAULT_MIN_INTERVAL_SECS: f64 = 1.0;

/// Longest delay a time-interval trigger carries; larger offsets saturate here
pub const MAX_INTERVAL_SECS: f64 = Duration::MAX.as_secs() as f64;

/// Concrete trigger handed to the notification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Trigger {
    TimeInterval {
        interval_secs: f64,
        repeats: bool,
    },
    Calendar {
        components: DateComponents,
        repeats: bool,
    },
}

impl Trigger {
    pub fn repeats(&self) -> bool {
        match self {
            Self::TimeInterval { repeats, .. } | Self::Calendar { repeats, .. } => *repeats,
        }
    }

    /// Interval as a `Duration`, saturating at `Duration::MAX`.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::TimeInterval { interval_secs, .. } => {
                let secs = *interval_secs;
                Some(Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
                    Duration::MAX
                } else {
                    Duration::ZERO
                }))
            }
            Self::Calendar { .. } => None,
        }
    }
}

/// Converts schedules into service triggers. Stateless.
#[derive(Debug, Clone, Copy)]
pub struct TriggerMapper {
    min_interval_secs: f64,
    utc_offset: Option<UtcOffset>,
}

impl TriggerMapper {
    pub fn new() -> Self {
        Self {
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
            utc_offset: None,
        }
    }

    /// Override the interval floor. Values outside `(0, MAX_INTERVAL_SECS]` are ignored.
    pub fn with_min_interval(mut self, secs: f64) -> Self {
        if secs > 0.0 && secs <= MAX_INTERVAL_SECS {
            self.min_interval_secs = secs;
        }
        self
    }

    /// Decompose exact dates in this offset instead of the instant's own.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn min_interval_secs(&self) -> f64 {
        self.min_interval_secs
    }

    pub fn map(&self, schedule: &NotificationSchedule) -> Trigger {
        match schedule {
            NotificationSchedule::TimeInterval { offset, repeats } => {
                // NaN and anything below the floor (including -inf) fire at the
                // floor; overflowed offsets saturate instead of firing early.
                let requested = offset.as_secs_f64();
                let interval_secs = if requested.is_nan() {
                    self.min_interval_secs
                } else {
                    requested.clamp(self.min_interval_secs, MAX_INTERVAL_SECS)
                };
                Trigger::TimeInterval {
                    interval_secs,
                    repeats: *repeats,
                }
            }
            NotificationSchedule::Calendar {
                components,
                repeats,
            } => Trigger::Calendar {
                components: components.clone(),
                repeats: *repeats,
            },
            NotificationSchedule::ExactDate { at } => {
                let wall_clock = match self.utc_offset {
                    Some(offset) => at.to_offset(offset),
                    None => *at,
                };
                Trigger::Calendar {
                    components: DateComponents::from_datetime(&wall_clock),
                    repeats: false,
                }
            }
        }
    }
}

impl Default for TriggerMapper {
    fn default() -> Self {
        Self::new()
    }
}
