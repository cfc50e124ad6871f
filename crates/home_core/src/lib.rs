//! Temporal rules for household chores and pantry alerts.
//!
//! Everything here is a pure function of its arguments and an injected
//! `now`; callers load snapshots, invoke the engine and persist the result.

pub mod cooldown;
pub mod error;
pub mod jobs;
pub mod notifications;
pub mod recurrence;
pub mod time;

pub use crate::cooldown::{evaluate, CooldownConfig, NotificationDecision, PantryNotificationState};
pub use crate::error::{Result, RuleError};
pub use crate::jobs::{PantryMonitor, TaskRecurrenceJob};
pub use crate::recurrence::{compute_next, RecurrencePattern, RecurrenceRequest};
