use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::time;

pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 1.0;
pub const DEFAULT_NEAR_EXPIRY_DAYS: i64 = 3;
pub const DEFAULT_COOLDOWN_HOURS: f64 = 36.0;

/// Tunables for pantry alerts. Every field has a default so a partially
/// specified config deserializes to the documented values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CooldownConfig {
    /// Quantity at or below this counts as low stock.
    pub low_stock_threshold: f64,
    /// Lookahead window, in days measured from `now` to the start of the
    /// expiry date, for the near-expiry alert.
    pub near_expiry_days: i64,
    /// Minimum hours between two alerts of the same kind for one item.
    /// Fractions are allowed; the window is compared in milliseconds.
    pub cooldown_hours: f64,
    /// Also alert for items whose expiry date has already passed.
    pub notify_expired: bool,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            near_expiry_days: DEFAULT_NEAR_EXPIRY_DAYS,
            cooldown_hours: DEFAULT_COOLDOWN_HOURS,
            notify_expired: false,
        }
    }
}

impl CooldownConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.low_stock_threshold.is_finite() || self.low_stock_threshold < 0.0 {
            return Err(RuleError::invalid(format!(
                "low_stock_threshold must be a non-negative number, got {}",
                self.low_stock_threshold
            )));
        }
        if self.near_expiry_days < 0 {
            return Err(RuleError::invalid(format!(
                "near_expiry_days must be non-negative, got {}",
                self.near_expiry_days
            )));
        }
        if !self.cooldown_hours.is_finite() || self.cooldown_hours < 0.0 {
            return Err(RuleError::invalid(format!(
                "cooldown_hours must be a non-negative number, got {}",
                self.cooldown_hours
            )));
        }
        Ok(())
    }
}

/// Snapshot of the pantry-item fields the evaluator reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PantryNotificationState {
    pub quantity: f64,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_low_stock_notification_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_expiry_notification_at: Option<DateTime<Utc>>,
}

impl PantryNotificationState {
    /// Copy of the snapshot with the decision's new anchors written in.
    /// Kinds that did not fire keep their previous timestamp.
    pub fn apply(&self, decision: &NotificationDecision) -> Self {
        Self {
            last_low_stock_notification_at: decision
                .low_stock_at
                .or(self.last_low_stock_notification_at),
            last_expiry_notification_at: decision.expiry_at.or(self.last_expiry_notification_at),
            ..self.clone()
        }
    }
}

/// Which alerts should fire now. A kind fires exactly when its new anchor
/// timestamp is present, so the flag and the timestamp cannot disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationDecision {
    low_stock_at: Option<DateTime<Utc>>,
    expiry_at: Option<DateTime<Utc>>,
}

impl NotificationDecision {
    pub fn should_notify_low_stock(&self) -> bool {
        self.low_stock_at.is_some()
    }

    pub fn should_notify_expiry(&self) -> bool {
        self.expiry_at.is_some()
    }

    pub fn next_low_stock_notified_at(&self) -> Option<DateTime<Utc>> {
        self.low_stock_at
    }

    pub fn next_expiry_notified_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_at
    }

    pub fn is_empty(&self) -> bool {
        self.low_stock_at.is_none() && self.expiry_at.is_none()
    }
}

#[derive(Serialize, Deserialize)]
struct DecisionRecord {
    should_notify_low_stock: bool,
    should_notify_expiry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_low_stock_notified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_expiry_notified_at: Option<DateTime<Utc>>,
}

impl Serialize for NotificationDecision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DecisionRecord {
            should_notify_low_stock: self.should_notify_low_stock(),
            should_notify_expiry: self.should_notify_expiry(),
            next_low_stock_notified_at: self.low_stock_at,
            next_expiry_notified_at: self.expiry_at,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NotificationDecision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let record = DecisionRecord::deserialize(deserializer)?;
        if record.should_notify_low_stock != record.next_low_stock_notified_at.is_some() {
            return Err(D::Error::custom(
                "should_notify_low_stock disagrees with next_low_stock_notified_at",
            ));
        }
        if record.should_notify_expiry != record.next_expiry_notified_at.is_some() {
            return Err(D::Error::custom(
                "should_notify_expiry disagrees with next_expiry_notified_at",
            ));
        }
        Ok(Self {
            low_stock_at: record.next_low_stock_notified_at,
            expiry_at: record.next_expiry_notified_at,
        })
    }
}

/// Decide which pantry alerts fire at `now`.
///
/// Low stock and near expiry are judged independently, each against its
/// own cooldown clock. An item with no expiry date never gets an expiry
/// alert; an item never alerted before is immediately eligible.
pub fn evaluate(
    state: &PantryNotificationState,
    now: DateTime<Utc>,
    config: &CooldownConfig,
) -> Result<NotificationDecision> {
    config.validate()?;
    if !state.quantity.is_finite() || state.quantity < 0.0 {
        return Err(RuleError::invalid(format!(
            "quantity must be a non-negative number, got {}",
            state.quantity
        )));
    }

    let mut decision = NotificationDecision::default();

    if is_low_stock(state.quantity, config)
        && time::cooldown_satisfied(
            state.last_low_stock_notification_at,
            now,
            config.cooldown_hours,
        )
    {
        decision.low_stock_at = Some(now);
    }

    if let Some(expiry) = state.expiry_date {
        if is_near_expiry(expiry, now, config)
            && time::cooldown_satisfied(
                state.last_expiry_notification_at,
                now,
                config.cooldown_hours,
            )
        {
            decision.expiry_at = Some(now);
        }
    }

    Ok(decision)
}

pub fn is_low_stock(quantity: f64, config: &CooldownConfig) -> bool {
    quantity <= config.low_stock_threshold
}

/// Near expiry while `0 <= days_until <= near_expiry_days`. Already expired
/// items (negative remaining time) only count when `notify_expired` is set.
pub fn is_near_expiry(expiry: NaiveDate, now: DateTime<Utc>, config: &CooldownConfig) -> bool {
    let days = time::days_until(expiry, now);
    if days < 0.0 {
        return config.notify_expired;
    }
    days <= config.near_expiry_days as f64
}
