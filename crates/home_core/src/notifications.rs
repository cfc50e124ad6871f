use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cooldown::NotificationDecision;
use crate::time;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    NearExpiry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRequest {
    pub item_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Delivery adapters (push, email, websocket) implement this.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest);
}

/// The identifying bits of a pantry item a message needs.
#[derive(Debug, Clone, Copy)]
pub struct ItemLabel<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub quantity: f64,
    pub expiry_date: Option<NaiveDate>,
}

/// Requests for every kind the decision fired, low stock first.
pub fn requests_for(
    item: ItemLabel<'_>,
    decision: &NotificationDecision,
) -> Vec<NotificationRequest> {
    let mut requests = Vec::new();
    if let Some(at) = decision.next_low_stock_notified_at() {
        requests.push(NotificationRequest {
            item_id: item.id.to_string(),
            kind: NotificationKind::LowStock,
            title: format!("Running low: {}", item.name),
            body: format!("Only {} left", item.quantity),
            scheduled_for: at,
        });
    }
    if let Some(at) = decision.next_expiry_notified_at() {
        let body = match item.expiry_date {
            Some(date) if time::days_until(date, at) < 0.0 => format!("Expired on {date}"),
            Some(date) => format!("Expires on {date}"),
            None => "Expiring soon".to_string(),
        };
        requests.push(NotificationRequest {
            item_id: item.id.to_string(),
            kind: NotificationKind::NearExpiry,
            title: format!("Use soon: {}", item.name),
            body,
            scheduled_for: at,
        });
    }
    requests
}
