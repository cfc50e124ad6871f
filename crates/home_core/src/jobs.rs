//! Batch drivers that evaluate many records against one fixed `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cooldown::{self, CooldownConfig, NotificationDecision, PantryNotificationState};
use crate::error::{Result, RuleError};
use crate::notifications::{self, ItemLabel, NotificationRequest, NotificationSink};
use crate::recurrence::{self, RecurrencePattern};
use crate::time;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PantryItemSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub state: PantryNotificationState,
}

impl PantryItemSnapshot {
    fn label(&self) -> ItemLabel<'_> {
        ItemLabel {
            id: &self.id,
            name: if self.name.is_empty() {
                &self.id
            } else {
                &self.name
            },
            quantity: self.state.quantity,
            expiry_date: self.state.expiry_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PantryOutcome {
    pub item_id: String,
    pub decision: NotificationDecision,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PantryReport {
    pub evaluated_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<PantryOutcome>,
    pub low_stock_alerts: usize,
    pub expiry_alerts: usize,
}

impl PantryReport {
    /// Outcomes that fired at least one alert.
    pub fn fired(&self) -> impl Iterator<Item = &PantryOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.decision.is_empty())
    }
}

/// Runs the cooldown evaluator over a pantry snapshot.
#[derive(Debug, Clone)]
pub struct PantryMonitor {
    config: CooldownConfig,
}

impl PantryMonitor {
    pub fn new(config: CooldownConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Evaluates every item at the same `now`. The first invalid item aborts
    /// the batch so nothing is half-applied by the caller.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub fn run(&self, items: &[PantryItemSnapshot], now: DateTime<Utc>) -> Result<PantryReport> {
        let mut report = PantryReport {
            evaluated_at: Some(now),
            ..PantryReport::default()
        };
        for item in items {
            let decision = cooldown::evaluate(&item.state, now, &self.config)
                .map_err(|err| RuleError::for_item(&item.id, err))?;
            if decision.should_notify_low_stock() {
                report.low_stock_alerts += 1;
            }
            if decision.should_notify_expiry() {
                report.expiry_alerts += 1;
            }
            let low_stock_cooldown_left = time::cooldown_remaining(
                item.state.last_low_stock_notification_at,
                now,
                self.config.cooldown_hours,
            );
            let expiry_cooldown_left = time::cooldown_remaining(
                item.state.last_expiry_notification_at,
                now,
                self.config.cooldown_hours,
            );
            debug!(
                item = %item.id,
                low_stock = decision.should_notify_low_stock(),
                expiry = decision.should_notify_expiry(),
                ?low_stock_cooldown_left,
                ?expiry_cooldown_left,
                "evaluated pantry item"
            );
            report.outcomes.push(PantryOutcome {
                item_id: item.id.clone(),
                decision,
            });
        }
        info!(
            low_stock = report.low_stock_alerts,
            expiry = report.expiry_alerts,
            "pantry evaluation finished"
        );
        Ok(report)
    }

    /// Notification requests for every fired outcome, in item order.
    /// `items` must be the slice the report was produced from; outcomes are
    /// paired with items by position, so repeated ids stay distinct.
    pub fn requests(
        &self,
        report: &PantryReport,
        items: &[PantryItemSnapshot],
    ) -> Result<Vec<NotificationRequest>> {
        if items.len() != report.outcomes.len() {
            return Err(RuleError::invalid(format!(
                "report has {} outcomes but {} items were supplied",
                report.outcomes.len(),
                items.len()
            )));
        }
        let mut requests = Vec::new();
        for (item, outcome) in items.iter().zip(&report.outcomes) {
            if item.id != outcome.item_id {
                return Err(RuleError::invalid(format!(
                    "outcome for `{}` does not line up with item `{}`",
                    outcome.item_id, item.id
                )));
            }
            requests.extend(notifications::requests_for(item.label(), &outcome.decision));
        }
        Ok(requests)
    }

    /// Hands every request to `sink`. Returns how many were scheduled.
    pub fn dispatch(
        &self,
        report: &PantryReport,
        items: &[PantryItemSnapshot],
        sink: &dyn NotificationSink,
    ) -> Result<usize> {
        let requests = self.requests(report, items)?;
        let count = requests.len();
        for request in requests {
            sink.schedule(request);
        }
        Ok(count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringTaskSnapshot {
    pub id: String,
    pub due: DateTime<Utc>,
    pub pattern: RecurrencePattern,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskAdvance {
    pub task_id: String,
    pub previous_due: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    /// Occurrences that fell between the old due date and `now` and were
    /// passed over.
    pub skipped_occurrences: u32,
}

/// Rolls due dates of overdue recurring tasks forward past `now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRecurrenceJob;

impl TaskRecurrenceJob {
    pub fn new() -> Self {
        Self
    }

    /// Tasks whose due date is still in the future are left out of the
    /// result.
    #[instrument(skip(self, tasks), fields(tasks = tasks.len()))]
    pub fn run(
        &self,
        tasks: &[RecurringTaskSnapshot],
        now: DateTime<Utc>,
    ) -> Result<Vec<TaskAdvance>> {
        let mut advances = Vec::new();
        for task in tasks {
            if task.due > now {
                continue;
            }
            let (next, steps) =
                recurrence::next_after_utc(task.due, task.pattern, task.interval, now)
                    .map_err(|err| RuleError::for_item(&task.id, err))?;
            debug!(task = %task.id, %next, steps, "advanced recurring task");
            advances.push(TaskAdvance {
                task_id: task.id.clone(),
                previous_due: task.due,
                next_due: next,
                skipped_occurrences: steps - 1,
            });
        }
        info!(advanced = advances.len(), "task recurrence finished");
        Ok(advances)
    }
}
