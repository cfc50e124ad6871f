use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use home_core::jobs::{
    PantryItemSnapshot, PantryMonitor, PantryReport, RecurringTaskSnapshot, TaskAdvance,
    TaskRecurrenceJob,
};
use home_core::notifications::NotificationRequest;
use home_core::CooldownConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
    pub cooldown: CooldownConfig,
    /// Fixed clock for reproducible runs; wins over the batch file's `now`.
    pub now: Option<DateTime<Utc>>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = parse_var(&lookup, "HOME_LOW_STOCK_THRESHOLD")? {
            config.cooldown.low_stock_threshold = value;
        }
        if let Some(value) = parse_var(&lookup, "HOME_NEAR_EXPIRY_DAYS")? {
            config.cooldown.near_expiry_days = value;
        }
        if let Some(value) = parse_var(&lookup, "HOME_COOLDOWN_HOURS")? {
            config.cooldown.cooldown_hours = value;
        }
        if let Some(value) = parse_var(&lookup, "HOME_NOTIFY_EXPIRED")? {
            config.cooldown.notify_expired = value;
        }
        if let Some(raw) = lookup("HOME_NOW") {
            let now = DateTime::parse_from_rfc3339(raw.trim())
                .with_context(|| format!("HOME_NOW is not an RFC 3339 timestamp: `{raw}`"))?;
            config.now = Some(now.with_timezone(&Utc));
        }
        config.cooldown.validate()?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value `{raw}`"))?;
    Ok(Some(value))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchInput {
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pantry: Vec<PantryItemSnapshot>,
    #[serde(default)]
    pub tasks: Vec<RecurringTaskSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutput {
    pub now: DateTime<Utc>,
    pub pantry: PantryReport,
    pub tasks: Vec<TaskAdvance>,
    pub notifications: Vec<NotificationRequest>,
}

/// Evaluates the whole batch against one instant.
pub fn process(config: &AppConfig, input: &BatchInput) -> Result<BatchOutput> {
    let now = config.now.or(input.now).unwrap_or_else(Utc::now);
    info!(
        %now,
        pantry = input.pantry.len(),
        tasks = input.tasks.len(),
        "processing batch"
    );

    let monitor = PantryMonitor::new(config.cooldown)?;
    let pantry = monitor
        .run(&input.pantry, now)
        .context("pantry evaluation failed")?;
    let notifications = monitor.requests(&pantry, &input.pantry)?;
    let tasks = TaskRecurrenceJob::new()
        .run(&input.tasks, now)
        .context("task recurrence failed")?;

    Ok(BatchOutput {
        now,
        pantry,
        tasks,
        notifications,
    })
}

/// Reads a batch from `input`: a path, or stdin for `None` / `-`.
pub fn load_batch(input: Option<&str>) -> Result<BatchInput> {
    let raw = match input {
        None | Some("-") => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("unable to read batch from stdin")?;
            buffer
        }
        Some(path) => {
            let path = Path::new(path);
            fs::read_to_string(path)
                .with_context(|| format!("unable to read `{}`", path.display()))?
        }
    };
    serde_json::from_str(&raw).context("batch is not valid JSON")
}

/// Loads, evaluates and prints the batch as JSON on stdout.
pub fn run(config: &AppConfig, input: Option<&str>) -> Result<()> {
    let batch = load_batch(input)?;
    let output = process(config, &batch)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &output)?;
    writeln!(handle)?;
    Ok(())
}
