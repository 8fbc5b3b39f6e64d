//! Cron-to-interval translation.
//!
//! This is not a cron parser. A closed set of canonical expressions maps to
//! fixed intervals; anything else gets the configured fallback. There is no
//! calendar awareness: "daily at 02:00" means "every 24 hours from
//! registration", with no day-of-week or daylight-saving handling.

use std::time::Duration;

/// Fallback interval for expressions outside the table.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(60_000);

/// Recognised cron schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronPreset {
    /// `*/30 * * * * *`
    Every30Seconds,
    /// `* * * * *`
    EveryMinute,
    /// `*/2 * * * *`
    Every2Minutes,
    /// `*/5 * * * *`
    Every5Minutes,
    /// `*/10 * * * *`
    Every10Minutes,
    /// `*/15 * * * *`
    Every15Minutes,
    /// `*/30 * * * *`
    Every30Minutes,
    /// `0 * * * *` or `@hourly`
    Hourly,
    /// `0 H * * *` for H in 0..=23, or `@daily` (hour 0)
    Daily { hour: u8 },
}

impl CronPreset {
    /// Literal interval this preset runs at.
    pub fn interval(&self) -> Duration {
        let ms: u64 = match self {
            CronPreset::Every30Seconds => 30_000,
            CronPreset::EveryMinute => 60_000,
            CronPreset::Every2Minutes => 120_000,
            CronPreset::Every5Minutes => 300_000,
            CronPreset::Every10Minutes => 600_000,
            CronPreset::Every15Minutes => 900_000,
            CronPreset::Every30Minutes => 1_800_000,
            CronPreset::Hourly => 3_600_000,
            CronPreset::Daily { .. } => 86_400_000,
        };
        Duration::from_millis(ms)
    }
}

/// Look up an expression in the table.
///
/// Fields are compared after collapsing runs of whitespace.
pub fn lookup(expr: &str) -> Option<CronPreset> {
    let fields: Vec<&str> = expr.split_whitespace().collect();

    let preset = match fields.as_slice() {
        ["@hourly"] => CronPreset::Hourly,
        ["@daily"] | ["@midnight"] => CronPreset::Daily { hour: 0 },
        ["*/30", "*", "*", "*", "*", "*"] => CronPreset::Every30Seconds,
        ["*", "*", "*", "*", "*"] => CronPreset::EveryMinute,
        ["*/2", "*", "*", "*", "*"] => CronPreset::Every2Minutes,
        ["*/5", "*", "*", "*", "*"] => CronPreset::Every5Minutes,
        ["*/10", "*", "*", "*", "*"] => CronPreset::Every10Minutes,
        ["*/15", "*", "*", "*", "*"] => CronPreset::Every15Minutes,
        ["*/30", "*", "*", "*", "*"] => CronPreset::Every30Minutes,
        ["0", "*", "*", "*", "*"] => CronPreset::Hourly,
        ["0", hour, "*", "*", "*"] => CronPreset::Daily {
            hour: parse_hour(hour)?,
        },
        _ => return None,
    };
    Some(preset)
}

fn parse_hour(field: &str) -> Option<u8> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u8>().ok().filter(|h| *h < 24)
}

/// Interval for `expr`, or `fallback` if the table has no entry.
pub fn interval_or(expr: &str, fallback: Duration) -> Duration {
    match lookup(expr) {
        Some(preset) => preset.interval(),
        None => {
            tracing::debug!(
                cron = %expr,
                fallback_ms = fallback.as_millis(),
                "Unrecognised cron expression, using fallback interval"
            );
            fallback
        }
    }
}

/// Interval for `expr`, falling back to [`DEFAULT_INTERVAL`].
pub fn interval_for(expr: &str) -> Duration {
    interval_or(expr, DEFAULT_INTERVAL)
}
