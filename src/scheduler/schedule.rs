use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Timelike, Utc};

use crate::error::AppError;

/// Minute-step cron schedule (`*/N * * * *`).
///
/// Fires at every wall-clock minute whose value is a multiple of `N`, so
/// `*/10` fires at :00, :10, :20 and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    step_minutes: u32,
}

impl RefreshSchedule {
    pub fn parse(expr: &str) -> Result<Self, AppError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(AppError::ConfigError(format!(
                "Cron expression '{}' must have 5 fields",
                expr
            )));
        }
        if fields[1..].iter().any(|f| *f != "*") {
            return Err(AppError::ConfigError(format!(
                "Cron expression '{}' only supports a minute step, other fields must be '*'",
                expr
            )));
        }

        let step_minutes = match fields[0] {
            "*" => 1,
            minute => minute
                .strip_prefix("*/")
                .and_then(|step| step.parse::<u32>().ok())
                .filter(|step| (1..=59).contains(step))
                .ok_or_else(|| {
                    AppError::ConfigError(format!("Unsupported cron minute field '{}'", minute))
                })?,
        };

        Ok(Self { step_minutes })
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// Nominal spacing between runs.
    pub fn period(&self) -> Duration {
        Duration::from_secs(u64::from(self.step_minutes) * 60)
    }

    /// First firing time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let minute = ChronoDuration::minutes(1);
        let mut candidate = now.duration_trunc(minute).unwrap_or(now) + minute;
        // Steps that don't divide 60 restart at :00 every hour, like cron
        while candidate.minute() % self.step_minutes != 0 {
            candidate += minute;
        }
        candidate
    }

    pub fn delay_until_next(&self, now: DateTime<Utc>) -> Duration {
        (self.next_after(now) - now).to_std().unwrap_or_default()
    }
}
