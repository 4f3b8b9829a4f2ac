//! Periodic refresh of the cached top token data.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    task::JoinHandle,
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{error, info, warn};

use crate::config::TopTokensConfig;
use crate::error::AppError;
use crate::scheduler::schedule::RefreshSchedule;
use crate::wallets::{model::TopTokenSnapshot, service::WalletService};

/// Bounded exponential backoff between refresh attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Wall-clock aligned cron schedule.
    Cron(RefreshSchedule),
    /// Fixed period measured from when the job starts.
    Every(Duration),
}

/// Source of wall-clock time for cron triggers.
pub type WallClock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct RefreshJob {
    service: WalletService,
    trigger: Trigger,
    retry: RetryPolicy,
    clock: WallClock,
}

impl RefreshJob {
    pub fn new(service: WalletService, trigger: Trigger, retry: RetryPolicy) -> Self {
        Self {
            service,
            trigger,
            retry,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: WallClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_config(service: WalletService, config: &TopTokensConfig) -> Result<Self, AppError> {
        let schedule = RefreshSchedule::parse(&config.schedule)?;
        let base_delay = config
            .retry_backoff
            .to_std()
            .map_err(|_| AppError::ConfigError("TOP_TOKENS_RETRY_BACKOFF must not be negative".into()))?;

        let retry = RetryPolicy {
            max_retries: config.max_retries,
            base_delay,
            max_delay: schedule.period(),
        };

        Ok(Self::new(service, Trigger::Cron(schedule), retry))
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// One refresh, retrying failures according to the retry policy.
    /// Configuration errors are returned without retrying.
    pub async fn run_once(&self) -> Result<TopTokenSnapshot, AppError> {
        let mut retries = 0;
        loop {
            match self.service.refresh_top_tokens().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e @ AppError::ConfigError(_)) => return Err(e),
                Err(e) if retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Top token refresh failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sleeps until the wall clock reaches `target`. The clock is checked
    /// again after every wake-up, since it may have been stepped meanwhile.
    async fn sleep_until_wall(&self, target: DateTime<Utc>) {
        loop {
            match (target - (self.clock)()).to_std() {
                Ok(delay) if !delay.is_zero() => sleep(delay).await,
                _ => return,
            }
        }
    }

    async fn tick(&self) {
        match self.run_once().await {
            Ok(snapshot) => info!(tokens = snapshot.tokens.len(), "Top Token data updated"),
            Err(e) => error!(error = %e, "Top token refresh gave up"),
        }
    }

    /// Starts the job on the current runtime. Each run completes before the
    /// next is scheduled; ticks missed while a run was in flight are skipped.
    pub fn spawn(self) -> JobHandle {
        let handle = tokio::spawn(async move {
            match self.trigger {
                Trigger::Every(period) => {
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    loop {
                        ticker.tick().await;
                        self.tick().await;
                    }
                }
                Trigger::Cron(schedule) => {
                    let mut last_fire: Option<DateTime<Utc>> = None;
                    loop {
                        // Never fire the same boundary twice, even if the clock went back
                        let now = (self.clock)();
                        let from = last_fire.map_or(now, |last| last.max(now));
                        let target = schedule.next_after(from);
                        self.sleep_until_wall(target).await;
                        self.tick().await;
                        last_fire = Some(target);
                    }
                }
            }
        });

        JobHandle { handle }
    }
}

pub struct JobHandle {
    handle: JoinHandle<()>,
}

impl JobHandle {
    pub fn stop(self) {
        self.handle.abort();
    }
}
