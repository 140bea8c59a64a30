//! Daily reset of the meal aggregates.
//!
//! The task sleeps until the next local midnight, zeroes every fixed meal,
//! archives what it cleared under the day that just ended, then re-arms.
//! `last_reset` keeps a day from being reset twice. Resets only happen in
//! the first minutes after midnight: a failed pass is retried while that
//! window is open, and once it closes the day's reset is skipped so ratings
//! submitted during the day are never wiped.

use std::{sync::Arc, time::Duration};

use time::{Date, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::{
    clock::Clock,
    ratings::{repo::MealRecordStore, window::Meal},
};

/// Minutes after midnight during which a reset may run.
pub const RESET_WINDOW_MINUTES: u8 = 10;

pub fn in_reset_window(now: OffsetDateTime) -> bool {
    now.hour() == 0 && now.minute() < RESET_WINDOW_MINUTES
}

/// Due when the current local day has not been reset yet.
pub fn is_due(now: OffsetDateTime, last_reset: Option<Date>) -> bool {
    match last_reset {
        Some(day) => now.date() > day,
        None => true,
    }
}

pub fn until_next_midnight(now: OffsetDateTime) -> Duration {
    let midnight = now
        .date()
        .saturating_add(time::Duration::DAY)
        .midnight()
        .assume_offset(now.offset());
    Duration::try_from(midnight - now).unwrap_or(Duration::ZERO)
}

/// Time left until the last second of the reset window (00:09:59).
pub fn until_window_closes(now: OffsetDateTime) -> Duration {
    let last_second = now
        .date()
        .midnight()
        .assume_offset(now.offset())
        + time::Duration::minutes(i64::from(RESET_WINDOW_MINUTES))
        - time::Duration::SECOND;
    Duration::try_from(last_second - now).unwrap_or(Duration::ZERO)
}

pub struct DailyReset {
    store: Arc<dyn MealRecordStore>,
    clock: Arc<dyn Clock>,
    retry_interval: Duration,
    last_reset: Option<Date>,
}

impl DailyReset {
    pub fn new(
        store: Arc<dyn MealRecordStore>,
        clock: Arc<dyn Clock>,
        retry_interval: Duration,
    ) -> Self {
        let now = clock.now();
        let last_reset = if in_reset_window(now) {
            None
        } else {
            Some(now.date())
        };
        Self {
            store,
            clock,
            retry_interval,
            last_reset,
        }
    }

    pub fn last_reset(&self) -> Option<Date> {
        self.last_reset
    }

    /// Runs for the lifetime of the process.
    pub async fn run(mut self) {
        info!(last_reset = ?self.last_reset, "daily reset scheduler started");
        loop {
            let wait = self.tick().await;
            debug!(secs = wait.as_secs(), "daily reset idle");
            tokio::time::sleep(wait).await;
        }
    }

    /// Resets if due and returns how long to sleep before the next check.
    pub async fn tick(&mut self) -> Duration {
        let now = self.clock.now();
        if !is_due(now, self.last_reset) {
            return until_next_midnight(now);
        }
        if !in_reset_window(now) {
            return self.skip_day(now);
        }

        match self.reset(now).await {
            Ok(()) => {
                self.last_reset = Some(now.date());
                until_next_midnight(now)
            }
            Err(e) => {
                let retry = self.retry_interval.min(until_window_closes(now));
                if retry.is_zero() {
                    error!(error = %e, "daily reset failed");
                    return self.skip_day(now);
                }
                error!(error = %e, retry_secs = retry.as_secs(), "daily reset failed; retrying");
                retry
            }
        }
    }

    /// Gives up on today's reset and waits for the next midnight.
    fn skip_day(&mut self, now: OffsetDateTime) -> Duration {
        warn!(date = %now.date(), "reset window closed; skipping today's reset");
        self.last_reset = Some(now.date());
        until_next_midnight(now)
    }

    async fn reset(&self, now: OffsetDateTime) -> anyhow::Result<()> {
        let previous = self.store.reset_all(&Meal::ALL).await?;
        info!(date = %now.date(), "ratings reset");

        let rated: Vec<_> = previous
            .into_iter()
            .filter(|r| r.rating_count > 0)
            .collect();
        if rated.is_empty() {
            return Ok(());
        }
        if let Some(closed) = now.date().previous_day() {
            // History is best effort; the reset itself already happened.
            if let Err(e) = self.store.archive(closed, &rated).await {
                warn!(error = %e, date = %closed, "archiving daily ratings failed");
            }
        }
        Ok(())
    }
}
