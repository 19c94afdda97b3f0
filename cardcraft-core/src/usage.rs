use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Repository, UserId};

/// AI-generated flashcards allowed per user per UTC day.
pub const DAILY_GENERATION_LIMIT: u32 = 100;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageStatus {
    pub used_today: u32,
    pub daily_limit: u32,
}

impl UsageStatus {
    pub fn can_generate(&self) -> bool {
        self.used_today < self.daily_limit
    }

    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.used_today)
    }
}

/// The half-open UTC day containing `now`: `[00:00, next 00:00)`.
pub fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Instant the daily quota resets: tomorrow at UTC midnight, regardless of
/// caller locale.
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    day_bounds(now).1
}

/// Counts the owner's AI-generated flashcards created today. Recomputed on
/// every call; concurrent generation attempts can both pass the check before
/// either writes, so the limit may be overshot by a small margin under races.
pub async fn check_usage(
    repo: &dyn Repository,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<UsageStatus, CoreError> {
    let (start, end) = day_bounds(now);
    let used = repo.count_ai_generated(user_id, start, end).await?;
    Ok(UsageStatus {
        used_today: used.min(u64::from(u32::MAX)) as u32,
        daily_limit: DAILY_GENERATION_LIMIT,
    })
}
