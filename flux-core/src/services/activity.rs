//! Activity service - the per-account event log

use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};

use crate::adapters::repository::SheetRepository;
use crate::domain::result::Result;
use crate::domain::ActivityLog;

/// How many entries the dashboard shows
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Activity service for recording and reading account events
#[derive(Clone)]
pub struct ActivityService {
    repository: Arc<SheetRepository>,
}

impl ActivityService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        Self { repository }
    }

    /// Record an event now
    pub fn log(&self, entry: ActivityLog) -> Result<ActivityLog> {
        self.log_at(entry, now())
    }

    /// Record an event at a given time
    ///
    /// The entry's account and risk score are kept; LogID, Timestamp and
    /// RapidTransactions are assigned here.
    pub fn log_at(&self, entry: ActivityLog, at: NaiveDateTime) -> Result<ActivityLog> {
        let logged = self.repository.append_activity(entry, at)?;
        log::debug!(
            "{} logged for {} (risk {})",
            logged.log_id,
            logged.account_id,
            logged.cyber_risk_score
        );
        Ok(logged)
    }

    /// Every entry for one account, newest first
    pub fn for_account(&self, account_id: &str) -> Result<Vec<ActivityLog>> {
        let logs = self
            .repository
            .activity_logs()?
            .into_iter()
            .filter(|log| log.account_id == account_id)
            .collect();
        Ok(newest_first(logs))
    }

    /// The `limit` most recent entries for one account
    pub fn recent(&self, account_id: &str, limit: usize) -> Result<Vec<ActivityLog>> {
        let mut logs = self.for_account(account_id)?;
        logs.truncate(limit);
        Ok(logs)
    }

    /// Every entry in the log, newest first
    pub fn all(&self) -> Result<Vec<ActivityLog>> {
        Ok(newest_first(self.repository.activity_logs()?))
    }
}

/// Local wall-clock time at the whole-second precision the sheets keep
pub(crate) fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Sort by timestamp descending; equal (or missing) timestamps keep the
/// later row first
pub(crate) fn newest_first(logs: Vec<ActivityLog>) -> Vec<ActivityLog> {
    let mut indexed: Vec<(usize, ActivityLog)> = logs.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
    indexed.into_iter().map(|(_, log)| log).collect()
}
