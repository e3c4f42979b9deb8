//! Admin service - back-office views over every account

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::activity::{self, ActivityService};
use crate::adapters::repository::SheetRepository;
use crate::domain::format::DATE_FORMAT;
use crate::domain::result::{Error, Result};
use crate::domain::{ActivityLog, KycRequestStatus, PendingKycReview, User};

/// Default number of rows in the transaction monitor
pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;

/// Activity descriptions that count as audit events
const AUDIT_PATTERN: &str = r"(?i)admin|blocked|dismissed";

pub struct AdminService {
    repository: Arc<SheetRepository>,
    activity: ActivityService,
}

impl AdminService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        let activity = ActivityService::new(Arc::clone(&repository));
        Self {
            repository,
            activity,
        }
    }

    pub fn users(&self) -> Result<Vec<User>> {
        self.repository.users()
    }

    /// Activity scored above the alert threshold, newest first
    pub fn high_risk_alerts(&self) -> Result<Vec<ActivityLog>> {
        Ok(self
            .activity
            .all()?
            .into_iter()
            .filter(|log| log.cyber_risk_score.is_alert())
            .collect())
    }

    /// The latest `limit` activity entries across all accounts
    pub fn transactions(&self, limit: usize) -> Result<Vec<ActivityLog>> {
        let mut logs = self.activity.all()?;
        logs.truncate(limit);
        for log in &mut logs {
            log.description.get_or_insert_with(|| "Transaction".to_string());
        }
        Ok(logs)
    }

    /// Entries whose description mentions an admin action, newest first
    pub fn audit_logs(&self) -> Result<Vec<ActivityLog>> {
        let pattern = Regex::new(AUDIT_PATTERN).map_err(|e| Error::config(e.to_string()))?;
        Ok(self
            .activity
            .all()?
            .into_iter()
            .filter(|log| {
                log.description
                    .as_deref()
                    .is_some_and(|d| pattern.is_match(d))
            })
            .collect())
    }

    /// Pending KYC requests with the owner's name
    pub fn pending_kyc(&self) -> Result<Vec<PendingKycReview>> {
        let names: HashMap<String, String> = self
            .repository
            .users()?
            .into_iter()
            .map(|u| (u.account_id, u.full_name))
            .collect();

        Ok(self
            .repository
            .kyc_requests()?
            .into_iter()
            .filter(|r| r.is_pending())
            .map(|r| PendingKycReview {
                name: names
                    .get(&r.account_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown User".to_string()),
                id: r.account_id,
                request_id: r.request_id,
                doc_type: r.document_type,
                date: r
                    .submission_date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                status: r.status,
            })
            .collect())
    }

    /// Approve or reject an account's pending verification
    pub fn resolve_kyc(&self, account_id: &str, status: KycRequestStatus) -> Result<()> {
        if !status.is_resolution() {
            return Err(Error::validation("Status must be Verified or Rejected"));
        }
        self.repository.resolve_kyc(account_id.trim(), status)?;
        log::info!(
            "Admin set KYC of {} to {} at {}",
            account_id,
            status.as_str(),
            activity::now()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::format::parse_timestamp;
    use crate::domain::{KycStatus, NewUser, RiskScore};

    fn setup() -> (Arc<SheetRepository>, AdminService) {
        let repository = Arc::new(SheetRepository::new(Arc::new(MemoryStore::with_schema())));
        (Arc::clone(&repository), AdminService::new(repository))
    }

    fn log_at(repo: &SheetRepository, entry: ActivityLog, ts: &str) {
        repo.append_activity(entry, parse_timestamp(ts).unwrap()).unwrap();
    }

    #[test]
    fn test_alerts_require_score_above_75() {
        let (repo, admin) = setup();
        log_at(&repo, ActivityLog::new("AC1").with_risk(RiskScore::new(75)), "2025-01-01 10:00:00");
        log_at(&repo, ActivityLog::new("AC1").with_risk(RiskScore::new(90)), "2025-01-01 11:00:00");
        log_at(&repo, ActivityLog::new("AC2").with_risk(RiskScore::new(76)), "2025-01-01 12:00:00");

        let alerts = admin.high_risk_alerts().unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].account_id, "AC2");
    }

    #[test]
    fn test_transactions_limit_and_default_description() {
        let (repo, admin) = setup();
        for minute in 0..4 {
            log_at(&repo, ActivityLog::new("AC1"), &format!("2025-01-01 10:0{}:00", minute));
        }
        let latest = admin.transactions(3).unwrap();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].log_id, "LOG-4");
        assert_eq!(latest[0].description.as_deref(), Some("Transaction"));
    }

    #[test]
    fn test_audit_logs_match_case_insensitively() {
        let (repo, admin) = setup();
        log_at(&repo, ActivityLog::new("AC1").with_description("ADMIN review"), "2025-01-01 10:00:00");
        log_at(&repo, ActivityLog::new("AC1").with_description("Alert dismissed"), "2025-01-01 10:01:00");
        log_at(&repo, ActivityLog::new("AC1").with_description("Deposit via UPI"), "2025-01-01 10:02:00");

        let logs = admin.audit_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].display_description(), "Alert dismissed");
    }

    #[test]
    fn test_pending_kyc_review_and_resolution() {
        let (repo, admin) = setup();
        let user = repo
            .insert_user(
                NewUser {
                    username: "kim".into(),
                    password: "pw".into(),
                    full_name: Some("Kim Lee".into()),
                    ..Default::default()
                },
                activity::now(),
            )
            .unwrap();
        let today = activity::now().date();
        repo.insert_kyc_request(&user.account_id, "Passport", "P1", today).unwrap();
        repo.insert_kyc_request("AC7777", "License", "L1", today).unwrap();

        let pending = admin.pending_kyc().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].name, "Kim Lee");
        assert_eq!(pending[1].name, "Unknown User");

        assert!(matches!(
            admin.resolve_kyc(&user.account_id, KycRequestStatus::Pending),
            Err(Error::Validation(_))
        ));
        admin.resolve_kyc(&user.account_id, KycRequestStatus::Verified).unwrap();
        assert_eq!(admin.pending_kyc().unwrap().len(), 1);
        assert_eq!(
            repo.user_by_id(&user.account_id).unwrap().unwrap().kyc_status,
            KycStatus::Verified
        );
    }
}
