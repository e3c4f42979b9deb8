//! Status service - store-wide summary

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapters::repository::SheetRepository;
use crate::domain::result::Result;

/// Status service for store summaries
pub struct StatusService {
    repository: Arc<SheetRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let users = self.repository.users()?;
        let logs = self.repository.activity_logs()?;
        let kyc = self.repository.kyc_requests()?;

        Ok(StatusSummary {
            backend: self.repository.backend().to_string(),
            total_users: users.len(),
            total_balance: users.iter().map(|u| u.account_balance).sum(),
            total_activity_logs: logs.len(),
            high_risk_alerts: logs.iter().filter(|l| l.cyber_risk_score.is_alert()).count(),
            total_beneficiaries: self.repository.beneficiary_count()?,
            total_kyc_requests: kyc.len(),
            pending_kyc_requests: kyc.iter().filter(|r| r.is_pending()).count(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub backend: String,
    pub total_users: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
    pub total_activity_logs: usize,
    pub high_risk_alerts: usize,
    pub total_beneficiaries: usize,
    pub total_kyc_requests: usize,
    pub pending_kyc_requests: usize,
}
