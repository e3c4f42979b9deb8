//! Beneficiary service - saved payees

use std::sync::Arc;

use super::activity::ActivityService;
use crate::adapters::repository::SheetRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{ActivityLog, Beneficiary, RiskScore};

pub struct BeneficiaryService {
    repository: Arc<SheetRepository>,
    activity: ActivityService,
}

impl BeneficiaryService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        let activity = ActivityService::new(Arc::clone(&repository));
        Self {
            repository,
            activity,
        }
    }

    /// Save a payee for an account
    ///
    /// The payee must be an existing Flux account. Adding one is logged as a
    /// risk event.
    pub fn add(
        &self,
        account_id: &str,
        name: &str,
        account_number: &str,
        ifsc: &str,
        nickname: Option<String>,
    ) -> Result<()> {
        if self
            .repository
            .find_by_account(account_number, ifsc)?
            .is_none()
        {
            return Err(Error::validation(
                "Invalid Account Number or IFSC Code. Receiver not found.",
            ));
        }

        let beneficiary = Beneficiary::new(account_id.trim(), name.trim(), account_number, ifsc, nickname);
        self.repository.insert_beneficiary(&beneficiary)?;

        self.activity.log(
            ActivityLog::new(beneficiary.account_id.clone())
                .with_beneficiary_added()
                .with_description(format!("Added Beneficiary {}", beneficiary.beneficiary_name))
                .with_risk(RiskScore::BENEFICIARY_ADDED),
        )?;
        Ok(())
    }

    pub fn list(&self, account_id: &str) -> Result<Vec<Beneficiary>> {
        self.repository.beneficiaries_for(account_id.trim())
    }
}
