//! KYC service - document submission and status

use std::sync::Arc;

use super::activity;
use crate::adapters::repository::SheetRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{KycRequest, KycStatus};

pub struct KycService {
    repository: Arc<SheetRepository>,
}

impl KycService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        Self { repository }
    }

    /// File a verification request; only one can be pending per account
    pub fn submit(&self, account_id: &str, doc_type: &str, doc_number: &str) -> Result<KycRequest> {
        let (doc_type, doc_number) = (doc_type.trim(), doc_number.trim());
        if doc_type.is_empty() || doc_number.is_empty() {
            return Err(Error::validation("Document type and number are required"));
        }
        if self.repository.user_by_id(account_id)?.is_none() {
            return Err(Error::not_found("User not found"));
        }

        let request = self.repository.insert_kyc_request(
            account_id.trim(),
            doc_type,
            doc_number,
            activity::now().date(),
        )?;
        log::info!("{} submitted for {}", request.request_id, request.account_id);
        Ok(request)
    }

    /// Current status, `None` when the account does not exist
    pub fn status(&self, account_id: &str) -> Result<Option<KycStatus>> {
        Ok(self.repository.user_by_id(account_id)?.map(|u| u.kyc_status))
    }
}
