//! Transaction service - transfers, deposits and history

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::activity::ActivityService;
use crate::adapters::repository::SheetRepository;
use crate::domain::format;
use crate::domain::result::{Error, Result};
use crate::domain::risk::{self, RiskBand};
use crate::domain::{ActivityLog, RiskScore, TransactionType};

const TRANSFER_SESSION: &str = "SES-UNKNOWN";
const DEPOSIT_SESSION: &str = "SES-DEPOSIT";
const TRANSFER_DEVICE_TRUST: f64 = 85.0;
const DEPOSIT_DEVICE_TRUST: f64 = 95.0;

/// Largest amount a single transfer or deposit may move
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;
/// Amounts are whole cents
const AMOUNT_SCALE: u32 = 2;

/// Client session details attached to money movements
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_duration: Option<u32>,
    #[serde(default)]
    pub pages_visited: Option<u32>,
}

impl SessionInfo {
    fn id_or(&self, default: &str) -> String {
        self.session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn duration(&self) -> Option<u32> {
        Some(self.session_duration.unwrap_or(0))
    }

    fn pages(&self) -> Option<u32> {
        Some(self.pages_visited.unwrap_or(1))
    }
}

/// Transaction service for moving money
pub struct TransactionService {
    repository: Arc<SheetRepository>,
    activity: ActivityService,
}

impl TransactionService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        let activity = ActivityService::new(Arc::clone(&repository));
        Self {
            repository,
            activity,
        }
    }

    /// Move `amount` from the sender to the account identified by number + IFSC
    ///
    /// Debit and credit land in the same write, so either both happen or
    /// neither does. Both sides get an activity entry.
    pub fn transfer(
        &self,
        sender_id: &str,
        amount: Decimal,
        recipient_account: &str,
        recipient_ifsc: &str,
        session: &SessionInfo,
    ) -> Result<TransferReceipt> {
        validate_amount(amount)?;

        let recipient = self
            .repository
            .find_by_account(recipient_account, recipient_ifsc)?
            .ok_or_else(|| Error::validation("Invalid Account Number or IFSC Code."))?;
        if recipient.account_id == sender_id.trim() {
            return Err(Error::validation("Cannot transfer to your own account"));
        }

        let balances = self.repository.adjust_balances(&[
            (sender_id, -amount),
            (recipient.account_id.as_str(), amount),
        ])?;
        let new_balance = balances[0];

        let risk_score = risk::transfer_risk(amount);
        match risk_score.band() {
            RiskBand::High => log::warn!(
                "High-risk transfer of {} from {} (score {})",
                amount,
                sender_id,
                risk_score
            ),
            RiskBand::Medium => log::info!(
                "Medium-risk transfer of {} from {} (score {})",
                amount,
                sender_id,
                risk_score
            ),
            RiskBand::Low => {}
        }

        let large = risk::is_large_transfer(amount);
        let session_id = session.id_or(TRANSFER_SESSION);

        self.activity.log(
            ActivityLog::new(sender_id.trim())
                .with_amount(amount)
                .with_type(TransactionType::Debit)
                .with_description(format!(
                    "Transfer to ACC: {} (IFSC: {})",
                    recipient_account.trim(),
                    recipient_ifsc.trim()
                ))
                .with_session(session_id.clone())
                .with_session_metrics(session.duration(), session.pages())
                .with_large_transaction(large)
                .with_device_trust(TRANSFER_DEVICE_TRUST)
                .with_risk(risk_score),
        )?;

        let sender_name = self
            .repository
            .user_by_id(sender_id)?
            .map(|u| u.full_name)
            .unwrap_or_else(|| "Unknown Sender".to_string());
        self.activity.log(
            ActivityLog::new(recipient.account_id.clone())
                .with_amount(amount)
                .with_type(TransactionType::Credit)
                .with_description(format!("Transfer from {}", sender_name))
                .with_session(session_id)
                .with_large_transaction(large)
                .with_device_trust(TRANSFER_DEVICE_TRUST)
                .with_risk(RiskScore::TRANSFER_RECEIVED),
        )?;

        Ok(TransferReceipt {
            new_balance,
            risk_score,
        })
    }

    /// Add money to an account from an outside source
    pub fn deposit(
        &self,
        account_id: &str,
        amount: Decimal,
        source: Option<&str>,
        session: &SessionInfo,
    ) -> Result<DepositReceipt> {
        validate_amount(amount)?;
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown");

        let balances = self.repository.adjust_balances(&[(account_id, amount)])?;

        self.activity.log(
            ActivityLog::new(account_id.trim())
                .with_amount(amount)
                .with_type(TransactionType::Credit)
                .with_description(format!("Deposit via {}", source))
                .with_session(session.id_or(DEPOSIT_SESSION))
                .with_session_metrics(session.duration(), session.pages())
                .with_large_transaction(risk::is_large_deposit(amount))
                .with_device_trust(DEPOSIT_DEVICE_TRUST)
                .with_risk(RiskScore::DEPOSIT),
        )?;

        Ok(DepositReceipt {
            new_balance: balances[0],
            message: format!(
                "Successfully added ${} via {}",
                format::format_decimal(amount),
                source
            ),
        })
    }

    /// Every activity entry for the account, newest first
    ///
    /// Older rows may lack a description or type; those read as
    /// "Transaction" and Debit.
    pub fn history(&self, account_id: &str) -> Result<Vec<ActivityLog>> {
        let mut logs = self.activity.for_account(account_id)?;
        for log in &mut logs {
            log.description.get_or_insert_with(|| "Transaction".to_string());
            log.transaction_type.get_or_insert(TransactionType::Debit);
        }
        Ok(logs)
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than zero"));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(Error::validation("Amount can have at most 2 decimal places"));
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(Error::validation(format!("Amount cannot exceed {}", MAX_AMOUNT)));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    #[serde(with = "rust_decimal::serde::float")]
    pub new_balance: Decimal,
    pub risk_score: RiskScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositReceipt {
    #[serde(with = "rust_decimal::serde::float")]
    pub new_balance: Decimal,
    pub message: String,
}
