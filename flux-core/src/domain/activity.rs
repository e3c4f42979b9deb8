//! Activity log domain model

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::format::{self, opt_timestamp, serialize_flag, serialize_opt_flag};
use super::risk::RiskScore;
use super::schema::ACTIVITY_COLUMNS;
use crate::ports::{CellMap, RowView};

/// AccountID recorded for failed logins against an unknown username
pub const UNKNOWN_ACCOUNT: &str = "UNKNOWN";

/// Two logs for the same account closer than this are "rapid"
pub const RAPID_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Credit,
    Debit,
    Transfer,
    Login,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "Credit",
            TransactionType::Debit => "Debit",
            TransactionType::Transfer => "Transfer",
            TransactionType::Login => "Login",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            "transfer" => Ok(TransactionType::Transfer),
            "login" => Ok(TransactionType::Login),
            _ => Err(format!("unknown transaction type: {}", s)),
        }
    }
}

/// One row of the activity log
///
/// Only LogID, AccountID, Timestamp, CyberRiskScore and RapidTransactions
/// are always present; the rest depend on the kind of event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityLog {
    #[serde(rename = "LogID")]
    pub log_id: String,
    #[serde(rename = "AccountID")]
    pub account_id: String,
    #[serde(with = "opt_timestamp")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub transaction_amount: Option<Decimal>,
    pub transaction_type: Option<TransactionType>,
    pub description: Option<String>,
    #[serde(rename = "SessionID")]
    pub session_id: Option<String>,
    pub cyber_risk_score: RiskScore,
    #[serde(serialize_with = "serialize_flag")]
    pub rapid_transactions: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_visited: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_flag"
    )]
    pub large_transaction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_trust_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_login_count: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_flag"
    )]
    pub password_changed: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_flag"
    )]
    pub beneficiary_added: Option<bool>,

    /// Columns this model doesn't know about, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ActivityLog {
    /// Start a new entry for an account; IDs and timing are assigned on append
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            cyber_risk_score: RiskScore::LOW,
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.transaction_amount = Some(amount);
        self
    }

    pub fn with_type(mut self, tx_type: TransactionType) -> Self {
        self.transaction_type = Some(tx_type);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_risk(mut self, score: RiskScore) -> Self {
        self.cyber_risk_score = score;
        self
    }

    pub fn with_session_metrics(mut self, duration: Option<u32>, pages: Option<u32>) -> Self {
        self.session_duration = duration;
        self.pages_visited = pages;
        self
    }

    pub fn with_large_transaction(mut self, large: bool) -> Self {
        self.large_transaction = Some(large);
        self
    }

    pub fn with_device_trust(mut self, score: f64) -> Self {
        self.device_trust_score = Some(score);
        self
    }

    pub fn with_failed_login(mut self) -> Self {
        self.failed_login_count = Some(1);
        self
    }

    pub fn with_password_changed(mut self) -> Self {
        self.password_changed = Some(true);
        self
    }

    pub fn with_beneficiary_added(mut self) -> Self {
        self.beneficiary_added = Some(true);
        self
    }

    /// Description as shown in transaction listings
    pub fn display_description(&self) -> &str {
        self.description.as_deref().unwrap_or("Transaction")
    }

    /// True if `previous` happened less than [`RAPID_WINDOW_SECS`] before `now`
    pub fn is_rapid_after(previous: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
        previous
            .map(|prev| (now - prev).num_seconds() < RAPID_WINDOW_SECS)
            .unwrap_or(false)
    }

    pub fn from_row(row: &RowView<'_>) -> Self {
        let extra = row
            .to_cells()
            .into_iter()
            .filter(|(column, _)| !ACTIVITY_COLUMNS.contains(&column.as_str()))
            .collect();

        Self {
            log_id: row.text("LogID").to_string(),
            account_id: row.text("AccountID").to_string(),
            timestamp: format::parse_timestamp(row.text("Timestamp")),
            transaction_amount: format::parse_decimal(row.text("TransactionAmount")),
            transaction_type: row.text("TransactionType").parse().ok(),
            description: row
                .opt("Description")
                .filter(|d| *d != "0")
                .map(str::to_string),
            session_id: row
                .opt("SessionID")
                .filter(|s| *s != "0")
                .map(str::to_string),
            cyber_risk_score: RiskScore::parse(row.text("CyberRiskScore")).unwrap_or_default(),
            rapid_transactions: format::parse_flag(row.text("RapidTransactions")).unwrap_or(false),
            session_duration: format::parse_u32(row.text("SessionDuration")),
            pages_visited: format::parse_u32(row.text("PagesVisited")),
            large_transaction: format::parse_flag(row.text("LargeTransaction")),
            device_trust_score: row.text("DeviceTrustScore").parse().ok(),
            failed_login_count: format::parse_u32(row.text("FailedLoginCount")),
            password_changed: format::parse_flag(row.text("PasswordChanged")),
            beneficiary_added: format::parse_flag(row.text("BeneficiaryAdded")),
            extra,
        }
    }

    /// Cells for the fields that are set; unset optional fields are omitted
    pub fn to_cells(&self) -> CellMap {
        let mut cells: CellMap = self.extra.clone();
        cells.insert("LogID".into(), self.log_id.clone());
        cells.insert("AccountID".into(), self.account_id.clone());
        cells.insert(
            "Timestamp".into(),
            self.timestamp
                .as_ref()
                .map(format::format_timestamp)
                .unwrap_or_default(),
        );
        cells.insert("CyberRiskScore".into(), self.cyber_risk_score.to_string());
        cells.insert(
            "RapidTransactions".into(),
            format::format_flag(self.rapid_transactions),
        );

        let optional = [
            ("TransactionAmount", self.transaction_amount.map(format::format_decimal)),
            ("TransactionType", self.transaction_type.map(|t| t.as_str().to_string())),
            ("Description", self.description.clone()),
            ("SessionID", self.session_id.clone()),
            ("SessionDuration", self.session_duration.map(|v| v.to_string())),
            ("PagesVisited", self.pages_visited.map(|v| v.to_string())),
            ("LargeTransaction", self.large_transaction.map(format::format_flag)),
            ("DeviceTrustScore", self.device_trust_score.map(|v| v.to_string())),
            ("FailedLoginCount", self.failed_login_count.map(|v| v.to_string())),
            ("PasswordChanged", self.password_changed.map(format::format_flag)),
            ("BeneficiaryAdded", self.beneficiary_added.map(format::format_flag)),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                cells.insert(column.into(), value);
            }
        }
        cells
    }
}
