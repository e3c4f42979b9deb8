//! KYC (know-your-customer) domain model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::format;
use crate::ports::{CellMap, RowView};

/// First RequestID number handed out ("KYC-1001")
pub const REQUEST_ID_BASE: u64 = 1001;

/// Verification state shown on a user's account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::NotStarted => "Not Started",
            KycStatus::Pending => "Pending",
            KycStatus::Verified => "Verified",
            KycStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "notstarted" | "" => Ok(KycStatus::NotStarted),
            "pending" => Ok(KycStatus::Pending),
            "verified" => Ok(KycStatus::Verified),
            "rejected" => Ok(KycStatus::Rejected),
            _ => Err(format!("unknown KYC status: {}", s)),
        }
    }
}

/// State of an individual KYC request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycRequestStatus {
    Pending,
    Verified,
    Rejected,
}

impl KycRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycRequestStatus::Pending => "Pending",
            KycRequestStatus::Verified => "Verified",
            KycRequestStatus::Rejected => "Rejected",
        }
    }

    /// Outcomes an administrator may set
    pub fn is_resolution(&self) -> bool {
        !matches!(self, KycRequestStatus::Pending)
    }
}

impl FromStr for KycRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(KycRequestStatus::Pending),
            "verified" | "approved" => Ok(KycRequestStatus::Verified),
            "rejected" => Ok(KycRequestStatus::Rejected),
            _ => Err(format!("unknown KYC request status: {}", s)),
        }
    }
}

impl From<KycRequestStatus> for KycStatus {
    fn from(status: KycRequestStatus) -> Self {
        match status {
            KycRequestStatus::Pending => KycStatus::Pending,
            KycRequestStatus::Verified => KycStatus::Verified,
            KycRequestStatus::Rejected => KycStatus::Rejected,
        }
    }
}

/// A submitted identity document awaiting (or past) review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KycRequest {
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "AccountID")]
    pub account_id: String,
    pub document_type: String,
    pub document_number: String,
    pub status: KycRequestStatus,
    pub submission_date: Option<NaiveDate>,
    pub admin_comments: String,
}

impl KycRequest {
    pub fn new(
        request_id: String,
        account_id: impl Into<String>,
        document_type: impl Into<String>,
        document_number: impl Into<String>,
        submitted: NaiveDate,
    ) -> Self {
        Self {
            request_id,
            account_id: account_id.into(),
            document_type: document_type.into(),
            document_number: document_number.into(),
            status: KycRequestStatus::Pending,
            submission_date: Some(submitted),
            admin_comments: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == KycRequestStatus::Pending
    }

    /// Rows with an unreadable status are treated as resolved, never pending
    pub fn from_row(row: &RowView<'_>) -> Self {
        Self {
            request_id: row.text("RequestID").to_string(),
            account_id: row.text("AccountID").to_string(),
            document_type: row.text("DocumentType").to_string(),
            document_number: row.text("DocumentNumber").to_string(),
            status: row
                .text("Status")
                .parse()
                .unwrap_or(KycRequestStatus::Rejected),
            submission_date: format::parse_date(row.text("SubmissionDate")),
            admin_comments: row.text("AdminComments").to_string(),
        }
    }

    pub fn to_cells(&self) -> CellMap {
        let mut cells = CellMap::new();
        cells.insert("RequestID".into(), self.request_id.clone());
        cells.insert("AccountID".into(), self.account_id.clone());
        cells.insert("DocumentType".into(), self.document_type.clone());
        cells.insert("DocumentNumber".into(), self.document_number.clone());
        cells.insert("Status".into(), self.status.as_str().to_string());
        cells.insert(
            "SubmissionDate".into(),
            self.submission_date
                .map(|d| d.format(format::DATE_FORMAT).to_string())
                .unwrap_or_default(),
        );
        cells.insert("AdminComments".into(), self.admin_comments.clone());
        cells
    }
}

/// A pending request joined with its owner's name, for the review queue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingKycReview {
    pub id: String,
    pub request_id: String,
    pub name: String,
    pub doc_type: String,
    pub date: String,
    pub status: KycRequestStatus,
}
