//! Sheet names and the column layout written to a fresh workbook

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sheets making up a Flux database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetName {
    Users,
    ActivityLogs,
    Beneficiaries,
    #[serde(rename = "KYCRequests")]
    KycRequests,
}

impl SheetName {
    pub const ALL: [SheetName; 4] = [
        SheetName::Users,
        SheetName::ActivityLogs,
        SheetName::Beneficiaries,
        SheetName::KycRequests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SheetName::Users => "Users",
            SheetName::ActivityLogs => "ActivityLogs",
            SheetName::Beneficiaries => "Beneficiaries",
            SheetName::KycRequests => "KYCRequests",
        }
    }

    /// Header row for a newly created sheet
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SheetName::Users => USER_COLUMNS,
            SheetName::ActivityLogs => ACTIVITY_COLUMNS,
            SheetName::Beneficiaries => BENEFICIARY_COLUMNS,
            SheetName::KycRequests => KYC_COLUMNS,
        }
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const USER_COLUMNS: &[&str] = &[
    "AccountID",
    "AccountNumber",
    "IFSC",
    "Username",
    "Password",
    "FullName",
    "Email",
    "Phone",
    "AccountBalance",
    "KYCStatus",
    "CreatedAt",
];

pub const ACTIVITY_COLUMNS: &[&str] = &[
    "LogID",
    "AccountID",
    "Timestamp",
    "TransactionAmount",
    "TransactionType",
    "Description",
    "SessionID",
    "CyberRiskScore",
    "RapidTransactions",
    "SessionDuration",
    "PagesVisited",
    "LargeTransaction",
    "DeviceTrustScore",
    "FailedLoginCount",
    "PasswordChanged",
    "BeneficiaryAdded",
];

pub const BENEFICIARY_COLUMNS: &[&str] = &[
    "AccountID",
    "BeneficiaryName",
    "AccountNumber",
    "IFSC",
    "Nickname",
];

pub const KYC_COLUMNS: &[&str] = &[
    "RequestID",
    "AccountID",
    "DocumentType",
    "DocumentNumber",
    "Status",
    "SubmissionDate",
    "AdminComments",
];
