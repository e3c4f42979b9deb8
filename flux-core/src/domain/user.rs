//! User (bank account holder) domain model

use chrono::NaiveDateTime;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::format::{self, opt_timestamp};
use super::kyc::KycStatus;
use crate::ports::{CellMap, RowView};

/// Prefix shared by every IFSC code issued by Flux
pub const IFSC_PREFIX: &str = "FLUX0";

/// First AccountID number handed out ("AC1001")
pub const ACCOUNT_ID_BASE: u64 = 1001;

const IFSC_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A registered customer and their single bank account
///
/// The password is kept in plain text, matching what is stored in the
/// sheet; it is never serialized into API responses.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    pub account_number: String,
    #[serde(rename = "IFSC")]
    pub ifsc: String,
    /// Original casing, as entered at signup
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub account_balance: Decimal,
    #[serde(rename = "KYCStatus")]
    pub kyc_status: KycStatus,
    #[serde(with = "opt_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// Fields supplied at signup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl User {
    /// Build a brand-new account with zero balance and fresh bank details
    pub fn open(account_id: String, new_user: NewUser, now: NaiveDateTime) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            account_id,
            account_number: generate_account_number(&mut rng),
            ifsc: generate_ifsc(&mut rng),
            username: new_user.username.trim().to_string(),
            password: new_user.password,
            full_name: new_user
                .full_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            email: new_user.email.unwrap_or_default(),
            phone: new_user.phone.unwrap_or_default(),
            account_balance: Decimal::ZERO,
            kyc_status: KycStatus::NotStarted,
            created_at: Some(now),
        }
    }

    /// Case-insensitive username comparison
    pub fn username_matches(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.trim().to_lowercase()
    }

    /// True when the normalized account number and IFSC both match
    pub fn has_bank_details(&self, account_number: &str, ifsc: &str) -> bool {
        format::normalize_account_number(&self.account_number)
            == format::normalize_account_number(account_number)
            && format::normalize_ifsc(&self.ifsc) == format::normalize_ifsc(ifsc)
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    pub fn from_row(row: &RowView<'_>) -> Self {
        Self {
            account_id: row.text("AccountID").to_string(),
            account_number: format::normalize_account_number(row.text("AccountNumber")),
            ifsc: row.text("IFSC").to_string(),
            username: row.text("Username").to_string(),
            password: row.text("Password").to_string(),
            full_name: row.text("FullName").to_string(),
            email: row.text("Email").to_string(),
            phone: row.text("Phone").to_string(),
            account_balance: format::parse_decimal(row.text("AccountBalance"))
                .unwrap_or(Decimal::ZERO),
            kyc_status: row
                .text("KYCStatus")
                .parse()
                .unwrap_or(KycStatus::NotStarted),
            created_at: format::parse_timestamp(row.text("CreatedAt")),
        }
    }

    pub fn to_cells(&self) -> CellMap {
        let mut cells = CellMap::new();
        cells.insert("AccountID".into(), self.account_id.clone());
        cells.insert("AccountNumber".into(), self.account_number.clone());
        cells.insert("IFSC".into(), self.ifsc.clone());
        cells.insert("Username".into(), self.username.clone());
        cells.insert("Password".into(), self.password.clone());
        cells.insert("FullName".into(), self.full_name.clone());
        cells.insert("Email".into(), self.email.clone());
        cells.insert("Phone".into(), self.phone.clone());
        cells.insert("AccountBalance".into(), format::format_decimal(self.account_balance));
        cells.insert("KYCStatus".into(), self.kyc_status.as_str().to_string());
        cells.insert(
            "CreatedAt".into(),
            self.created_at
                .as_ref()
                .map(format::format_timestamp)
                .unwrap_or_default(),
        );
        cells
    }
}

/// 11-digit account number with a non-zero leading digit
pub fn generate_account_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(10_000_000_000u64..=99_999_999_999u64).to_string()
}

/// "FLUX0" followed by six random uppercase letters or digits
pub fn generate_ifsc<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| IFSC_ALPHABET[rng.gen_range(0..IFSC_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", IFSC_PREFIX, suffix)
}
