//! Beneficiary (saved payee) domain model

use serde::{Deserialize, Serialize};

use super::format;
use crate::ports::{CellMap, RowView};

/// A payee saved by an account holder
///
/// Unique per (AccountID, AccountNumber).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Beneficiary {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    pub beneficiary_name: String,
    pub account_number: String,
    #[serde(rename = "IFSC")]
    pub ifsc: String,
    pub nickname: String,
}

impl Beneficiary {
    pub fn new(
        account_id: impl Into<String>,
        name: impl Into<String>,
        account_number: &str,
        ifsc: &str,
        nickname: Option<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            beneficiary_name: name.into(),
            account_number: format::normalize_account_number(account_number),
            ifsc: format::normalize_ifsc(ifsc),
            nickname: nickname.unwrap_or_default(),
        }
    }

    /// Same owner and same payee account number
    pub fn same_payee(&self, account_id: &str, account_number: &str) -> bool {
        self.account_id == account_id
            && format::normalize_account_number(&self.account_number)
                == format::normalize_account_number(account_number)
    }

    pub fn from_row(row: &RowView<'_>) -> Self {
        Self {
            account_id: row.text("AccountID").to_string(),
            beneficiary_name: row.text("BeneficiaryName").to_string(),
            account_number: format::normalize_account_number(row.text("AccountNumber")),
            ifsc: row.text("IFSC").to_string(),
            nickname: row.text("Nickname").to_string(),
        }
    }

    pub fn to_cells(&self) -> CellMap {
        let mut cells = CellMap::new();
        cells.insert("AccountID".into(), self.account_id.clone());
        cells.insert("BeneficiaryName".into(), self.beneficiary_name.clone());
        cells.insert("AccountNumber".into(), self.account_number.clone());
        cells.insert("IFSC".into(), self.ifsc.clone());
        cells.insert("Nickname".into(), self.nickname.clone());
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_payee_normalizes_numbers() {
        let ben = Beneficiary::new("AC1001", "Bob", "12345678901", "flux0abc123", None);
        assert_eq!(ben.ifsc, "FLUX0ABC123");
        assert!(ben.same_payee("AC1001", "12345678901.0"));
        assert!(!ben.same_payee("AC1002", "12345678901"));
    }
}
