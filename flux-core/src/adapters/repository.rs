//! Typed access to the four sheets
//!
//! Every mutation is a whole-sheet read-modify-write. The write lock makes
//! those sequences atomic with respect to each other inside one process;
//! the store itself is responsible for anything across processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{
    format, ActivityLog, Beneficiary, KycRequest, KycRequestStatus, KycStatus, NewUser,
    SheetName, User, ACCOUNT_ID_BASE, REQUEST_ID_BASE,
};
use crate::ports::{SheetData, SheetStore};

const ACCOUNT_ID_PREFIX: &str = "AC";
const LOG_ID_PREFIX: &str = "LOG-";
const LOG_ID_BASE: u64 = 1;
const REQUEST_ID_PREFIX: &str = "KYC-";

pub struct SheetRepository {
    store: Arc<dyn SheetStore>,
    write_lock: Mutex<()>,
}

impl SheetRepository {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &str {
        self.store.backend()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| Error::storage(format!("Write lock poisoned: {}", e)))
    }

    /// Load a sheet; a sheet that does not exist yet starts with its header
    fn load(&self, sheet: SheetName) -> Result<SheetData> {
        let data = self.store.load(sheet)?;
        if data.columns().is_empty() {
            return Ok(SheetData::with_columns(sheet.columns()));
        }
        Ok(data)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn users(&self) -> Result<Vec<User>> {
        let sheet = self.load(SheetName::Users)?;
        Ok(sheet.rows().map(|row| User::from_row(&row)).collect())
    }

    /// Case-insensitive lookup
    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users()?
            .into_iter()
            .find(|u| u.username_matches(username)))
    }

    pub fn user_by_id(&self, account_id: &str) -> Result<Option<User>> {
        let account_id = account_id.trim();
        Ok(self
            .users()?
            .into_iter()
            .find(|u| u.account_id == account_id))
    }

    /// Look up a customer by their bank details
    pub fn find_by_account(&self, account_number: &str, ifsc: &str) -> Result<Option<User>> {
        Ok(self
            .users()?
            .into_iter()
            .find(|u| u.has_bank_details(account_number, ifsc)))
    }

    /// Open a new account. Usernames are unique regardless of case.
    pub fn insert_user(&self, new_user: NewUser, now: NaiveDateTime) -> Result<User> {
        let _guard = self.lock()?;
        let mut sheet = self.load(SheetName::Users)?;

        let taken = sheet
            .rows()
            .any(|row| row.text("Username").to_lowercase() == new_user.username.trim().to_lowercase());
        if taken {
            return Err(Error::conflict("Username already exists"));
        }

        let account_id = next_id(&sheet, "AccountID", ACCOUNT_ID_PREFIX, ACCOUNT_ID_BASE);
        let user = User::open(account_id, new_user, now);
        sheet.push_row(&user.to_cells(), "");
        self.store.save(SheetName::Users, &sheet)?;

        log::info!("Created account {} for {}", user.account_id, user.username);
        Ok(user)
    }

    /// Overwrite the stored row for `user.account_id`
    pub fn update_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock()?;
        let mut sheet = self.load(SheetName::Users)?;
        let index = user_row(&sheet, &user.account_id)
            .ok_or_else(|| Error::not_found("User not found"))?;
        sheet.update_row(index, &user.to_cells());
        self.store.save(SheetName::Users, &sheet)
    }

    /// Apply balance deltas in a single write
    ///
    /// Either every delta is applied or none is: an unknown account, an
    /// overflowing balance or one that would go negative aborts before
    /// anything is saved.
    /// Returns the resulting balances in the order given.
    pub fn adjust_balances(&self, deltas: &[(&str, Decimal)]) -> Result<Vec<Decimal>> {
        let _guard = self.lock()?;
        let mut sheet = self.load(SheetName::Users)?;

        let mut balances: HashMap<usize, Decimal> = HashMap::new();
        let mut results = Vec::with_capacity(deltas.len());
        for (account_id, delta) in deltas {
            let index = user_row(&sheet, account_id)
                .ok_or_else(|| Error::not_found("User not found"))?;
            let current = match balances.get(&index) {
                Some(balance) => *balance,
                None => format::parse_decimal(sheet.row(index).text("AccountBalance"))
                    .unwrap_or(Decimal::ZERO),
            };
            let updated = current
                .checked_add(*delta)
                .ok_or_else(|| Error::validation("Amount too large"))?;
            if updated < Decimal::ZERO {
                return Err(Error::InsufficientFunds);
            }
            balances.insert(index, updated);
            results.push(updated);
        }

        for (index, balance) in balances {
            sheet.set(index, "AccountBalance", format::format_decimal(balance));
        }
        self.store.save(SheetName::Users, &sheet)?;
        Ok(results)
    }

    // ========================================================================
    // Activity logs
    // ========================================================================

    /// Every log in sheet order
    pub fn activity_logs(&self) -> Result<Vec<ActivityLog>> {
        let sheet = self.load(SheetName::ActivityLogs)?;
        Ok(sheet.rows().map(|row| ActivityLog::from_row(&row)).collect())
    }

    /// Append a log entry, stamping its ID, time and rapid-activity flag
    ///
    /// Columns already in the sheet that the entry does not set are filled
    /// with "0".
    pub fn append_activity(&self, mut log: ActivityLog, now: NaiveDateTime) -> Result<ActivityLog> {
        let _guard = self.lock()?;
        let mut sheet = self.load(SheetName::ActivityLogs)?;

        let previous = sheet
            .rows()
            .filter(|row| row.text("AccountID") == log.account_id)
            .last()
            .and_then(|row| format::parse_timestamp(row.text("Timestamp")));

        log.log_id = next_id(&sheet, "LogID", LOG_ID_PREFIX, LOG_ID_BASE);
        log.timestamp = Some(now);
        log.rapid_transactions = ActivityLog::is_rapid_after(previous, now);

        sheet.push_row(&log.to_cells(), "0");
        self.store.save(SheetName::ActivityLogs, &sheet)?;
        Ok(log)
    }

    // ========================================================================
    // Beneficiaries
    // ========================================================================

    pub fn beneficiaries_for(&self, account_id: &str) -> Result<Vec<Beneficiary>> {
        let sheet = self.load(SheetName::Beneficiaries)?;
        Ok(sheet
            .rows()
            .map(|row| Beneficiary::from_row(&row))
            .filter(|b| b.account_id == account_id)
            .collect())
    }

    pub fn beneficiary_count(&self) -> Result<usize> {
        Ok(self.load(SheetName::Beneficiaries)?.len())
    }

    pub fn insert_beneficiary(&self, beneficiary: &Beneficiary) -> Result<()> {
        let _guard = self.lock()?;
        let mut sheet = self.load(SheetName::Beneficiaries)?;

        let exists = sheet.rows().any(|row| {
            Beneficiary::from_row(&row).same_payee(&beneficiary.account_id, &beneficiary.account_number)
        });
        if exists {
            return Err(Error::conflict("Beneficiary already exists"));
        }

        sheet.push_row(&beneficiary.to_cells(), "");
        self.store.save(SheetName::Beneficiaries, &sheet)
    }

    // ========================================================================
    // KYC
    // ========================================================================

    pub fn kyc_requests(&self) -> Result<Vec<KycRequest>> {
        let sheet = self.load(SheetName::KycRequests)?;
        Ok(sheet.rows().map(|row| KycRequest::from_row(&row)).collect())
    }

    /// File a new Pending request and mark the account's KYC as Pending
    ///
    /// An account can have at most one Pending request.
    pub fn insert_kyc_request(
        &self,
        account_id: &str,
        document_type: &str,
        document_number: &str,
        today: NaiveDate,
    ) -> Result<KycRequest> {
        let _guard = self.lock()?;
        let mut sheet = self.load(SheetName::KycRequests)?;

        let in_progress = sheet.rows().any(|row| {
            let request = KycRequest::from_row(&row);
            request.account_id == account_id && request.is_pending()
        });
        if in_progress {
            return Err(Error::conflict("KYC Verification already in progress"));
        }

        let request_id = next_id(&sheet, "RequestID", REQUEST_ID_PREFIX, REQUEST_ID_BASE);
        let request = KycRequest::new(request_id, account_id, document_type, document_number, today);
        sheet.push_row(&request.to_cells(), "");
        self.store.save(SheetName::KycRequests, &sheet)?;

        let mut users = self.load(SheetName::Users)?;
        if let Some(index) = user_row(&users, account_id) {
            users.set(index, "KYCStatus", KycStatus::Pending.as_str());
            self.store.save(SheetName::Users, &users)?;
        }
        Ok(request)
    }

    /// Close every Pending request of an account and set its KYC status
    pub fn resolve_kyc(&self, account_id: &str, status: KycRequestStatus) -> Result<()> {
        let _guard = self.lock()?;
        let mut users = self.load(SheetName::Users)?;
        let user_index =
            user_row(&users, account_id).ok_or_else(|| Error::not_found("User not found"))?;

        let mut sheet = self.load(SheetName::KycRequests)?;
        let pending: Vec<usize> = sheet
            .rows()
            .filter(|row| {
                let request = KycRequest::from_row(row);
                request.account_id == account_id && request.is_pending()
            })
            .map(|row| row.index())
            .collect();
        for index in &pending {
            sheet.set(*index, "Status", status.as_str());
        }
        self.store.save(SheetName::KycRequests, &sheet)?;

        users.set(user_index, "KYCStatus", KycStatus::from(status).as_str());
        self.store.save(SheetName::Users, &users)?;

        log::info!(
            "KYC for {} set to {} ({} request(s) closed)",
            account_id,
            status.as_str(),
            pending.len()
        );
        Ok(())
    }
}

fn user_row(sheet: &SheetData, account_id: &str) -> Option<usize> {
    let account_id = account_id.trim();
    sheet
        .rows()
        .find(|row| row.text("AccountID") == account_id)
        .map(|row| row.index())
}

/// Next `{prefix}{n}` identifier
///
/// `n` is past both the row count and every numeric suffix already used, so
/// rows deleted by hand never cause an ID to be reissued.
fn next_id(sheet: &SheetData, column: &str, prefix: &str, base: u64) -> String {
    let by_count = sheet.len() as u64 + base;
    let by_max = sheet
        .rows()
        .filter_map(|row| row.text(column).strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .map(|n| n + 1)
        .unwrap_or(base);
    format!("{}{}", prefix, by_count.max(by_max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::TransactionType;

    fn repo() -> SheetRepository {
        SheetRepository::new(Arc::new(MemoryStore::with_schema()))
    }

    fn now() -> NaiveDateTime {
        format::parse_timestamp("2025-01-15 10:30:00").unwrap()
    }

    fn signup(repo: &SheetRepository, name: &str) -> User {
        repo.insert_user(
            NewUser {
                username: name.to_string(),
                password: "pw".to_string(),
                ..Default::default()
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_account_ids_are_sequential() {
        let repo = repo();
        assert_eq!(signup(&repo, "alice").account_id, "AC1001");
        assert_eq!(signup(&repo, "bob").account_id, "AC1002");
    }

    #[test]
    fn test_next_id_skips_used_suffixes() {
        let mut sheet = SheetData::with_columns(&["LogID"]);
        let mut cells = crate::ports::CellMap::new();
        cells.insert("LogID".into(), "LOG-7".into());
        sheet.push_row(&cells, "");
        assert_eq!(next_id(&sheet, "LogID", LOG_ID_PREFIX, LOG_ID_BASE), "LOG-8");

        let empty = SheetData::with_columns(&["RequestID"]);
        assert_eq!(next_id(&empty, "RequestID", REQUEST_ID_PREFIX, REQUEST_ID_BASE), "KYC-1001");
    }

    #[test]
    fn test_duplicate_username_ignores_case() {
        let repo = repo();
        signup(&repo, "Alice");
        let err = repo
            .insert_user(
                NewUser {
                    username: "ALICE".into(),
                    password: "x".into(),
                    ..Default::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(repo.users().unwrap().len(), 1);
    }

    #[test]
    fn test_adjust_balances_is_all_or_nothing() {
        let repo = repo();
        let a = signup(&repo, "a");
        let b = signup(&repo, "b");
        repo.adjust_balances(&[(a.account_id.as_str(), Decimal::new(100, 0))]).unwrap();

        let err = repo
            .adjust_balances(&[
                (b.account_id.as_str(), Decimal::new(500, 0)),
                (a.account_id.as_str(), Decimal::new(-500, 0)),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds));
        assert_eq!(repo.user_by_id(&b.account_id).unwrap().unwrap().account_balance, Decimal::ZERO);

        let balances = repo
            .adjust_balances(&[
                (a.account_id.as_str(), Decimal::new(-40, 0)),
                (b.account_id.as_str(), Decimal::new(40, 0)),
            ])
            .unwrap();
        assert_eq!(balances, vec![Decimal::new(60, 0), Decimal::new(40, 0)]);
    }

    #[test]
    fn test_adjust_overflow_is_rejected_and_lock_survives() {
        let repo = repo();
        let a = signup(&repo, "a");
        repo.adjust_balances(&[(a.account_id.as_str(), Decimal::MAX)]).unwrap();

        let err = repo
            .adjust_balances(&[(a.account_id.as_str(), Decimal::MAX)])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(repo.user_by_id(&a.account_id).unwrap().unwrap().account_balance, Decimal::MAX);

        let b = signup(&repo, "b");
        let balances = repo.adjust_balances(&[(b.account_id.as_str(), Decimal::TEN)]).unwrap();
        assert_eq!(balances, vec![Decimal::TEN]);
    }

    #[test]
    fn test_adjust_unknown_account() {
        let repo = repo();
        let err = repo.adjust_balances(&[("AC9999", Decimal::ONE)]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_append_activity_marks_rapid_and_fills_zero() {
        let repo = repo();
        let first = repo
            .append_activity(ActivityLog::new("AC1001").with_type(TransactionType::Credit), now())
            .unwrap();
        assert_eq!(first.log_id, "LOG-1");
        assert!(!first.rapid_transactions);

        let later = now() + chrono::Duration::seconds(30);
        let second = repo.append_activity(ActivityLog::new("AC1001"), later).unwrap();
        assert_eq!(second.log_id, "LOG-2");
        assert!(second.rapid_transactions);

        let other = repo.append_activity(ActivityLog::new("AC1002"), later).unwrap();
        assert!(!other.rapid_transactions);

        let sheet = repo.load(SheetName::ActivityLogs).unwrap();
        assert_eq!(sheet.row(1).text("PagesVisited"), "0");
    }

    #[test]
    fn test_kyc_lifecycle() {
        let repo = repo();
        let user = signup(&repo, "kim");
        let today = now().date();

        let request = repo
            .insert_kyc_request(&user.account_id, "Passport", "P123", today)
            .unwrap();
        assert_eq!(request.request_id, "KYC-1001");
        assert_eq!(
            repo.user_by_id(&user.account_id).unwrap().unwrap().kyc_status,
            KycStatus::Pending
        );
        assert!(matches!(
            repo.insert_kyc_request(&user.account_id, "Passport", "P123", today),
            Err(Error::Conflict(_))
        ));

        repo.resolve_kyc(&user.account_id, KycRequestStatus::Verified).unwrap();
        assert_eq!(
            repo.user_by_id(&user.account_id).unwrap().unwrap().kyc_status,
            KycStatus::Verified
        );
        assert!(repo.kyc_requests().unwrap().iter().all(|r| !r.is_pending()));

        let again = repo
            .insert_kyc_request(&user.account_id, "License", "L9", today)
            .unwrap();
        assert_eq!(again.request_id, "KYC-1002");
    }

    #[test]
    fn test_resolve_kyc_unknown_user() {
        let repo = repo();
        assert!(matches!(
            repo.resolve_kyc("AC4040", KycRequestStatus::Rejected),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_beneficiary() {
        let repo = repo();
        let ben = Beneficiary::new("AC1001", "Bob", "12345678901", "FLUX0AAAAAA", None);
        repo.insert_beneficiary(&ben).unwrap();
        assert!(matches!(repo.insert_beneficiary(&ben), Err(Error::Conflict(_))));

        let other_owner = Beneficiary::new("AC1002", "Bob", "12345678901", "FLUX0AAAAAA", None);
        repo.insert_beneficiary(&other_owner).unwrap();
        assert_eq!(repo.beneficiaries_for("AC1001").unwrap().len(), 1);
        assert_eq!(repo.beneficiary_count().unwrap(), 2);
    }
}
