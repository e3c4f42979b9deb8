//! Account service - signup, login, password changes and the dashboard

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use super::activity::{self, ActivityService, DEFAULT_RECENT_LIMIT};
use crate::adapters::repository::SheetRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{ActivityLog, KycStatus, NewUser, RiskScore, User, UNKNOWN_ACCOUNT};

const LOGIN_FAIL_SESSION: &str = "SES-LOGIN-FAIL";
const PASSWORD_CHANGE_SESSION: &str = "SES-PASS-CHANGE";

/// Account service for customer identity and the account overview
pub struct AccountService {
    repository: Arc<SheetRepository>,
    activity: ActivityService,
}

impl AccountService {
    pub fn new(repository: Arc<SheetRepository>) -> Self {
        let activity = ActivityService::new(Arc::clone(&repository));
        Self {
            repository,
            activity,
        }
    }

    /// Register a new customer
    pub fn signup(&self, new_user: NewUser) -> Result<User> {
        if new_user.username.trim().is_empty() || new_user.password.trim().is_empty() {
            return Err(Error::validation("Username and password are required"));
        }
        self.repository.insert_user(new_user, activity::now())
    }

    /// Check credentials
    ///
    /// Every failure is logged as a risk event, against the account when the
    /// username exists and against `UNKNOWN` otherwise. Callers only ever see
    /// "Invalid credentials".
    pub fn login(&self, username: &str, password: &str) -> Result<LoginSession> {
        let (account_id, description) = match self.repository.user_by_username(username)? {
            Some(user) if user.password_matches(password) => {
                log::info!("Login succeeded for {}", user.account_id);
                return Ok(LoginSession {
                    account_id: user.account_id,
                    full_name: user.full_name,
                    role: "user".to_string(),
                });
            }
            Some(user) => (
                user.account_id,
                "Failed login attempt (Wrong password)".to_string(),
            ),
            None => (
                UNKNOWN_ACCOUNT.to_string(),
                format!("Failed login attempt (Unknown user: {})", username),
            ),
        };

        log::warn!("Failed login for {:?} ({})", username, account_id);
        self.activity.log(
            ActivityLog::new(account_id)
                .with_failed_login()
                .with_description(description)
                .with_session(LOGIN_FAIL_SESSION)
                .with_risk(RiskScore::FAILED_LOGIN),
        )?;
        Err(Error::unauthorized("Invalid credentials"))
    }

    pub fn change_password(&self, account_id: &str, old: &str, new: &str) -> Result<()> {
        if new.trim().is_empty() {
            return Err(Error::validation("New password is required"));
        }
        let mut user = self
            .repository
            .user_by_id(account_id)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        if !user.password_matches(old) {
            return Err(Error::unauthorized("Incorrect current password"));
        }

        user.password = new.to_string();
        self.repository.update_user(&user)?;

        self.activity.log(
            ActivityLog::new(account_id)
                .with_password_changed()
                .with_description("User successfully changed password")
                .with_session(PASSWORD_CHANGE_SESSION)
                .with_risk(RiskScore::PASSWORD_CHANGED),
        )?;
        Ok(())
    }

    pub fn get_user(&self, account_id: &str) -> Result<User> {
        self.repository
            .user_by_id(account_id)?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    /// Balance, bank details and the most recent activity
    pub fn dashboard(&self, account_id: &str) -> Result<Dashboard> {
        let user = self.get_user(account_id)?;
        let recent_activity = self.activity.recent(account_id, DEFAULT_RECENT_LIMIT)?;

        Ok(Dashboard {
            balance: user.account_balance,
            kyc_status: user.kyc_status,
            account_number: non_empty_or(user.account_number, "Not Assigned"),
            ifsc: non_empty_or(user.ifsc, "Not Assigned"),
            recent_activity,
        })
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub account_id: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub kyc_status: KycStatus,
    pub account_number: String,
    pub ifsc: String,
    pub recent_activity: Vec<ActivityLog>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;

    fn setup() -> (Arc<SheetRepository>, AccountService) {
        let repository = Arc::new(SheetRepository::new(Arc::new(MemoryStore::with_schema())));
        let service = AccountService::new(Arc::clone(&repository));
        (repository, service)
    }

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            full_name: Some("Alice Smith".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_signup_defaults() {
        let (_, service) = setup();
        let user = service
            .signup(NewUser {
                username: "bob".into(),
                password: "pw".into(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(user.full_name, "Unknown");
        assert_eq!(user.account_balance, Decimal::ZERO);
        assert_eq!(user.kyc_status, KycStatus::NotStarted);
        assert_eq!(user.account_number.len(), 11);
        assert!(user.ifsc.starts_with("FLUX0"));
    }

    #[test]
    fn test_signup_requires_credentials() {
        let (repository, service) = setup();
        let err = service.signup(new_user("  ", "pw")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = service.signup(new_user("alice", " \t ")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(repository.users().unwrap().is_empty());
    }

    #[test]
    fn test_login_is_case_insensitive() {
        let (_, service) = setup();
        let user = service.signup(new_user("Alice", "secret")).unwrap();

        let session = service.login("ALICE", "secret").unwrap();
        assert_eq!(session.account_id, user.account_id);
        assert_eq!(session.full_name, "Alice Smith");
        assert_eq!(session.role, "user");
    }

    #[test]
    fn test_wrong_password_is_logged_against_account() {
        let (repository, service) = setup();
        let user = service.signup(new_user("alice", "secret")).unwrap();

        let err = service.login("alice", "nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");

        let logs = repository.activity_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].account_id, user.account_id);
        assert_eq!(logs[0].failed_login_count, Some(1));
        assert_eq!(logs[0].session_id.as_deref(), Some("SES-LOGIN-FAIL"));
        assert_eq!(logs[0].cyber_risk_score, RiskScore::FAILED_LOGIN);
    }

    #[test]
    fn test_unknown_user_is_logged_as_unknown() {
        let (repository, service) = setup();
        assert!(matches!(
            service.login("ghost", "x"),
            Err(Error::Unauthorized(_))
        ));

        let logs = repository.activity_logs().unwrap();
        assert_eq!(logs[0].account_id, UNKNOWN_ACCOUNT);
        assert_eq!(
            logs[0].display_description(),
            "Failed login attempt (Unknown user: ghost)"
        );
    }

    #[test]
    fn test_change_password() {
        let (repository, service) = setup();
        let user = service.signup(new_user("alice", "old")).unwrap();

        let err = service.change_password(&user.account_id, "wrong", "new").unwrap_err();
        assert_eq!(err.to_string(), "Incorrect current password");

        service.change_password(&user.account_id, "old", "new").unwrap();
        assert!(service.login("alice", "new").is_ok());

        let logs = repository.activity_logs().unwrap();
        assert_eq!(logs.last().unwrap().password_changed, Some(true));

        assert!(matches!(
            service.change_password("AC9999", "a", "b"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_dashboard() {
        let (_, service) = setup();
        let user = service.signup(new_user("alice", "pw")).unwrap();
        for _ in 0..7 {
            let _ = service.login("alice", "bad");
        }

        let dashboard = service.dashboard(&user.account_id).unwrap();
        assert_eq!(dashboard.balance, Decimal::ZERO);
        assert_eq!(dashboard.account_number, user.account_number);
        assert_eq!(dashboard.recent_activity.len(), DEFAULT_RECENT_LIMIT);
        assert!(matches!(service.dashboard("AC9999"), Err(Error::NotFound(_))));
    }
}
