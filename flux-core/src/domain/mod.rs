//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod activity;
mod beneficiary;
pub mod format;
mod kyc;
pub mod result;
pub mod risk;
mod schema;
mod user;

pub use activity::{ActivityLog, TransactionType, RAPID_WINDOW_SECS, UNKNOWN_ACCOUNT};
pub use beneficiary::Beneficiary;
pub use kyc::{KycRequest, KycRequestStatus, KycStatus, PendingKycReview, REQUEST_ID_BASE};
pub use risk::{RiskBand, RiskScore};
pub use schema::SheetName;
pub use user::{generate_account_number, generate_ifsc, NewUser, User, ACCOUNT_ID_BASE, IFSC_PREFIX};
