//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and repository access. Each service
//! focuses on a specific use case or feature area.

mod account;
pub(crate) mod activity;
mod admin;
mod beneficiary;
pub mod generator;
mod kyc;
mod status;
mod transaction;

pub use account::{AccountService, Dashboard, LoginSession};
pub use activity::{ActivityService, DEFAULT_RECENT_LIMIT};
pub use admin::{AdminService, DEFAULT_TRANSACTION_LIMIT};
pub use beneficiary::BeneficiaryService;
pub use generator::{DataGenerator, GenerationSummary, GeneratorOptions};
pub use kyc::KycService;
pub use status::{StatusService, StatusSummary};
pub use transaction::{
    DepositReceipt, SessionInfo, TransactionService, TransferReceipt, MAX_AMOUNT,
};
