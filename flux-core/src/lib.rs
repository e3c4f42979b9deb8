//! Flux Core - Business logic for the Flux Financial demo bank
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, ActivityLog, KycRequest, etc.)
//! - **ports**: The `SheetStore` trait every storage backend implements
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete stores (Excel workbook, Google Sheets, memory)
//!   and the typed `SheetRepository`

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::repository::SheetRepository;
use config::Config;
use ports::SheetStore;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    ActivityLog, Beneficiary, KycRequest, KycRequestStatus, KycStatus, NewUser, RiskScore,
    TransactionType, User,
};

/// Main context for Flux operations
///
/// This is the primary entry point for all business logic. It holds the
/// configuration, the repository over the chosen store, and all services.
pub struct FluxContext {
    pub config: Config,
    pub repository: Arc<SheetRepository>,
    pub account_service: AccountService,
    pub transaction_service: TransactionService,
    pub activity_service: ActivityService,
    pub beneficiary_service: BeneficiaryService,
    pub kyc_service: KycService,
    pub admin_service: AdminService,
    pub status_service: StatusService,
}

impl FluxContext {
    /// Load config from `data_dir` and open the configured store
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let store = adapters::open_store(&config)?;
        Ok(Self::with_store(config, store))
    }

    /// Build a context over an already-opened store
    pub fn with_store(config: Config, store: Arc<dyn SheetStore>) -> Self {
        let repository = Arc::new(SheetRepository::new(store));

        Self {
            account_service: AccountService::new(Arc::clone(&repository)),
            transaction_service: TransactionService::new(Arc::clone(&repository)),
            activity_service: ActivityService::new(Arc::clone(&repository)),
            beneficiary_service: BeneficiaryService::new(Arc::clone(&repository)),
            kyc_service: KycService::new(Arc::clone(&repository)),
            admin_service: AdminService::new(Arc::clone(&repository)),
            status_service: StatusService::new(Arc::clone(&repository)),
            repository,
            config,
        }
    }
}
