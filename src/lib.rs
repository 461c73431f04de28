//! # utility-billing
//!
//! Billing core for a metered utility: a three-tier progressive tariff
//! calculator and a consumption alert classifier, wrapped in a small service
//! that records meter readings, issues bills and notifies customers nearing
//! their monthly limit.
//!
//! ## Pricing
//!
//! ```rust
//! use rust_decimal_macros::dec;
//! use utility_billing::{TariffSchedule, compute_bill};
//!
//! // 50 + 100 × 5 + 200 × 7.5 + 50 × 9
//! assert_eq!(compute_bill(dec!(350), &TariffSchedule::fallback()), dec!(2500.00));
//! ```
//!
//! ## Alerts
//!
//! ```rust
//! use rust_decimal_macros::dec;
//! use utility_billing::{AlertState, ConsumptionLimit, classify};
//!
//! let limit = ConsumptionLimit::new(dec!(100));
//! let result = classify(dec!(85), Some(&limit)).unwrap();
//! assert_eq!(result.state, AlertState::Warning);
//! assert_eq!(result.percentage_used, 85);
//! ```
//!
//! ## Service
//!
//! ```rust,no_run
//! use rust_decimal_macros::dec;
//! use utility_billing::{AccountContext, BillingService, LogNotifier, MeterReading};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), utility_billing::Error> {
//!     let service = BillingService::in_memory().notifier(LogNotifier);
//!     let admin = AccountContext::admin("ops");
//!     let reading = MeterReading::new("cust-42", "2025-03".parse()?, dec!(1200), dec!(1380));
//!     let outcome = service.record_reading(&admin, reading).await?;
//!     println!("{} due {}", outcome.bill.amount, outcome.bill.due_date);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod account;
pub mod alert;
pub mod billing;
pub mod config;
pub mod prelude;
pub mod service;
pub mod store;
pub mod tariff;

pub use account::{AccountContext, AccountId, Role};
pub use alert::{
    AlertDispatcher, AlertNotification, AlertNotifier, AlertResult, AlertState, ConsumptionLimit,
    DispatchReport, LimitError, LogNotifier, NotifyError, classify,
};
pub use billing::{
    Bill, BillStatus, BillingError, BillingPeriod, BillingSummary, MeterReading,
    bills_due_between, revenue_by_period,
};
pub use config::{
    BillingSettings, CompositeConfigProvider, ConfigBuilder, ConfigError, ConfigProvider,
    ConfigProviderExt, EnvConfigProvider, FileConfigProvider, MemoryConfigProvider,
};
pub use service::{BillingService, ConsumptionCheck, ReadingOutcome};
pub use store::{BillingStore, MemoryStore, StoreError, StoreFactory};
pub use tariff::{
    BillBreakdown, PricedUsage, TariffCalculator, TariffError, TariffSchedule,
    TariffScheduleBuilder, Tier, TierCharge, compute_bill, compute_breakdown, select_active,
};

/// Error type for billing operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Tariff schedule rejected.
    #[error("Invalid tariff: {0}")]
    Tariff(#[from] TariffError),

    /// Consumption limit rejected.
    #[error("Invalid consumption limit: {0}")]
    Limit(#[from] LimitError),

    /// Reading, period or bill rule violated.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// A stored entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Storage backend failed or returned an unusable record.
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Caller may not perform the operation.
    #[error("Permission denied: {0}")]
    Permission(String),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller's role or account does not allow the operation
    Authorization,
    /// Input rejected by a domain rule
    Validation,
    /// Configuration could not be loaded or is inconsistent
    Configuration,
    /// Storage backend failures and missing records
    Storage,
    /// Internal errors (IO, JSON)
    Internal,
}

impl Error {
    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Permission(_) => ErrorCategory::Authorization,

            Error::Tariff(_) | Error::Limit(_) | Error::Billing(_) => ErrorCategory::Validation,

            Error::Config(_) => ErrorCategory::Configuration,

            Error::NotFound { .. } | Error::Store(_) => ErrorCategory::Storage,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_authorization_error(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }

    pub fn is_validation_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Only backend failures are worth retrying; everything else fails the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Store(StoreError::Backend(_)))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Error::NotFound { entity, id },
            other => Error::Store(other),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { key, message } => {
                Error::Config(format!("Invalid value for {}: {}", key, message))
            }
            ConfigError::Serialization(e) => Error::Json(e),
            ConfigError::Io(e) => Error::Io(e),
            ConfigError::Env(e) => Error::Config(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
