//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust
//! use utility_billing::prelude::*;
//! ```

// Core types
pub use crate::Error;
pub use crate::Result;

// Callers
pub use crate::account::{AccountContext, Role};

// Tariffs
pub use crate::tariff::{BillBreakdown, TariffCalculator, TariffSchedule, compute_bill};

// Alerts
pub use crate::alert::{
    AlertDispatcher, AlertNotifier, AlertResult, AlertState, ConsumptionLimit, LogNotifier,
    classify,
};

// Billing
pub use crate::billing::{Bill, BillStatus, BillingPeriod, MeterReading};

// Service and storage
pub use crate::config::BillingSettings;
pub use crate::service::BillingService;
pub use crate::store::{BillingStore, MemoryStore};
