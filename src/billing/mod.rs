//! Billing periods, meter readings, bills and their aggregates.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

mod bill;
mod period;
mod reading;
mod summary;

pub use bill::{Bill, BillStatus};
pub use period::{BillingPeriod, DUE_DAY_OF_MONTH};
pub use reading::MeterReading;
pub use summary::{BillingSummary, bills_due_between, revenue_by_period};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("Current reading {current} is below previous reading {previous}")]
    NegativeConsumption { previous: Decimal, current: Decimal },

    #[error("Invalid billing period '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Unknown bill status '{0}'")]
    InvalidStatus(String),

    #[error("Bill {0} is already paid")]
    AlreadyPaid(Uuid),
}
