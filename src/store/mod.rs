//! Storage boundary.
//!
//! The hosted database is an external collaborator; [`BillingStore`] is the
//! seam the service talks to. Rows arriving from a loosely typed backend are
//! turned into canonical records once, in [`record`], before anything else
//! sees them.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::alert::ConsumptionLimit;
use crate::billing::{Bill, BillStatus, BillingPeriod, MeterReading};
use crate::tariff::TariffSchedule;

mod memory;
pub mod record;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Malformed {record} record: {reason}")]
    Malformed { record: &'static str, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn bill_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "bill",
            id: id.to_string(),
        }
    }

    pub fn malformed(record: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            record,
            reason: reason.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait::async_trait]
pub trait BillingStore: Send + Sync {
    fn name(&self) -> &str;

    async fn tariffs(&self) -> StoreResult<Vec<TariffSchedule>>;

    async fn save_tariff(&self, schedule: &TariffSchedule) -> StoreResult<()>;

    async fn consumption_limit(&self, account_id: &str) -> StoreResult<Option<ConsumptionLimit>>;

    async fn set_consumption_limit(
        &self,
        account_id: &str,
        limit: &ConsumptionLimit,
    ) -> StoreResult<()>;

    async fn delete_consumption_limit(&self, account_id: &str) -> StoreResult<bool>;

    /// Stores a reading keyed by account and reading period, returning the one it replaced.
    async fn upsert_reading(&self, reading: &MeterReading) -> StoreResult<Option<MeterReading>>;

    /// Total units consumed for an account in a billing period, `None` if nothing was recorded.
    async fn consumption_for(
        &self,
        account_id: &str,
        period: BillingPeriod,
    ) -> StoreResult<Option<Decimal>>;

    async fn bill_for(&self, account_id: &str, period: BillingPeriod)
    -> StoreResult<Option<Bill>>;

    /// Stores a bill keyed by account and period, returning the one it replaced.
    async fn upsert_bill(&self, bill: &Bill) -> StoreResult<Option<Bill>>;

    async fn bill(&self, id: Uuid) -> StoreResult<Option<Bill>>;

    /// Bills for one account, or all bills when `account_id` is `None`, newest period first.
    async fn bills(&self, account_id: Option<&str>) -> StoreResult<Vec<Bill>>;

    async fn set_bill_status(&self, id: Uuid, status: BillStatus) -> StoreResult<Bill>;
}

/// Backend constructors.
pub struct StoreFactory;

impl StoreFactory {
    pub fn memory() -> Arc<dyn BillingStore> {
        Arc::new(MemoryStore::new())
    }
}

pub(crate) fn sort_newest_first(bills: &mut [Bill]) {
    bills.sort_by(|a, b| {
        b.period
            .cmp(&a.period)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
}
