//! In-process store for tests and single-instance deployments.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BillingStore, StoreError, StoreResult, sort_newest_first};
use crate::account::AccountId;
use crate::alert::ConsumptionLimit;
use crate::billing::{Bill, BillStatus, BillingPeriod, MeterReading};
use crate::tariff::TariffSchedule;

type PeriodKey = (AccountId, BillingPeriod);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tariffs: Arc<RwLock<Vec<TariffSchedule>>>,
    limits: Arc<DashMap<AccountId, ConsumptionLimit>>,
    readings: Arc<DashMap<PeriodKey, MeterReading>>,
    bills: Arc<DashMap<PeriodKey, Bill>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

    pub fn bill_count(&self) -> usize {
        self.bills.len()
    }

    pub async fn clear(&self) {
        self.tariffs.write().await.clear();
        self.limits.clear();
        self.readings.clear();
        self.bills.clear();
    }
}

#[async_trait::async_trait]
impl BillingStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn tariffs(&self) -> StoreResult<Vec<TariffSchedule>> {
        Ok(self.tariffs.read().await.clone())
    }

    async fn save_tariff(&self, schedule: &TariffSchedule) -> StoreResult<()> {
        self.tariffs.write().await.push(schedule.clone());
        Ok(())
    }

    async fn consumption_limit(&self, account_id: &str) -> StoreResult<Option<ConsumptionLimit>> {
        Ok(self.limits.get(account_id).map(|l| l.value().clone()))
    }

    async fn set_consumption_limit(
        &self,
        account_id: &str,
        limit: &ConsumptionLimit,
    ) -> StoreResult<()> {
        self.limits.insert(account_id.to_string(), limit.clone());
        Ok(())
    }

    async fn delete_consumption_limit(&self, account_id: &str) -> StoreResult<bool> {
        Ok(self.limits.remove(account_id).is_some())
    }

    async fn upsert_reading(&self, reading: &MeterReading) -> StoreResult<Option<MeterReading>> {
        let key = (reading.account_id.clone(), reading.reading_period);
        Ok(self.readings.insert(key, reading.clone()))
    }

    async fn consumption_for(
        &self,
        account_id: &str,
        period: BillingPeriod,
    ) -> StoreResult<Option<Decimal>> {
        let mut total: Option<Decimal> = None;
        for entry in self.readings.iter() {
            let reading = entry.value();
            if reading.account_id != account_id || reading.billing_period != period {
                continue;
            }
            let units = reading
                .units_consumed()
                .map_err(|e| StoreError::malformed("reading", e.to_string()))?;
            let sum = total.get_or_insert(Decimal::ZERO);
            *sum = sum.saturating_add(units);
        }
        Ok(total)
    }

    async fn bill_for(
        &self,
        account_id: &str,
        period: BillingPeriod,
    ) -> StoreResult<Option<Bill>> {
        let key = (account_id.to_string(), period);
        Ok(self.bills.get(&key).map(|b| b.value().clone()))
    }

    async fn upsert_bill(&self, bill: &Bill) -> StoreResult<Option<Bill>> {
        let key = (bill.account_id.clone(), bill.period);
        Ok(self.bills.insert(key, bill.clone()))
    }

    async fn bill(&self, id: Uuid) -> StoreResult<Option<Bill>> {
        Ok(self
            .bills
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn bills(&self, account_id: Option<&str>) -> StoreResult<Vec<Bill>> {
        let mut bills: Vec<Bill> = self
            .bills
            .iter()
            .filter(|entry| account_id.is_none_or(|a| entry.value().account_id == a))
            .map(|entry| entry.value().clone())
            .collect();
        sort_newest_first(&mut bills);
        Ok(bills)
    }

    async fn set_bill_status(&self, id: Uuid, status: BillStatus) -> StoreResult<Bill> {
        for mut entry in self.bills.iter_mut() {
            if entry.value().id == id {
                entry.value_mut().status = status;
                return Ok(entry.value().clone());
            }
        }
        Err(StoreError::bill_not_found(id))
    }
}
