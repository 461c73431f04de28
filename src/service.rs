//! Billing workflows over a [`BillingStore`].

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountContext;
use crate::alert::{
    AlertDispatcher, AlertNotification, AlertNotifier, AlertResult, ConsumptionLimit,
    DispatchReport, classify,
};
use crate::billing::{
    Bill, BillStatus, BillingError, BillingPeriod, BillingSummary, MeterReading,
    bills_due_between,
};
use crate::config::BillingSettings;
use crate::store::{BillingStore, MemoryStore, StoreError};
use crate::tariff::{BillBreakdown, TariffCalculator, TariffSchedule};
use crate::Result;

/// What [`BillingService::record_reading`] stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingOutcome {
    /// Units consumed between this reading's two meter values.
    pub reading_units: Decimal,
    /// Units billed for the period, summed over every reading billed to it.
    pub units: Decimal,
    pub bill: Bill,
    pub breakdown: BillBreakdown,
    /// The reading this one overwrote for the same account and reading period.
    pub replaced_reading: Option<MeterReading>,
    /// The bill this one overwrote for the same account and billing period.
    pub replaced_bill: Option<Bill>,
    pub used_fallback: bool,
}

impl ReadingOutcome {
    pub fn is_update(&self) -> bool {
        self.replaced_bill.is_some()
    }
}

/// Result of [`BillingService::check_consumption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionCheck {
    pub current_usage: Decimal,
    /// `None` without a usable limit or while usage is under the alert threshold.
    pub alert: Option<AlertResult>,
    /// Present only when a notification was sent out.
    pub dispatch: Option<DispatchReport>,
}

impl ConsumptionCheck {
    pub fn is_alert(&self) -> bool {
        self.alert.as_ref().is_some_and(|a| a.state.is_alert())
    }
}

pub struct BillingService {
    store: Arc<dyn BillingStore>,
    calculator: TariffCalculator,
    dispatcher: AlertDispatcher,
    settings: BillingSettings,
}

impl BillingService {
    pub fn new(store: Arc<dyn BillingStore>, settings: BillingSettings) -> Self {
        Self {
            store,
            calculator: settings.calculator(),
            dispatcher: settings.dispatcher(),
            settings,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), BillingSettings::default())
    }

    pub fn with_dispatcher(mut self, dispatcher: AlertDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn notifier(mut self, notifier: impl AlertNotifier + 'static) -> Self {
        self.dispatcher.register(notifier);
        self
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn BillingStore> {
        &self.store
    }

    pub async fn publish_tariff(
        &self,
        ctx: &AccountContext,
        schedule: TariffSchedule,
    ) -> Result<TariffSchedule> {
        ctx.require_admin("publishing a tariff")?;
        schedule.validate()?;
        self.store.save_tariff(&schedule).await?;

        tracing::info!(
            effective_from = %schedule.effective_from,
            is_active = schedule.is_active,
            base_fee = %schedule.base_fee,
            "Tariff published"
        );
        Ok(schedule)
    }

    pub async fn tariffs(&self) -> Result<Vec<TariffSchedule>> {
        Ok(self.store.tariffs().await?)
    }

    /// Stores a reading, then prices the billing period's total consumption
    /// against the active tariff and stores the resulting bill.
    ///
    /// The period total covers every reading billed to it, the same figure
    /// [`check_consumption`](Self::check_consumption) classifies. Re-recording
    /// the same reading period overwrites the earlier reading; the bill keeps
    /// its id and goes back to pending.
    pub async fn record_reading(
        &self,
        ctx: &AccountContext,
        reading: MeterReading,
    ) -> Result<ReadingOutcome> {
        ctx.require_admin("recording a meter reading")?;
        let reading_units = reading.units_consumed()?;

        let replaced_reading = self.store.upsert_reading(&reading).await?;
        let units = self
            .store
            .consumption_for(&reading.account_id, reading.billing_period)
            .await?
            .unwrap_or(reading_units);

        let tariffs = self.store.tariffs().await?;
        let priced = self.calculator.price(units, &tariffs);
        if priced.used_fallback {
            tracing::warn!(
                account_id = %reading.account_id,
                period = %reading.billing_period,
                "No active tariff, pricing with fallback schedule"
            );
        }

        let mut bill = Bill::generate(
            reading.account_id.clone(),
            reading.billing_period,
            &priced.breakdown,
        )?;
        let existing = self
            .store
            .bill_for(&reading.account_id, reading.billing_period)
            .await?;
        if let Some(previous) = &existing {
            bill = bill.replacing(previous);
        }

        let replaced_bill = self.store.upsert_bill(&bill).await?;

        tracing::info!(
            account_id = %bill.account_id,
            period = %bill.period,
            bill_id = %bill.id,
            reading_units = %reading_units,
            units = %units,
            amount = %bill.amount,
            updated = replaced_bill.is_some(),
            "Bill generated"
        );

        Ok(ReadingOutcome {
            reading_units,
            units,
            bill,
            breakdown: priced.breakdown,
            replaced_reading,
            replaced_bill,
            used_fallback: priced.used_fallback,
        })
    }

    pub async fn consumption_limit(
        &self,
        ctx: &AccountContext,
        account_id: &str,
    ) -> Result<Option<ConsumptionLimit>> {
        ctx.require_access(account_id)?;
        Ok(self.store.consumption_limit(account_id).await?)
    }

    pub async fn set_consumption_limit(
        &self,
        ctx: &AccountContext,
        account_id: &str,
        limit: ConsumptionLimit,
    ) -> Result<ConsumptionLimit> {
        ctx.require_access(account_id)?;
        limit.validate()?;
        self.store.set_consumption_limit(account_id, &limit).await?;

        tracing::info!(
            account_id,
            monthly_limit = ?limit.monthly_limit,
            threshold_percent = limit.alert_threshold_percent,
            email_alerts = limit.email_alert_enabled,
            "Consumption limit saved"
        );
        Ok(limit)
    }

    /// Returns whether a limit existed.
    pub async fn clear_consumption_limit(
        &self,
        ctx: &AccountContext,
        account_id: &str,
    ) -> Result<bool> {
        ctx.require_access(account_id)?;
        let removed = self.store.delete_consumption_limit(account_id).await?;
        tracing::info!(account_id, removed, "Consumption limit cleared");
        Ok(removed)
    }

    /// Classifies the period's consumption against the account's limit and
    /// notifies when the limit asks for email alerts.
    ///
    /// Notification failures are reported in the returned check, never as an
    /// error.
    pub async fn check_consumption(
        &self,
        ctx: &AccountContext,
        account_id: &str,
        period: BillingPeriod,
    ) -> Result<ConsumptionCheck> {
        ctx.require_access(account_id)?;

        let limit = self.store.consumption_limit(account_id).await?;
        let current_usage = self
            .store
            .consumption_for(account_id, period)
            .await?
            .unwrap_or(Decimal::ZERO);
        let alert = classify(current_usage, limit.as_ref());

        let dispatch = match (&alert, &limit) {
            (Some(result), Some(limit)) if result.should_email(limit) => {
                let notification = AlertNotification {
                    account_id: account_id.to_string(),
                    recipient_email: ctx.email.clone().filter(|_| ctx.account_id == account_id),
                    recipient_name: ctx.name.clone().filter(|_| ctx.account_id == account_id),
                    period,
                    alert: result.clone(),
                };
                Some(self.dispatcher.dispatch(&notification).await)
            }
            _ => None,
        };

        if let Some(result) = &alert {
            tracing::debug!(
                account_id,
                period = %period,
                state = ?result.state,
                percentage_used = result.percentage_used,
                notified = dispatch.is_some(),
                "Consumption checked"
            );
        }

        Ok(ConsumptionCheck {
            current_usage,
            alert,
            dispatch,
        })
    }

    pub async fn bill(&self, ctx: &AccountContext, id: Uuid) -> Result<Bill> {
        let bill = self
            .store
            .bill(id)
            .await?
            .ok_or_else(|| StoreError::bill_not_found(id))?;
        ctx.require_access(&bill.account_id)?;
        Ok(bill)
    }

    pub async fn set_bill_status(
        &self,
        ctx: &AccountContext,
        id: Uuid,
        status: BillStatus,
    ) -> Result<Bill> {
        ctx.require_admin("changing a bill status")?;
        let bill = self.store.set_bill_status(id, status).await?;
        tracing::info!(bill_id = %id, status = %status, "Bill status updated");
        Ok(bill)
    }

    /// Marks a bill paid on behalf of its owner.
    pub async fn pay_bill(&self, ctx: &AccountContext, id: Uuid) -> Result<Bill> {
        let bill = self.bill(ctx, id).await?;
        if bill.is_paid() {
            return Err(BillingError::AlreadyPaid(id).into());
        }
        let bill = self.store.set_bill_status(id, BillStatus::Paid).await?;
        tracing::info!(
            bill_id = %id,
            account_id = %bill.account_id,
            amount = %bill.amount,
            "Bill paid"
        );
        Ok(bill)
    }

    /// An account's bills, newest period first.
    pub async fn bills_for(&self, ctx: &AccountContext, account_id: &str) -> Result<Vec<Bill>> {
        ctx.require_access(account_id)?;
        Ok(self.store.bills(Some(account_id)).await?)
    }

    pub async fn all_bills(&self, ctx: &AccountContext) -> Result<Vec<Bill>> {
        ctx.require_admin("listing all bills")?;
        Ok(self.store.bills(None).await?)
    }

    pub async fn summary(&self, ctx: &AccountContext) -> Result<BillingSummary> {
        let bills = self.all_bills(ctx).await?;
        Ok(BillingSummary::from_bills(&bills))
    }

    /// Like [`summary`](Self::summary), restricted to bills due within
    /// `from..=to`. Either bound may be left open.
    pub async fn summary_between(
        &self,
        ctx: &AccountContext,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<BillingSummary> {
        let bills = self.all_bills(ctx).await?;
        let summary = BillingSummary::from_bills(bills_due_between(&bills, from, to));
        tracing::debug!(
            from = ?from,
            to = ?to,
            total_bills = summary.total_bills,
            revenue = %summary.revenue,
            "Billing summary computed"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for BillingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingService")
            .field("store", &self.store.name())
            .field("dispatcher", &self.dispatcher)
            .field("settings", &self.settings)
            .finish()
    }
}
