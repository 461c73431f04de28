use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BillingError, BillingPeriod};
use crate::account::AccountId;
use crate::tariff::BillBreakdown;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillStatus {
    #[default]
    Pending,
    Paid,
}

impl BillStatus {
    pub fn toggled(&self) -> Self {
        match self {
            Self::Pending => Self::Paid,
            Self::Paid => Self::Pending,
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Paid => f.write_str("Paid"),
        }
    }
}

impl FromStr for BillStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "unpaid" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(BillingError::InvalidStatus(s.to_string())),
        }
    }
}

/// The canonical bill record for one account and billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub account_id: AccountId,
    pub period: BillingPeriod,
    pub units: Decimal,
    /// Base fee portion of `amount`.
    pub fixed_charges: Decimal,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: BillStatus,
}

impl Bill {
    /// A new pending bill for a priced quantity, due per [`BillingPeriod::due_date`].
    pub fn generate(
        account_id: impl Into<AccountId>,
        period: BillingPeriod,
        breakdown: &BillBreakdown,
    ) -> Result<Self, BillingError> {
        let due_date = period
            .due_date()
            .ok_or_else(|| BillingError::InvalidPeriod(period.to_string()))?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            period,
            units: breakdown.billed_units(),
            fixed_charges: breakdown.base_fee,
            amount: breakdown.total,
            due_date,
            status: BillStatus::Pending,
        })
    }

    /// Carries identity over from an earlier bill for the same account and period.
    pub fn replacing(mut self, previous: &Bill) -> Self {
        self.id = previous.id;
        self
    }

    pub fn usage_charges(&self) -> Decimal {
        self.amount.saturating_sub(self.fixed_charges)
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillStatus::Paid
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid() && today > self.due_date
    }
}
