use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BillingError, BillingPeriod};
use crate::account::AccountId;

/// A pair of cumulative meter readings for one account.
///
/// `reading_period` is the month the meter was read; `billing_period` is the
/// month the consumption is billed and alerted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReading {
    pub account_id: AccountId,
    pub reading_period: BillingPeriod,
    pub billing_period: BillingPeriod,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
}

impl MeterReading {
    pub fn new(
        account_id: impl Into<AccountId>,
        billing_period: BillingPeriod,
        previous_reading: Decimal,
        current_reading: Decimal,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            reading_period: billing_period,
            billing_period,
            previous_reading,
            current_reading,
        }
    }

    pub fn read_in(mut self, reading_period: BillingPeriod) -> Self {
        self.reading_period = reading_period;
        self
    }

    /// Units consumed between the two readings.
    ///
    /// A meter never runs backwards, so a current reading below the previous
    /// one is rejected here rather than priced.
    pub fn units_consumed(&self) -> Result<Decimal, BillingError> {
        let units = self.current_reading - self.previous_reading;
        if units < Decimal::ZERO {
            return Err(BillingError::NegativeConsumption {
                previous: self.previous_reading,
                current: self.current_reading,
            });
        }
        Ok(units)
    }
}
