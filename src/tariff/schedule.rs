//! Tariff schedule definition and admin-side validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    DEFAULT_BASE_FEE, DEFAULT_TIER1_RATE, DEFAULT_TIER1_UPPER_BOUND, DEFAULT_TIER2_RATE,
    DEFAULT_TIER2_UPPER_BOUND, DEFAULT_TIER3_RATE,
};

/// Reasons a schedule is rejected by [`TariffSchedule::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TariffError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },

    #[error("tier 1 upper bound ({tier1}) must be below tier 2 upper bound ({tier2})")]
    TierBoundsOutOfOrder { tier1: Decimal, tier2: Decimal },
}

/// A three-tier progressive tariff.
///
/// `tier2_upper_bound` is an absolute cumulative bound, not a width: with
/// bounds 100 and 300, tier 2 covers units 100..300.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffSchedule {
    pub base_fee: Decimal,
    pub tier1_upper_bound: Decimal,
    pub tier1_rate: Decimal,
    pub tier2_upper_bound: Decimal,
    pub tier2_rate: Decimal,
    pub tier3_rate: Decimal,
    pub effective_from: NaiveDate,
    pub is_active: bool,
}

impl TariffSchedule {
    pub fn builder() -> TariffScheduleBuilder {
        TariffScheduleBuilder::new()
    }

    /// The built-in schedule priced when no active schedule exists.
    pub fn fallback() -> Self {
        Self {
            base_fee: DEFAULT_BASE_FEE,
            tier1_upper_bound: DEFAULT_TIER1_UPPER_BOUND,
            tier1_rate: DEFAULT_TIER1_RATE,
            tier2_upper_bound: DEFAULT_TIER2_UPPER_BOUND,
            tier2_rate: DEFAULT_TIER2_RATE,
            tier3_rate: DEFAULT_TIER3_RATE,
            effective_from: NaiveDate::MIN,
            is_active: true,
        }
    }

    /// Width of tier 2, clamped at zero for misordered bounds.
    pub fn tier2_width(&self) -> Decimal {
        (self.tier2_upper_bound - self.tier1_upper_bound).max(Decimal::ZERO)
    }

    /// Checks the constraints an admin-entered schedule must satisfy.
    ///
    /// The calculator itself never calls this; it prices any schedule.
    pub fn validate(&self) -> Result<(), TariffError> {
        let amounts = [
            ("base_fee", self.base_fee),
            ("tier1_upper_bound", self.tier1_upper_bound),
            ("tier1_rate", self.tier1_rate),
            ("tier2_upper_bound", self.tier2_upper_bound),
            ("tier2_rate", self.tier2_rate),
            ("tier3_rate", self.tier3_rate),
        ];
        if let Some((field, value)) = amounts.into_iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(TariffError::Negative { field, value });
        }
        if self.tier1_upper_bound >= self.tier2_upper_bound {
            return Err(TariffError::TierBoundsOutOfOrder {
                tier1: self.tier1_upper_bound,
                tier2: self.tier2_upper_bound,
            });
        }
        Ok(())
    }
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Fluent construction of a [`TariffSchedule`], starting from the fallback values.
#[derive(Debug, Clone)]
pub struct TariffScheduleBuilder {
    schedule: TariffSchedule,
}

impl TariffScheduleBuilder {
    pub fn new() -> Self {
        Self {
            schedule: TariffSchedule::fallback(),
        }
    }

    pub fn base_fee(mut self, base_fee: Decimal) -> Self {
        self.schedule.base_fee = base_fee;
        self
    }

    pub fn tier1(mut self, upper_bound: Decimal, rate: Decimal) -> Self {
        self.schedule.tier1_upper_bound = upper_bound;
        self.schedule.tier1_rate = rate;
        self
    }

    pub fn tier2(mut self, upper_bound: Decimal, rate: Decimal) -> Self {
        self.schedule.tier2_upper_bound = upper_bound;
        self.schedule.tier2_rate = rate;
        self
    }

    pub fn tier3_rate(mut self, rate: Decimal) -> Self {
        self.schedule.tier3_rate = rate;
        self
    }

    pub fn effective_from(mut self, date: NaiveDate) -> Self {
        self.schedule.effective_from = date;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.schedule.is_active = is_active;
        self
    }

    pub fn build(self) -> TariffSchedule {
        self.schedule
    }

    pub fn build_validated(self) -> Result<TariffSchedule, TariffError> {
        self.schedule.validate()?;
        Ok(self.schedule)
    }
}

impl Default for TariffScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
