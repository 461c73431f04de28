//! Progressive tier pricing.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::CURRENCY_DECIMAL_PLACES;
use super::schedule::TariffSchedule;
use super::selection::{select_active, select_active_as_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

/// Units allocated to a single tier and what they cost.
///
/// `amount` is exact; rounding happens only on [`BillBreakdown::total`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCharge {
    pub tier: Tier,
    pub units: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Itemized result of pricing a consumption quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillBreakdown {
    pub base_fee: Decimal,
    /// Always three entries, tier 1 first. Unused tiers carry zero units.
    pub tiers: Vec<TierCharge>,
    /// Billed amount at currency precision.
    pub total: Decimal,
}

impl BillBreakdown {
    /// Units that were priced (negative input counts as zero).
    pub fn billed_units(&self) -> Decimal {
        self.tiers.iter().map(|t| t.units).sum()
    }

    /// Usage charges excluding the base fee, at currency precision.
    pub fn usage_charges(&self) -> Decimal {
        round_currency(
            self.tiers
                .iter()
                .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount)),
        )
    }

    pub fn tier(&self, tier: Tier) -> Option<&TierCharge> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

/// Rounds an amount to currency precision, midpoints away from zero, and
/// pads the scale so `50` renders as `50.00`.
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded = amount
        .round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_DECIMAL_PLACES);
    rounded
}

/// Prices `units_consumed` against `schedule`, itemized per tier.
///
/// Arithmetic saturates at [`Decimal::MAX`] instead of overflowing.
pub fn compute_breakdown(units_consumed: Decimal, schedule: &TariffSchedule) -> BillBreakdown {
    let mut remaining = units_consumed.max(Decimal::ZERO);
    let mut cost = schedule.base_fee;
    let mut tiers = Vec::with_capacity(3);

    let bounded = [
        (
            Tier::Tier1,
            schedule.tier1_upper_bound.max(Decimal::ZERO),
            schedule.tier1_rate,
        ),
        (Tier::Tier2, schedule.tier2_width(), schedule.tier2_rate),
    ];

    for (tier, width, rate) in bounded {
        let used = remaining.min(width);
        let amount = used.saturating_mul(rate);
        cost = cost.saturating_add(amount);
        remaining -= used;
        tiers.push(TierCharge {
            tier,
            units: used,
            rate,
            amount,
        });
    }

    let amount = remaining.saturating_mul(schedule.tier3_rate);
    cost = cost.saturating_add(amount);
    tiers.push(TierCharge {
        tier: Tier::Tier3,
        units: remaining,
        rate: schedule.tier3_rate,
        amount,
    });

    BillBreakdown {
        base_fee: schedule.base_fee,
        tiers,
        total: round_currency(cost),
    }
}

/// Billed amount for `units_consumed` under `schedule`.
///
/// Total over its domain: zero units yields the base fee, negative units are
/// charged nothing beyond the base fee.
pub fn compute_bill(units_consumed: Decimal, schedule: &TariffSchedule) -> Decimal {
    compute_breakdown(units_consumed, schedule).total
}

/// A priced quantity together with the schedule that priced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedUsage {
    pub breakdown: BillBreakdown,
    pub schedule: TariffSchedule,
    pub used_fallback: bool,
}

impl PricedUsage {
    pub fn amount(&self) -> Decimal {
        self.breakdown.total
    }
}

/// Selects the governing schedule from a set of candidates and prices usage with it.
#[derive(Debug, Clone, Default)]
pub struct TariffCalculator {
    fallback: TariffSchedule,
}

impl TariffCalculator {
    pub fn new(fallback: TariffSchedule) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &TariffSchedule {
        &self.fallback
    }

    pub fn price(&self, units_consumed: Decimal, schedules: &[TariffSchedule]) -> PricedUsage {
        self.price_with(units_consumed, select_active(schedules))
    }

    /// Like [`price`](Self::price) but ignores schedules that take effect after `date`.
    pub fn price_as_of(
        &self,
        units_consumed: Decimal,
        schedules: &[TariffSchedule],
        date: NaiveDate,
    ) -> PricedUsage {
        self.price_with(units_consumed, select_active_as_of(schedules, date))
    }

    fn price_with(&self, units_consumed: Decimal, selected: Option<&TariffSchedule>) -> PricedUsage {
        let used_fallback = selected.is_none();
        let schedule = selected.unwrap_or(&self.fallback).clone();
        let breakdown = compute_breakdown(units_consumed, &schedule);

        tracing::debug!(
            units = %units_consumed,
            effective_from = %schedule.effective_from,
            used_fallback,
            total = %breakdown.total,
            "Priced consumption"
        );

        PricedUsage {
            breakdown,
            schedule,
            used_fallback,
        }
    }
}
