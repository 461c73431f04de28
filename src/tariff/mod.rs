//! Tiered tariff schedules and bill pricing.
//!
//! A [`TariffSchedule`] charges a flat base fee plus three progressive tiers.
//! Units fill tier 1 first, then tier 2 up to its absolute upper bound, and
//! everything above that is billed at the tier 3 rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod calculator;
mod schedule;
mod selection;

pub use calculator::{
    BillBreakdown, PricedUsage, TariffCalculator, Tier, TierCharge, compute_bill,
    compute_breakdown, round_currency,
};
pub use schedule::{TariffError, TariffSchedule, TariffScheduleBuilder};
pub use selection::{select_active, select_active_as_of};

/// Base fee of the built-in schedule used when no schedule is active.
pub const DEFAULT_BASE_FEE: Decimal = dec!(50);
/// Upper bound (in units) of tier 1 for the built-in schedule.
pub const DEFAULT_TIER1_UPPER_BOUND: Decimal = dec!(100);
pub const DEFAULT_TIER1_RATE: Decimal = dec!(5);
/// Absolute upper bound (in units) of tier 2 for the built-in schedule.
pub const DEFAULT_TIER2_UPPER_BOUND: Decimal = dec!(300);
pub const DEFAULT_TIER2_RATE: Decimal = dec!(7.5);
pub const DEFAULT_TIER3_RATE: Decimal = dec!(9);

/// Decimal places kept on billed amounts.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;
