use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Bill, BillingPeriod};

/// Portfolio-level totals over a set of bills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub total_bills: usize,
    pub paid: usize,
    pub pending: usize,
    /// Sum of all billed amounts.
    pub revenue: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
}

impl BillingSummary {
    pub fn from_bills<'a>(bills: impl IntoIterator<Item = &'a Bill>) -> Self {
        bills.into_iter().fold(Self::default(), |mut acc, bill| {
            acc.total_bills += 1;
            acc.revenue += bill.amount;
            if bill.is_paid() {
                acc.paid += 1;
                acc.collected += bill.amount;
            } else {
                acc.pending += 1;
                acc.outstanding += bill.amount;
            }
            acc
        })
    }
}

/// Bills whose due date falls within `from..=to`; an absent bound is open.
pub fn bills_due_between<'a>(
    bills: impl IntoIterator<Item = &'a Bill>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> impl Iterator<Item = &'a Bill> {
    bills.into_iter().filter(move |bill| {
        from.is_none_or(|from| bill.due_date >= from) && to.is_none_or(|to| bill.due_date <= to)
    })
}

/// Billed amount per period, oldest first.
pub fn revenue_by_period<'a>(
    bills: impl IntoIterator<Item = &'a Bill>,
) -> BTreeMap<BillingPeriod, Decimal> {
    let mut totals = BTreeMap::new();
    for bill in bills {
        *totals.entry(bill.period).or_insert(Decimal::ZERO) += bill.amount;
    }
    totals
}
