//! Normalization of loosely shaped backend rows.
//!
//! Hosted-database rows arrive as JSON objects whose column names drifted
//! over time (`amount` vs `total_amount`, `user_id` vs `account_id`) and
//! whose numbers may be encoded as strings. Each function here maps one such
//! row onto the canonical type; the first present, non-null alias wins.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::alert::{
    ConsumptionLimit, DEFAULT_ALERT_THRESHOLD_PERCENT, LimitError, MAX_ALERT_THRESHOLD_PERCENT,
    MIN_ALERT_THRESHOLD_PERCENT,
};
use crate::billing::{Bill, BillStatus, BillingPeriod, MeterReading};
use crate::tariff::TariffSchedule;

const BILL_ID: &[&str] = &["id", "bill_id"];
const ACCOUNT_ID: &[&str] = &["account_id", "user_id"];
const BILL_PERIOD: &[&str] = &["period", "month", "billing_month"];
const BILL_UNITS: &[&str] = &["units", "units_consumed", "total_units", "unitsConsumed"];
const BILL_AMOUNT: &[&str] = &["amount", "total_amount", "amt"];
const BILL_FIXED: &[&str] = &["fixed_charges", "base_fee"];
const BILL_DUE: &[&str] = &["due_date", "dueDate"];
const BILL_STATUS: &[&str] = &["status", "payment_status"];

/// Converts a bill row into a [`Bill`].
///
/// Missing numeric columns are treated as zero; a missing due date is derived
/// from the period; a missing status means pending.
pub fn bill_from_record(record: &Value) -> StoreResult<Bill> {
    const KIND: &str = "bill";
    ensure_object(KIND, record)?;

    let id = required_str(KIND, record, BILL_ID)?;
    let id = Uuid::parse_str(id)
        .map_err(|e| StoreError::malformed(KIND, format!("id '{id}': {e}")))?;
    let account_id = required_str(KIND, record, ACCOUNT_ID)?.to_string();
    let period = period_field(KIND, record, BILL_PERIOD)?;

    let due_date = match optional_str(KIND, record, BILL_DUE)? {
        Some(raw) => parse_date(KIND, raw)?,
        None => period
            .due_date()
            .ok_or_else(|| StoreError::malformed(KIND, format!("no due date for {period}")))?,
    };

    let status = match optional_str(KIND, record, BILL_STATUS)? {
        Some(raw) => raw
            .parse::<BillStatus>()
            .map_err(|e| StoreError::malformed(KIND, e.to_string()))?,
        None => BillStatus::Pending,
    };

    Ok(Bill {
        id,
        account_id,
        period,
        units: decimal_field(KIND, record, BILL_UNITS)?.unwrap_or_default(),
        fixed_charges: decimal_field(KIND, record, BILL_FIXED)?.unwrap_or_default(),
        amount: decimal_field(KIND, record, BILL_AMOUNT)?.unwrap_or_default(),
        due_date,
        status,
    })
}

/// Converts a tariff plan row into a [`TariffSchedule`].
///
/// Absent rate columns take the built-in fallback values. A row without an
/// `is_active` flag is treated as inactive.
pub fn tariff_from_record(record: &Value) -> StoreResult<TariffSchedule> {
    const KIND: &str = "tariff";
    ensure_object(KIND, record)?;

    let fallback = TariffSchedule::fallback();
    let effective_from = parse_date(KIND, required_str(KIND, record, &["effective_from"])?)?;

    Ok(TariffSchedule {
        base_fee: decimal_or(KIND, record, &["base_fee", "fixed_charge"], fallback.base_fee)?,
        tier1_upper_bound: decimal_or(
            KIND,
            record,
            &["tier1_upper_bound", "tier1_units_up_to"],
            fallback.tier1_upper_bound,
        )?,
        tier1_rate: decimal_or(KIND, record, &["tier1_rate"], fallback.tier1_rate)?,
        tier2_upper_bound: decimal_or(
            KIND,
            record,
            &["tier2_upper_bound", "tier2_units_up_to"],
            fallback.tier2_upper_bound,
        )?,
        tier2_rate: decimal_or(KIND, record, &["tier2_rate"], fallback.tier2_rate)?,
        tier3_rate: decimal_or(KIND, record, &["tier3_rate"], fallback.tier3_rate)?,
        effective_from,
        is_active: bool_field(KIND, record, &["is_active"])?.unwrap_or(false),
    })
}

/// Converts a consumption limit row into a [`ConsumptionLimit`].
///
/// A null `monthly_limit` stays absent; it is not coerced to zero. A zero
/// limit is kept as stored (it disables alerting), but negative limits and
/// thresholds outside the accepted range are rejected.
pub fn limit_from_record(record: &Value) -> StoreResult<ConsumptionLimit> {
    const KIND: &str = "consumption limit";
    ensure_object(KIND, record)?;

    const THRESHOLD: &[&str] = &["alert_threshold_percent", "alert_threshold"];
    let threshold = match decimal_field(KIND, record, THRESHOLD)? {
        Some(value) => value
            .fract()
            .is_zero()
            .then(|| value.to_u8())
            .flatten()
            .ok_or_else(|| StoreError::malformed(KIND, format!("alert threshold '{value}'")))?,
        None => DEFAULT_ALERT_THRESHOLD_PERCENT,
    };
    if !(MIN_ALERT_THRESHOLD_PERCENT..=MAX_ALERT_THRESHOLD_PERCENT).contains(&threshold) {
        return Err(StoreError::malformed(
            KIND,
            LimitError::ThresholdOutOfRange(threshold).to_string(),
        ));
    }

    let monthly_limit = decimal_field(KIND, record, &["monthly_limit"])?;
    if let Some(limit) = monthly_limit
        && limit < Decimal::ZERO
    {
        return Err(StoreError::malformed(
            KIND,
            LimitError::NonPositiveLimit(limit).to_string(),
        ));
    }

    Ok(ConsumptionLimit {
        monthly_limit,
        alert_threshold_percent: threshold,
        email_alert_enabled: bool_field(KIND, record, &["email_alert_enabled", "email_alert"])?
            .unwrap_or(true),
    })
}

/// Converts a consumption row into a [`MeterReading`].
pub fn reading_from_record(record: &Value) -> StoreResult<MeterReading> {
    const KIND: &str = "reading";
    ensure_object(KIND, record)?;

    let account_id = required_str(KIND, record, ACCOUNT_ID)?.to_string();
    let billing_period = period_field(KIND, record, &["billing_period", "billing_month"])?;
    let reading_period = match optional_str(KIND, record, &["reading_period", "month"])? {
        Some(raw) => parse_period(KIND, raw)?,
        None => billing_period,
    };
    let current_reading = decimal_field(KIND, record, &["current_reading", "units"])?
        .ok_or_else(|| StoreError::malformed(KIND, "missing current reading"))?;
    let previous_reading = match decimal_field(KIND, record, &["previous_reading"])? {
        Some(previous) => previous,
        None => {
            let consumed = decimal_field(KIND, record, &["units_consumed"])?
                .ok_or_else(|| StoreError::malformed(KIND, "missing previous reading"))?;
            current_reading - consumed
        }
    };

    Ok(MeterReading {
        account_id,
        reading_period,
        billing_period,
        previous_reading,
        current_reading,
    })
}

fn ensure_object(kind: &'static str, record: &Value) -> StoreResult<()> {
    if record.is_object() {
        Ok(())
    } else {
        Err(StoreError::malformed(kind, "expected a JSON object"))
    }
}

fn field<'a>(
    record: &'a Value,
    names: &'static [&'static str],
) -> Option<(&'static str, &'a Value)> {
    let object = record.as_object()?;
    names.iter().find_map(|name| {
        object
            .get(*name)
            .filter(|v| !v.is_null())
            .map(|v| (*name, v))
    })
}

fn decimal_or(
    kind: &'static str,
    record: &Value,
    names: &'static [&'static str],
    default: Decimal,
) -> StoreResult<Decimal> {
    decimal_field(kind, record, names).map(|v| v.unwrap_or(default))
}

fn optional_str<'a>(
    kind: &'static str,
    record: &'a Value,
    names: &'static [&'static str],
) -> StoreResult<Option<&'a str>> {
    match field(record, names) {
        None => Ok(None),
        Some((_, Value::String(s))) if s.trim().is_empty() => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(s.trim())),
        Some((name, other)) => Err(StoreError::malformed(
            kind,
            format!("{name} should be a string, got {other}"),
        )),
    }
}

fn required_str<'a>(
    kind: &'static str,
    record: &'a Value,
    names: &'static [&'static str],
) -> StoreResult<&'a str> {
    optional_str(kind, record, names)?
        .ok_or_else(|| StoreError::malformed(kind, format!("missing {}", names.join(" | "))))
}

fn decimal_field(
    kind: &'static str,
    record: &Value,
    names: &'static [&'static str],
) -> StoreResult<Option<Decimal>> {
    let Some((name, value)) = field(record, names) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw))
        }
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => Decimal::from_str(s.trim()),
        other => {
            return Err(StoreError::malformed(
                kind,
                format!("{name} should be numeric, got {other}"),
            ));
        }
    };
    parsed
        .map(Some)
        .map_err(|e| StoreError::malformed(kind, format!("{name}: {e}")))
}

fn bool_field(
    kind: &'static str,
    record: &Value,
    names: &'static [&'static str],
) -> StoreResult<Option<bool>> {
    match field(record, names) {
        None => Ok(None),
        Some((_, Value::Bool(b))) => Ok(Some(*b)),
        Some((_, Value::String(s))) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(StoreError::malformed(kind, format!("'{s}' is not a boolean"))),
        },
        Some((name, other)) => Err(StoreError::malformed(
            kind,
            format!("{name} should be a boolean, got {other}"),
        )),
    }
}

fn period_field(
    kind: &'static str,
    record: &Value,
    names: &'static [&'static str],
) -> StoreResult<BillingPeriod> {
    parse_period(kind, required_str(kind, record, names)?)
}

fn parse_period(kind: &'static str, raw: &str) -> StoreResult<BillingPeriod> {
    // Some rows carry a full date where a month was meant.
    let month = raw.get(..7).filter(|_| raw.len() > 7).unwrap_or(raw);
    month
        .parse()
        .map_err(|e: crate::billing::BillingError| StoreError::malformed(kind, e.to_string()))
}

fn parse_date(kind: &'static str, raw: &str) -> StoreResult<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| StoreError::malformed(kind, format!("date '{raw}': {e}")))
}
