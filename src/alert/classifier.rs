use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::limit::{ConsumptionLimit, threshold_level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    None,
    Warning,
    Exceeded,
}

impl AlertState {
    /// Classifies `current_usage` against a non-zero `limit`.
    pub fn evaluate(current_usage: Decimal, limit: Decimal, threshold_percent: u8) -> Self {
        let warning_level = threshold_level(limit, threshold_percent);
        if current_usage > limit {
            Self::Exceeded
        } else if current_usage > warning_level {
            Self::Warning
        } else {
            Self::None
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertResult {
    pub state: AlertState,
    pub current_usage: Decimal,
    pub limit: Decimal,
    /// `round(current_usage / limit * 100)`.
    pub percentage_used: i64,
}

impl AlertResult {
    pub fn is_exceeded(&self) -> bool {
        self.state == AlertState::Exceeded
    }

    pub fn is_warning(&self) -> bool {
        self.state == AlertState::Warning
    }

    /// Units over the limit; display-only.
    pub fn exceeded_by(&self) -> Option<Decimal> {
        self.is_exceeded()
            .then(|| self.current_usage.saturating_sub(self.limit))
    }

    /// Overage as a rounded percentage of the limit; display-only.
    pub fn exceeded_by_percent(&self) -> Option<i64> {
        self.exceeded_by().map(|over| percent_of(over, self.limit))
    }

    /// Whether an email should go out for this result under `limit`'s preferences.
    pub fn should_email(&self, limit: &ConsumptionLimit) -> bool {
        self.state.is_alert() && limit.email_alert_enabled
    }
}

/// Classifies usage for the current period against an optional limit.
///
/// Returns `None` when no limit is configured (absent or zero) or when usage
/// is at or below the alert threshold.
pub fn classify(current_usage: Decimal, limit: Option<&ConsumptionLimit>) -> Option<AlertResult> {
    let config = limit?;
    let monthly_limit = config.effective_limit()?;

    let state = AlertState::evaluate(current_usage, monthly_limit, config.alert_threshold_percent);
    if !state.is_alert() {
        return None;
    }

    Some(AlertResult {
        state,
        current_usage,
        limit: monthly_limit,
        percentage_used: percent_of(current_usage, monthly_limit),
    })
}

fn percent_of(part: Decimal, whole: Decimal) -> i64 {
    part.checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole))
        .and_then(|ratio| {
            ratio
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(i64::MAX)
}
