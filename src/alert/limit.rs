use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ALERT_THRESHOLD_PERCENT: u8 = 80;
pub const MIN_ALERT_THRESHOLD_PERCENT: u8 = 50;
pub const MAX_ALERT_THRESHOLD_PERCENT: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("Monthly limit must be greater than 0 (got {0})")]
    NonPositiveLimit(Decimal),

    #[error("Alert threshold must be between 50% and 100% (got {0}%)")]
    ThresholdOutOfRange(u8),
}

/// Per-account monthly consumption limit.
///
/// A missing `monthly_limit` is a distinct state from zero only at the storage
/// boundary; both disable alerting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionLimit {
    pub monthly_limit: Option<Decimal>,
    pub alert_threshold_percent: u8,
    pub email_alert_enabled: bool,
}

impl ConsumptionLimit {
    pub fn new(monthly_limit: Decimal) -> Self {
        Self {
            monthly_limit: Some(monthly_limit),
            ..Default::default()
        }
    }

    /// A record with no limit configured.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, percent: u8) -> Self {
        self.alert_threshold_percent = percent;
        self
    }

    pub fn with_email_alerts(mut self, enabled: bool) -> Self {
        self.email_alert_enabled = enabled;
        self
    }

    /// The limit when alerting applies, i.e. present and non-zero.
    pub fn effective_limit(&self) -> Option<Decimal> {
        self.monthly_limit.filter(|l| !l.is_zero())
    }

    /// Usage above which a warning fires.
    pub fn warning_level(&self) -> Option<Decimal> {
        self.effective_limit()
            .map(|l| threshold_level(l, self.alert_threshold_percent))
    }

    pub fn validate(&self) -> Result<(), LimitError> {
        if let Some(limit) = self.monthly_limit
            && limit <= Decimal::ZERO
        {
            return Err(LimitError::NonPositiveLimit(limit));
        }
        if !(MIN_ALERT_THRESHOLD_PERCENT..=MAX_ALERT_THRESHOLD_PERCENT)
            .contains(&self.alert_threshold_percent)
        {
            return Err(LimitError::ThresholdOutOfRange(self.alert_threshold_percent));
        }
        Ok(())
    }
}

/// `limit * threshold_percent / 100`, saturating at [`Decimal::MAX`].
pub(crate) fn threshold_level(limit: Decimal, threshold_percent: u8) -> Decimal {
    let threshold = Decimal::from(threshold_percent);
    limit
        .checked_mul(threshold)
        .map(|scaled| scaled / Decimal::ONE_HUNDRED)
        .unwrap_or_else(|| (limit / Decimal::ONE_HUNDRED).saturating_mul(threshold))
}

impl Default for ConsumptionLimit {
    fn default() -> Self {
        Self {
            monthly_limit: None,
            alert_threshold_percent: DEFAULT_ALERT_THRESHOLD_PERCENT,
            email_alert_enabled: true,
        }
    }
}
