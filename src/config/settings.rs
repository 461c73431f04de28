//! Billing defaults resolved from configuration providers.

use rust_decimal::Decimal;

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigBuilder, ConfigError, ConfigResult};
use crate::alert::{
    AlertDispatcher, ConsumptionLimit, DEFAULT_ALERT_THRESHOLD_PERCENT,
    DEFAULT_NOTIFY_TIMEOUT_SECS, MAX_ALERT_THRESHOLD_PERCENT, MIN_ALERT_THRESHOLD_PERCENT,
};
use crate::tariff::{TariffCalculator, TariffSchedule};

/// Prefix for environment variables, e.g. `UTILITY_BILLING_TARIFF_BASE_FEE`.
pub const ENV_PREFIX: &str = "UTILITY_BILLING_";

const BASE_FEE: &str = "tariff.base_fee";
const TIER1_UPPER_BOUND: &str = "tariff.tier1_upper_bound";
const TIER1_RATE: &str = "tariff.tier1_rate";
const TIER2_UPPER_BOUND: &str = "tariff.tier2_upper_bound";
const TIER2_RATE: &str = "tariff.tier2_rate";
const TIER3_RATE: &str = "tariff.tier3_rate";
const DEFAULT_THRESHOLD: &str = "alerts.default_threshold_percent";
const NOTIFY_TIMEOUT: &str = "alerts.notify_timeout_secs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingSettings {
    /// Priced when no active schedule exists.
    pub fallback_tariff: TariffSchedule,
    /// Threshold given to limits created without an explicit one.
    pub default_threshold_percent: u8,
    pub notify_timeout_secs: u64,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            fallback_tariff: TariffSchedule::fallback(),
            default_threshold_percent: DEFAULT_ALERT_THRESHOLD_PERCENT,
            notify_timeout_secs: DEFAULT_NOTIFY_TIMEOUT_SECS,
        }
    }
}

impl BillingSettings {
    /// Resolves every key against `provider`, keeping the built-in default
    /// for anything unset.
    pub async fn load<P>(provider: &P) -> ConfigResult<Self>
    where
        P: ConfigProvider + ?Sized,
    {
        let defaults = TariffSchedule::fallback();
        let fallback_tariff = TariffSchedule {
            base_fee: decimal(provider, BASE_FEE, defaults.base_fee).await?,
            tier1_upper_bound: decimal(provider, TIER1_UPPER_BOUND, defaults.tier1_upper_bound)
                .await?,
            tier1_rate: decimal(provider, TIER1_RATE, defaults.tier1_rate).await?,
            tier2_upper_bound: decimal(provider, TIER2_UPPER_BOUND, defaults.tier2_upper_bound)
                .await?,
            tier2_rate: decimal(provider, TIER2_RATE, defaults.tier2_rate).await?,
            tier3_rate: decimal(provider, TIER3_RATE, defaults.tier3_rate).await?,
            ..defaults
        };
        fallback_tariff
            .validate()
            .map_err(|e| ConfigError::invalid("tariff", e.to_string()))?;

        let default_threshold_percent = provider
            .get_or(DEFAULT_THRESHOLD, DEFAULT_ALERT_THRESHOLD_PERCENT)
            .await?;
        if !(MIN_ALERT_THRESHOLD_PERCENT..=MAX_ALERT_THRESHOLD_PERCENT)
            .contains(&default_threshold_percent)
        {
            return Err(ConfigError::invalid(
                DEFAULT_THRESHOLD,
                format!(
                    "must be between {MIN_ALERT_THRESHOLD_PERCENT} and {MAX_ALERT_THRESHOLD_PERCENT} (got {default_threshold_percent})"
                ),
            ));
        }

        let notify_timeout_secs = provider
            .get_or(NOTIFY_TIMEOUT, DEFAULT_NOTIFY_TIMEOUT_SECS)
            .await?;
        if notify_timeout_secs == 0 {
            return Err(ConfigError::invalid(NOTIFY_TIMEOUT, "must be at least 1"));
        }

        tracing::debug!(
            provider = provider.name(),
            base_fee = %fallback_tariff.base_fee,
            default_threshold_percent,
            notify_timeout_secs,
            "Billing settings loaded"
        );

        Ok(Self {
            fallback_tariff,
            default_threshold_percent,
            notify_timeout_secs,
        })
    }

    /// Loads from `UTILITY_BILLING_*` environment variables only.
    pub async fn from_env() -> ConfigResult<Self> {
        Self::load(&ConfigBuilder::new().env().build()).await
    }

    pub fn calculator(&self) -> TariffCalculator {
        TariffCalculator::new(self.fallback_tariff.clone())
    }

    /// An empty dispatcher carrying the configured timeout.
    pub fn dispatcher(&self) -> AlertDispatcher {
        AlertDispatcher::with_timeout(self.notify_timeout_secs)
    }

    /// A limit using the configured default threshold.
    pub fn limit(&self, monthly_limit: Decimal) -> ConsumptionLimit {
        ConsumptionLimit::new(monthly_limit).with_threshold(self.default_threshold_percent)
    }
}

async fn decimal<P>(provider: &P, key: &str, default: Decimal) -> ConfigResult<Decimal>
where
    P: ConfigProvider + ?Sized,
{
    provider.get_or(key, default).await
}
