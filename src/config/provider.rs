//! Configuration Provider Trait

use std::fmt::Display;
use std::str::FromStr;

use super::{ConfigError, ConfigResult};

/// A read-only source of configuration values keyed by dotted names such as
/// `tariff.base_fee`.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Get a raw configuration value
    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;
}

/// Typed access on top of [`ConfigProvider::get_raw`].
pub trait ConfigProviderExt: ConfigProvider {
    /// Parses a value with its [`FromStr`] impl, so decimals stay exact.
    fn get_parsed<T>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        T: FromStr + Send,
        T::Err: Display,
        Self: Sync,
    {
        async move {
            match self.get_raw(key).await? {
                Some(raw) => raw
                    .trim()
                    .parse::<T>()
                    .map(Some)
                    .map_err(|e| ConfigError::invalid(key, format!("'{raw}': {e}"))),
                None => Ok(None),
            }
        }
    }

    /// Like [`get_parsed`](Self::get_parsed) with a default for missing keys.
    fn get_or<T>(
        &self,
        key: &str,
        default: T,
    ) -> impl std::future::Future<Output = ConfigResult<T>> + Send
    where
        T: FromStr + Send,
        T::Err: Display,
        Self: Sync,
    {
        async move { Ok(self.get_parsed(key).await?.unwrap_or(default)) }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}
