use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

/// Construction parameters of a [`ManagedTicker`](crate::ManagedTicker), e.g.
/// `{ "period_ms": 500, "tick_on_init": true }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TickerConfig {
    pub period_ms: u64,
    #[serde(default)]
    pub tick_on_init: bool,
}

impl TickerConfig {
    pub fn new(period: Duration, tick_on_init: bool) -> Self {
        Self {
            period_ms: u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            tick_on_init,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.period_ms == 0 {
            return Err(Error::InvalidPeriod);
        }
        Ok(())
    }

    pub fn from_json(json: &[u8]) -> Result<Self, Error> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_json(&tokio::fs::read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json() {
        let config = TickerConfig::from_json(br#"{ "period_ms": 250, "tick_on_init": true }"#)
            .unwrap();
        assert_eq!(config.period(), Duration::from_millis(250));
        assert!(config.tick_on_init);
    }

    #[test]
    fn tick_on_init_defaults_to_false() {
        let config = TickerConfig::from_json(br#"{ "period_ms": 10 }"#).unwrap();
        assert_eq!(config, TickerConfig::new(Duration::from_millis(10), false));
    }

    #[test]
    fn rejects_zero_period() {
        let err = TickerConfig::from_json(br#"{ "period_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidPeriod));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = TickerConfig::from_json(br#"{ "period_ms": 5, "period": 5 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn missing_file() {
        let err = TickerConfig::load("./does-not-exist.json").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
