//! Settings derived once from the resolved static configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use crate::polling::PollingStrategy;
use crate::remote::DEFAULT_FETCH_TIMEOUT;

pub const DYNAMIC_ENABLED: &str = "config.dynamic.enabled";
pub const DYNAMIC_URL: &str = "config.dynamic.url";
pub const DYNAMIC_POLLING_INTERVAL: &str = "config.dynamic.polling-interval";
pub const DYNAMIC_SYNC_INIT: &str = "config.dynamic.sync-init";
pub const DYNAMIC_FETCH_TIMEOUT: &str = "config.dynamic.fetch-timeout";

pub const ADMIN_PORT: &str = "config.admin.port";
pub const ADMIN_BACKLOG: &str = "config.admin.backlog";
pub const ADMIN_SHUTDOWN_DELAY: &str = "config.admin.shutdown-delay";
pub const ADMIN_UI_LOCATION: &str = "config.admin.ui-location";

const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_UI_LOCATION: &str = "/ui";

/// Parses `30s`, `5m`, `500ms` and the like. A bare integer is milliseconds.
pub fn parse_duration(value: &str) -> std::result::Result<Duration, String> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }
    humantime::parse_duration(value).map_err(|err| err.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

fn bool_or(layer: &ConfigLayer, key: &str, default: bool) -> Result<bool> {
    layer.get(key).map_or(Ok(default), |v| parse_bool(key, v))
}

fn duration_value(key: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|message| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    })
}

fn duration_or(layer: &ConfigLayer, key: &str, default: Duration) -> Result<Duration> {
    layer.get(key).map_or(Ok(default), |v| duration_value(key, v))
}

fn required<'a>(layer: &'a ConfigLayer, key: &str) -> Result<&'a str> {
    layer.get(key).ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })
}

fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// How the dynamic layer should run, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicSettings {
    Disabled,
    Enabled {
        url: Url,
        strategy: PollingStrategy,
        fetch_timeout: Duration,
    },
}

impl DynamicSettings {
    /// Read the dynamic layer properties. The URL is only required when the
    /// layer is enabled.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        if !bool_or(layer, DYNAMIC_ENABLED, false)? {
            return Ok(DynamicSettings::Disabled);
        }

        let raw_url = required(layer, DYNAMIC_URL)?;
        let url = Url::parse(raw_url).map_err(|e| ConfigError::InvalidValue {
            key: DYNAMIC_URL.to_string(),
            message: e.to_string(),
        })?;

        let interval = duration_or(layer, DYNAMIC_POLLING_INTERVAL, DEFAULT_POLLING_INTERVAL)?;
        let sync_init = bool_or(layer, DYNAMIC_SYNC_INIT, true)?;
        let strategy =
            PollingStrategy::new(interval, sync_init).map_err(|_| ConfigError::InvalidValue {
                key: DYNAMIC_POLLING_INTERVAL.to_string(),
                message: "interval must be positive".to_string(),
            })?;

        Ok(DynamicSettings::Enabled {
            url,
            strategy,
            fetch_timeout: duration_or(layer, DYNAMIC_FETCH_TIMEOUT, DEFAULT_FETCH_TIMEOUT)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, DynamicSettings::Enabled { .. })
    }
}

/// Settings for the admin surface that renders the merged view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSettings {
    pub port: u16,
    pub backlog: u32,
    pub shutdown_delay: Duration,
    pub ui_location: String,
}

impl AdminSettings {
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        Ok(Self {
            port: number(ADMIN_PORT, required(layer, ADMIN_PORT)?)?,
            backlog: number(ADMIN_BACKLOG, required(layer, ADMIN_BACKLOG)?)?,
            shutdown_delay: duration_value(
                ADMIN_SHUTDOWN_DELAY,
                required(layer, ADMIN_SHUTDOWN_DELAY)?,
            )?,
            ui_location: layer
                .get(ADMIN_UI_LOCATION)
                .unwrap_or(DEFAULT_UI_LOCATION)
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{PropertyMap, SourceOrigin};

    fn layer(pairs: &[(&str, &str)]) -> ConfigLayer {
        let values: PropertyMap = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLayer::new("test", SourceOrigin::Resource, values, None)
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_dynamic_disabled_by_default() {
        let settings = DynamicSettings::from_layer(&layer(&[])).unwrap();
        assert_eq!(settings, DynamicSettings::Disabled);
        assert!(!settings.is_enabled());
    }

    #[test]
    fn test_dynamic_enabled() {
        let settings = DynamicSettings::from_layer(&layer(&[
            (DYNAMIC_ENABLED, "true"),
            (DYNAMIC_URL, "http://props.internal/v1/props"),
            (DYNAMIC_POLLING_INTERVAL, "15s"),
            (DYNAMIC_SYNC_INIT, "false"),
        ]))
        .unwrap();

        match settings {
            DynamicSettings::Enabled {
                url,
                strategy,
                fetch_timeout,
            } => {
                assert_eq!(url.as_str(), "http://props.internal/v1/props");
                assert_eq!(strategy.interval(), Duration::from_secs(15));
                assert!(!strategy.sync_init());
                assert_eq!(fetch_timeout, DEFAULT_FETCH_TIMEOUT);
            }
            DynamicSettings::Disabled => panic!("expected enabled settings"),
        }
    }

    #[test]
    fn test_dynamic_enabled_requires_url() {
        let err = DynamicSettings::from_layer(&layer(&[(DYNAMIC_ENABLED, "true")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key } if key == DYNAMIC_URL));

        let err = DynamicSettings::from_layer(&layer(&[
            (DYNAMIC_ENABLED, "true"),
            (DYNAMIC_URL, "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == DYNAMIC_URL));
    }

    #[test]
    fn test_invalid_values() {
        let err = DynamicSettings::from_layer(&layer(&[(DYNAMIC_ENABLED, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = DynamicSettings::from_layer(&layer(&[
            (DYNAMIC_ENABLED, "true"),
            (DYNAMIC_URL, "http://localhost/props"),
            (DYNAMIC_POLLING_INTERVAL, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == DYNAMIC_POLLING_INTERVAL
        ));
    }

    #[test]
    fn test_admin_settings() {
        let settings = AdminSettings::from_layer(&layer(&[
            (ADMIN_PORT, "8077"),
            (ADMIN_BACKLOG, "10"),
            (ADMIN_SHUTDOWN_DELAY, "2s"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 8077);
        assert_eq!(settings.backlog, 10);
        assert_eq!(settings.shutdown_delay, Duration::from_secs(2));
        assert_eq!(settings.ui_location, "/ui");

        let err = AdminSettings::from_layer(&layer(&[(ADMIN_PORT, "70000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ADMIN_PORT));
    }
}
