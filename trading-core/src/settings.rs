//! Layered gateway configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! configuration file (any format the `config` crate understands) and
//! `XTP_GATEWAY__*` environment variables, with `__` separating nested keys
//! (e.g. `XTP_GATEWAY__QUOTE__PORT=6002`).

use crate::scheduler::TradingWindows;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "XTP_GATEWAY";

/// Config-store key consulted when the market-data feed drops.
pub const DEFAULT_AUTO_RECONNECT_KEY: &str = "re_auto_login_xtp";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Tcp,
    Udp,
}

/// When the registry is replayed (drain then refill) after a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubscribePolicy {
    Always,
    TcpOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    pub host: String,
    pub port: u16,
    pub protocol: TransportProtocol,
    pub heartbeat_secs: u32,
    pub udp_buffer_mb: u32,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6002,
            protocol: TransportProtocol::Tcp,
            heartbeat_secs: 30,
            udp_buffer_mb: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderSettings {
    pub host: String,
    pub port: u16,
}

impl Default for TraderSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    pub delay_ms: u64,
    pub resubscribe: ResubscribePolicy,
    pub policy_key: String,
    /// Startup value for `policy_key` in the config store; unset allows reconnects.
    pub auto_login: Option<String>,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            delay_ms: 3_000,
            resubscribe: ResubscribePolicy::Always,
            policy_key: DEFAULT_AUTO_RECONNECT_KEY.to_string(),
            auto_login: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_ms: u64,
    pub threshold: u32,
    pub windows: TradingWindows,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            threshold: 2,
            windows: TradingWindows::default(),
        }
    }
}

/// Everything a gateway process needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub account_id: String,
    pub password: String,
    pub client_id: u8,
    pub software_key: String,
    pub local_ip: String,
    /// Vendor SDK log level: FATAL, ERROR, WARNING, INFO, DEBUG or TRACE.
    pub vendor_log_level: String,
    pub quote: QuoteSettings,
    pub trader: TraderSettings,
    pub reconnect: ReconnectSettings,
    pub scheduler: SchedulerSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            password: String::new(),
            client_id: 1,
            software_key: String::new(),
            local_ip: "127.0.0.1".to_string(),
            vendor_log_level: "INFO".to_string(),
            quote: QuoteSettings::default(),
            trader: TraderSettings::default(),
            reconnect: ReconnectSettings::default(),
            scheduler: SchedulerSettings::default(),
        }
    }
}

impl GatewaySettings {
    /// Loads settings from `path` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// * [`SettingsError::Config`] if the file is missing or a value fails to parse.
    /// * [`SettingsError::Invalid`] if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings: GatewaySettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.reconnect.delay_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "reconnect.delay_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.scheduler.interval_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "scheduler.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.scheduler.threshold == 0 {
            return Err(SettingsError::Invalid {
                field: "scheduler.threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect.delay_ms)
    }

    pub fn timer_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.quote.heartbeat_secs, 30);
        assert_eq!(settings.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(settings.scheduler.threshold, 2);
        assert_eq!(settings.reconnect.policy_key, "re_auto_login_xtp");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_keeps_unset_defaults() {
        let dir = std::env::temp_dir().join(format!("gateway-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "account_id = \"253191001\"\nclient_id = 7\n\n[quote]\nprotocol = \"udp\"\nport = 6003\n\n[reconnect]\nresubscribe = \"tcp_only\"\nauto_login = \"N\""
        )
        .unwrap();

        let settings = GatewaySettings::load(Some(&path)).unwrap();
        assert_eq!(settings.account_id, "253191001");
        assert_eq!(settings.client_id, 7);
        assert_eq!(settings.quote.protocol, TransportProtocol::Udp);
        assert_eq!(settings.quote.port, 6003);
        assert_eq!(settings.quote.heartbeat_secs, 30);
        assert_eq!(settings.reconnect.resubscribe, ResubscribePolicy::TcpOnly);
        assert_eq!(settings.reconnect.auto_login.as_deref(), Some("N"));
        assert_eq!(settings.scheduler.windows, TradingWindows::default());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("does-not-exist-gateway.toml");
        assert!(matches!(
            GatewaySettings::load(Some(&missing)),
            Err(SettingsError::Config(_))
        ));
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let mut settings = GatewaySettings::default();
        settings.scheduler.threshold = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "scheduler.threshold", .. })
        ));
    }
}
