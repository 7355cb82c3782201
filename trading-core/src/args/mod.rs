//! Command-line arguments of a gateway process.
//!
//! Only what differs per invocation lives here; everything else is read
//! through [`crate::settings::GatewaySettings`].

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading::{ContractKey, ModelError};

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct GatewayArgs {
    /// Path to the gateway configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Contracts to subscribe at startup, as SYMBOL.EXCHANGE (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    subscribe: Vec<String>,

    /// Subscribe to the whole market instead of a list
    #[arg(long, default_value_t = false)]
    subscribe_all: bool,

    /// JSON file holding contract metadata
    #[arg(long)]
    contracts: Option<PathBuf>,

    /// Log filter handed to env_logger
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl GatewayArgs {
    /// Parses arguments from an explicit list, the first item being the program name.
    pub fn parse_args(args: Vec<String>) -> Self {
        GatewayArgs::parse_from(args)
    }

    pub fn get_config_path(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    pub fn get_contracts_path(&self) -> Option<PathBuf> {
        self.contracts.clone()
    }

    pub fn get_log_level(&self) -> &str {
        &self.log_level
    }

    pub fn subscribe_all(&self) -> bool {
        self.subscribe_all
    }

    /// Parses the `--subscribe` list.
    pub fn get_subscriptions(&self) -> Result<Vec<ContractKey>, ModelError> {
        self.subscribe.iter().map(|raw| raw.trim().parse()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading::Exchange;

    fn args(list: &[&str]) -> GatewayArgs {
        GatewayArgs::parse_args(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_defaults() {
        let parsed = args(&["broker-gateway"]);
        assert_eq!(parsed.get_config_path(), None);
        assert_eq!(parsed.get_log_level(), "info");
        assert!(!parsed.subscribe_all());
        assert!(parsed.get_subscriptions().unwrap().is_empty());
    }

    #[test]
    fn test_subscription_list() {
        let parsed = args(&[
            "broker-gateway",
            "--config",
            "gateway.toml",
            "--subscribe",
            "600000.SSE,000001.SZSE",
        ]);
        assert_eq!(parsed.get_config_path(), Some(PathBuf::from("gateway.toml")));
        assert_eq!(
            parsed.get_subscriptions().unwrap(),
            vec![
                ContractKey::new("600000", Exchange::Sse),
                ContractKey::new("000001", Exchange::Szse),
            ]
        );
    }

    #[test]
    fn test_bad_subscription_is_reported() {
        let parsed = args(&["broker-gateway", "--subscribe", "600000"]);
        assert!(parsed.get_subscriptions().is_err());
    }
}
