use crate::model::contract::ContractMeta;

/// Persistent source of contract metadata, read once per trading login.
pub trait ContractStore: Send + Sync {
    fn get_all_contracts(&self) -> anyhow::Result<Vec<ContractMeta>>;
}

/// Runtime key/value configuration, polled whenever a decision needs it.
pub trait ConfigStore: Send + Sync {
    fn get_config_value(&self, key: &str) -> Option<String>;
}
