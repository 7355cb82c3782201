//! Collaborator stores the gateway reads from.
//!
//! - [`MemoryConfigStore`]: runtime key/value switches, editable while running.
//! - [`StaticContractStore`]: a fixed list of contracts.
//! - [`JsonContractStore`]: contracts persisted as a JSON array on disk.

use crate::settings::GatewaySettings;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use trading::{ConfigStore, ContractMeta, ContractStore};

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the startup switches found in `settings`.
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        let store = Self::new();
        if let Some(value) = &settings.reconnect.auto_login {
            store.set(settings.reconnect.policy_key.clone(), value.clone());
        }
        store
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_config_value(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticContractStore {
    contracts: Vec<ContractMeta>,
}

impl StaticContractStore {
    pub fn new(contracts: Vec<ContractMeta>) -> Self {
        Self { contracts }
    }
}

impl ContractStore for StaticContractStore {
    fn get_all_contracts(&self) -> Result<Vec<ContractMeta>> {
        Ok(self.contracts.clone())
    }
}

/// Contract metadata kept in a JSON file.
///
/// The file is read on every call so edits made between two logins are
/// picked up. A missing file reads as an empty list.
#[derive(Debug, Clone)]
pub struct JsonContractStore {
    file_path: PathBuf,
}

impl JsonContractStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Writes `contracts` atomically: a temporary sibling file is written,
    /// synced and renamed over the target.
    pub fn save(&self, contracts: &[ContractMeta]) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create parent directory")?;
        }
        let json =
            serde_json::to_string_pretty(contracts).context("Failed to serialize contracts")?;

        let temp_path = self.file_path.with_extension("tmp");
        let mut temp_file =
            std::fs::File::create(&temp_path).context("Failed to create temp file")?;
        temp_file
            .write_all(json.as_bytes())
            .context("Failed to write to temp file")?;
        temp_file.sync_all().context("Failed to sync temp file")?;

        std::fs::rename(&temp_path, &self.file_path)
            .with_context(|| format!("Failed to save contracts to {:?}", self.file_path))?;
        Ok(())
    }
}

impl ContractStore for JsonContractStore {
    fn get_all_contracts(&self) -> Result<Vec<ContractMeta>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.file_path)
            .with_context(|| format!("Failed to open contract file {:?}", self.file_path))?;
        let contracts = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to load contracts from {:?}", self.file_path))?;
        Ok(contracts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading::{ContractKey, Exchange, Product};

    #[test]
    fn test_config_store_reflects_live_edits() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.get_config_value("re_auto_login_xtp"), None);
        store.set("re_auto_login_xtp", "N");
        assert_eq!(store.get_config_value("re_auto_login_xtp").as_deref(), Some("N"));
        store.remove("re_auto_login_xtp");
        assert_eq!(store.get_config_value("re_auto_login_xtp"), None);
    }

    #[test]
    fn test_config_store_seeded_from_settings() {
        let mut settings = GatewaySettings::default();
        assert_eq!(
            MemoryConfigStore::from_settings(&settings).get_config_value("re_auto_login_xtp"),
            None
        );

        settings.reconnect.auto_login = Some("N".to_string());
        let store = MemoryConfigStore::from_settings(&settings);
        assert_eq!(store.get_config_value("re_auto_login_xtp").as_deref(), Some("N"));
    }

    #[test]
    fn test_json_store_save_then_load() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("contract-store-{}", std::process::id()));
        let store = JsonContractStore::new(dir.join("contracts.json"));
        assert!(store.get_all_contracts()?.is_empty());

        let meta = ContractMeta::new(
            ContractKey::new("600000", Exchange::Sse),
            "PF Bank",
            Product::Equity,
            0.01,
        )?;
        store.save(std::slice::from_ref(&meta))?;
        assert_eq!(store.get_all_contracts()?, vec![meta]);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_json_store_reports_corrupt_file() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("contract-store-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("contracts.json");
        std::fs::write(&path, "not json")?;

        let err = JsonContractStore::new(&path).get_all_contracts().unwrap_err();
        assert!(err.to_string().contains("Failed to load contracts"));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
