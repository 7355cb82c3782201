use std::sync::Arc;
use trading::{ConfigStore, ContractStore, EventSink};
use trading_core::{ContractDirectory, SubscriptionRegistry};

/// Collaborators shared by both sessions of one gateway.
///
/// The directory and the registry are owned here and handed to each
/// session explicitly; nothing in the crate keeps process globals.
#[derive(Clone)]
pub struct GatewayContext {
    pub sink: Arc<dyn EventSink>,
    pub directory: ContractDirectory,
    pub registry: SubscriptionRegistry,
    pub config_store: Arc<dyn ConfigStore>,
    pub contract_store: Arc<dyn ContractStore>,
}

impl GatewayContext {
    pub fn new(
        sink: Arc<dyn EventSink>,
        config_store: Arc<dyn ConfigStore>,
        contract_store: Arc<dyn ContractStore>,
    ) -> Self {
        Self {
            sink,
            directory: ContractDirectory::new(),
            registry: SubscriptionRegistry::new(),
            config_store,
            contract_store,
        }
    }

    /// Shares an existing directory, e.g. with another gateway in the same process.
    pub fn with_directory(mut self, directory: ContractDirectory) -> Self {
        self.directory = directory;
        self
    }
}
