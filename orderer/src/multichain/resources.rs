use super::SupportError;
use crate::{
    configtx::{ConfigEngine, ConfigManager, ConsortiumsConfig, OrdererConfig},
    ledger::{Factory, ReadWriter},
};
use orderer_lib::interfaces::{ConfigEnvelope, Envelope};
use std::sync::Arc;

/// read only view over the configuration of a channel
#[derive(Clone)]
pub struct ConfigResources {
    manager: Arc<dyn ConfigManager>,
}

impl ConfigResources {
    pub fn new(manager: Arc<dyn ConfigManager>) -> Self {
        ConfigResources { manager }
    }

    pub fn from_config_tx(
        engine: &dyn ConfigEngine,
        config_tx: &Envelope,
    ) -> Result<Self, SupportError> {
        Ok(Self::new(engine.new_manager(config_tx)?))
    }

    pub fn chain_id(&self) -> &str {
        self.manager.chain_id()
    }

    pub fn shared_config(&self) -> &OrdererConfig {
        self.manager.orderer_config()
    }

    /// `Some` only for the system channel
    pub fn consortiums_config(&self) -> Option<&ConsortiumsConfig> {
        self.manager.consortiums_config()
    }

    pub fn config_envelope(&self) -> &ConfigEnvelope {
        self.manager.config_envelope()
    }

    pub fn config_manager(&self) -> &Arc<dyn ConfigManager> {
        &self.manager
    }
}

/// everything needed to run a channel: its configuration and its ledger
pub struct LedgerResources {
    config: ConfigResources,
    ledger: Arc<dyn ReadWriter>,
}

impl LedgerResources {
    /// open, or create, the ledger of the configured channel
    pub fn open(config: ConfigResources, factory: &dyn Factory) -> Result<Self, SupportError> {
        let ledger =
            factory
                .get_or_create(config.chain_id())
                .map_err(|source| SupportError::Ledger {
                    channel_id: config.chain_id().to_owned(),
                    source,
                })?;
        Ok(LedgerResources { config, ledger })
    }

    pub fn config(&self) -> &ConfigResources {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn ReadWriter> {
        &self.ledger
    }
}
