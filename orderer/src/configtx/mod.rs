//! Configuration transaction engine.
//!
//! A [`ConfigManager`] is the validated, parsed view of the configuration
//! of one channel. It is built from the channel's latest configuration
//! transaction by a [`ConfigEngine`].

mod config;
mod manager;

pub use self::{
    config::{
        ConsortiumConfig, ConsortiumsConfig, OrdererConfig, DEFAULT_BATCH_SIZE,
        DEFAULT_BATCH_TIMEOUT,
    },
    manager::{StandardConfigEngine, StandardManager},
};
use orderer_lib::{
    codec,
    interfaces::{ConfigEnvelope, ConfigGroup, Envelope, HeaderType},
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed configuration transaction")]
    Codec(#[from] codec::Error),
    #[error("configuration transaction has no header")]
    MissingHeader,
    #[error("expected a configuration transaction, got a `{0:?}` transaction")]
    WrongHeaderType(HeaderType),
    #[error("configuration transaction does not name its channel")]
    EmptyChannelId,
    #[error("configuration has no channel group")]
    MissingChannelGroup,
    #[error("configuration has no `{0}` group")]
    MissingGroup(&'static str),
    #[error("configuration has no `{key}` value in the `{group}` group")]
    MissingValue {
        group: &'static str,
        key: &'static str,
    },
    #[error("consortium `{consortium}` has no channel creation policy")]
    MissingChannelCreationPolicy { consortium: String },
}

pub trait ConfigManager: Send + Sync {
    fn chain_id(&self) -> &str;

    /// number of configuration updates applied to the channel
    fn sequence(&self) -> u64;

    fn orderer_config(&self) -> &OrdererConfig;

    /// only the system channel's configuration holds consortiums
    fn consortiums_config(&self) -> Option<&ConsortiumsConfig>;

    fn config_envelope(&self) -> &ConfigEnvelope;

    fn channel_group(&self) -> &Arc<ConfigGroup>;
}

pub trait ConfigEngine: Send + Sync {
    fn new_manager(&self, config_tx: &Envelope) -> Result<Arc<dyn ConfigManager>, Error>;
}
