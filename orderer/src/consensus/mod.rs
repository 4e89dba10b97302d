//! Pluggable consensus.
//!
//! A [`Consenter`] is selected by the `ConsensusType` of a channel's
//! orderer configuration and turns a [`ConsenterSupport`] into a running
//! [`Chain`].

mod blockcutter;
#[cfg(test)]
pub(crate) mod mock;
mod solo;

pub use self::solo::Solo;
use crate::{configtx::OrdererConfig, crypto, ledger};
use orderer_lib::{
    codec,
    interfaces::{Block, Envelope},
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot write to the ledger")]
    Ledger(#[from] ledger::Error),
    #[error("cannot sign the block")]
    Signing(#[from] crypto::Error),
    #[error(transparent)]
    Codec(#[from] codec::Error),
}

/// consenters by consensus type name
pub type Consenters = HashMap<String, Arc<dyn Consenter>>;

/// what a consenter gets to work with a channel
pub trait ConsenterSupport: Send + Sync {
    fn chain_id(&self) -> &str;

    fn shared_config(&self) -> &OrdererConfig;

    fn height(&self) -> u64;

    /// cut a block out of the batch, sign it and append it to the ledger
    fn write_block(&self, batch: Vec<Envelope>) -> Result<Block, Error>;
}

pub trait Chain: Send + Sync {
    /// start processing messages. Only the first call has an effect.
    fn start(&self);

    /// submit a message for ordering, `false` if the chain is halted
    fn enqueue(&self, envelope: Envelope) -> bool;

    fn halt(&self);
}

pub trait Consenter: Send + Sync {
    fn handle_chain(&self, support: Arc<dyn ConsenterSupport>) -> Result<Box<dyn Chain>, Error>;
}
