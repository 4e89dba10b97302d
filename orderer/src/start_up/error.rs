use crate::{crypto, genesis, ledger, multichain::BootstrapError, settings};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("ledger storage")]
    LedgerStorage,
    #[error("async runtime")]
    Runtime,
    #[error("signal handler")]
    Signal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to initialize the logger")]
    LoggingInitializationError(#[from] settings::logging::Error),
    #[error("Error in the overall configuration of the node")]
    ConfigurationError(#[from] settings::Error),
    #[error("I/O Error with {reason}")]
    Io {
        #[source]
        source: io::Error,
        reason: ErrorKind,
    },
    #[error("Ledger storage error")]
    Ledger(#[from] ledger::Error),
    #[error("Error while loading the node's signing key")]
    Signer(#[from] crypto::Error),
    #[error("Error in the genesis profile")]
    Genesis(#[from] genesis::Error),
    #[error("Cannot start the node without channels nor a genesis profile to create the system channel")]
    ExpectedGenesis,
    #[error("Error while loading the channels from the ledger")]
    Bootstrap(#[from] BootstrapError),
}

impl Error {
    #[inline]
    pub fn code(&self) -> i32 {
        match self {
            Error::LoggingInitializationError { .. } => 1,
            Error::ConfigurationError { .. } => 2,
            Error::Io { .. } => 3,
            Error::Ledger { .. } => 4,
            Error::Signer { .. } => 5,
            Error::Genesis { .. } => 6,
            Error::ExpectedGenesis => 6,
            Error::Bootstrap { .. } => 7,
        }
    }
}
