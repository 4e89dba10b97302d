use crate::{configtx, consensus, crypto, ledger};
use orderer_lib::{codec, interfaces::BlockError};
use thiserror::Error;

/// failures building the resources and the runtime of a channel
#[derive(Debug, Error)]
pub enum SupportError {
    #[error("invalid configuration transaction")]
    ConfigManager(#[from] configtx::Error),
    #[error("cannot open the ledger of channel `{channel_id}`")]
    Ledger {
        channel_id: String,
        #[source]
        source: ledger::Error,
    },
    #[error("channel `{channel_id}` uses the unknown consensus type `{consensus_type}`")]
    UnknownConsensusType {
        channel_id: String,
        consensus_type: String,
    },
    #[error("the consenter cannot handle channel `{channel_id}`")]
    Consenter {
        channel_id: String,
        #[source]
        source: consensus::Error,
    },
}

/// unrecoverable conditions found while loading the channels from the
/// ledger: the node must not start
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("cannot read the ledger of channel `{channel_id}`")]
    Ledger {
        channel_id: String,
        #[source]
        source: ledger::Error,
    },
    #[error("the ledger of channel `{channel_id}` is empty")]
    EmptyLedger { channel_id: String },
    #[error("block {number} of channel `{channel_id}` does not exist")]
    BlockNotFound { channel_id: String, number: u64 },
    #[error("channel `{channel_id}` did not have appropriately encoded last config in its latest block")]
    LastConfig {
        channel_id: String,
        #[source]
        source: BlockError,
    },
    #[error("config block {index} of channel `{channel_id}` does not exist")]
    ConfigBlockNotFound { channel_id: String, index: u64 },
    #[error("could not find the config transaction of channel `{channel_id}`")]
    ConfigTx {
        channel_id: String,
        #[source]
        source: BlockError,
    },
    #[error(transparent)]
    Support(#[from] SupportError),
    #[error("there appear to be two system channels: `{first}` and `{second}`")]
    DuplicateSystemChannel { first: String, second: String },
    #[error("no system channel found")]
    NoSystemChannel,
}

/// rejected channel creation requests. Nothing is modified.
#[derive(Debug, Error)]
pub enum CreationError {
    #[error("failing initial channel config creation because of payload decoding error")]
    Payload(#[source] codec::Error),
    #[error("failing initial channel config creation because of config update envelope decoding error")]
    ConfigUpdateEnvelope(#[source] codec::Error),
    #[error("failing initial channel config creation because of config update decoding error")]
    ConfigUpdate(#[source] codec::Error),
    #[error("cannot create a channel with this identifier")]
    InvalidChannelId(#[source] ledger::Error),
    #[error("config update has an empty writeset")]
    EmptyWriteSet,
    #[error("config update has missing application group")]
    MissingApplicationGroup,
    #[error("config update for channel creation does not set application group version to 1, was {version}")]
    ApplicationGroupVersion { version: u64 },
    #[error("consortium config value missing")]
    MissingConsortiumValue,
    #[error("error decoding the consortium name")]
    ConsortiumValue(#[source] codec::Error),
    #[error("the ordering system channel does not appear to support creating channels")]
    NotConsortiumCapable,
    #[error("unknown consortium name: {name}")]
    UnknownConsortium { name: String },
    #[error("proposed configuration has no application group members, but consortium contains members")]
    NoMembers,
    #[error("attempted to include member `{organization}` which is not in the consortium")]
    NotConsortiumMember { organization: String },
    #[error("cannot encode the new channel configuration")]
    Codec(#[source] codec::Error),
    #[error("cannot sign the new channel configuration")]
    Signing(#[source] crypto::Error),
    #[error("the new channel configuration is invalid")]
    ConfigManager(#[source] configtx::Error),
}

/// failures committing a new channel. The registry is left unchanged.
#[derive(Debug, Error)]
pub enum AdmitError {
    #[error(transparent)]
    Support(#[from] SupportError),
    #[error("channel `{channel_id}` already exists")]
    ChannelExists { channel_id: String },
    #[error("channel `{channel_id}` carries consortiums, a second system channel cannot be created")]
    SystemChannelConfig { channel_id: String },
    #[error("cannot append the genesis block of channel `{channel_id}`")]
    WriteBlock {
        channel_id: String,
        #[source]
        source: consensus::Error,
    },
}
