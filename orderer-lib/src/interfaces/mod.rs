mod block;
mod config;
mod envelope;
mod values;

pub use self::{
    block::{
        Block, BlockData, BlockError, BlockHeader, BlockMetadata, BlockMetadataIndex, LastConfig,
        Metadata, MetadataSignature,
    },
    config::{
        keys, Config, ConfigEnvelope, ConfigGroup, ConfigPolicy, ConfigSignature, ConfigUpdate,
        ConfigUpdateEnvelope, ConfigValue,
    },
    envelope::{ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader},
    values::{
        BatchSize, BatchTimeout, Consortium, ConsensusType, HashingAlgorithm, ImplicitMetaPolicy,
        ImplicitMetaRule, MspConfig, OrdererAddresses, Policy, PolicyType,
    },
};
