use crate::{codec, interfaces::Envelope, interfaces::Policy};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

/// well known names of groups, values and policies in the
/// configuration tree
pub mod keys {
    pub const APPLICATION_GROUP: &str = "Application";
    pub const ORDERER_GROUP: &str = "Orderer";
    pub const CONSORTIUMS_GROUP: &str = "Consortiums";

    pub const CONSORTIUM: &str = "Consortium";
    pub const CONSENSUS_TYPE: &str = "ConsensusType";
    pub const BATCH_SIZE: &str = "BatchSize";
    pub const BATCH_TIMEOUT: &str = "BatchTimeout";
    pub const HASHING_ALGORITHM: &str = "HashingAlgorithm";
    pub const ORDERER_ADDRESSES: &str = "OrdererAddresses";
    pub const MSP: &str = "MSP";

    pub const CHANNEL_CREATION_POLICY: &str = "ChannelCreationPolicy";
    pub const ADMINS_POLICY: &str = "Admins";
    pub const READERS_POLICY: &str = "Readers";
    pub const WRITERS_POLICY: &str = "Writers";

    /// modification policy of the consortium name of a channel
    pub const ORDERER_ADMINS_POLICY_PATH: &str = "/Channel/Orderer/Admins";
}

/// a node of the recursive configuration tree.
///
/// Children are held behind [`Arc`]: once a node is installed in a tree it
/// is immutable, so the same sub-tree may be shared between the
/// configurations of several channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub version: u64,
    pub groups: BTreeMap<String, Arc<ConfigGroup>>,
    pub values: BTreeMap<String, Arc<ConfigValue>>,
    pub policies: BTreeMap<String, Arc<ConfigPolicy>>,
    pub mod_policy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
    pub version: u64,
    pub value: Vec<u8>,
    pub mod_policy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPolicy {
    pub version: u64,
    pub policy: Option<Policy>,
    pub mod_policy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub sequence: u64,
    pub channel_group: Option<Arc<ConfigGroup>>,
}

/// the data of an envelope of type `HeaderType::Config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEnvelope {
    pub config: Option<Config>,
    pub last_update: Option<Envelope>,
}

/// the data of an envelope of type `HeaderType::ConfigUpdate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdateEnvelope {
    /// encoded [`ConfigUpdate`]
    pub config_update: Vec<u8>,
    pub signatures: Vec<ConfigSignature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSignature {
    pub signature_header: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub channel_id: String,
    pub read_set: Option<ConfigGroup>,
    pub write_set: Option<ConfigGroup>,
}

impl ConfigGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, key: &str) -> Option<&Arc<ConfigGroup>> {
        self.groups.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&Arc<ConfigValue>> {
        self.values.get(key)
    }

    /// decode the value stored under `key`, `Ok(None)` if there is none
    pub fn decode_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, codec::Error> {
        self.values.get(key).map(|value| value.decode()).transpose()
    }

    pub fn with_group(mut self, key: impl Into<String>, group: ConfigGroup) -> Self {
        self.groups.insert(key.into(), Arc::new(group));
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), Arc::new(value));
        self
    }

    pub fn with_policy(mut self, key: impl Into<String>, policy: Policy) -> Self {
        self.policies.insert(
            key.into(),
            Arc::new(ConfigPolicy {
                version: 0,
                policy: Some(policy),
                mod_policy: String::new(),
            }),
        );
        self
    }
}

impl ConfigValue {
    pub fn encode<T: Serialize>(message: &T) -> Result<Self, codec::Error> {
        Ok(ConfigValue {
            version: 0,
            value: codec::encode(message)?,
            mod_policy: String::new(),
        })
    }

    pub fn with_mod_policy(mut self, mod_policy: impl Into<String>) -> Self {
        self.mod_policy = mod_policy.into();
        self
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, codec::Error> {
        codec::decode(&self.value)
    }
}

impl Config {
    pub fn channel_group(&self) -> Option<&Arc<ConfigGroup>> {
        self.channel_group.as_ref()
    }
}

impl ConfigEnvelope {
    pub fn channel_group(&self) -> Option<&Arc<ConfigGroup>> {
        self.config.as_ref().and_then(Config::channel_group)
    }
}
