use super::Error;
use orderer_lib::interfaces::{
    keys, BatchSize, BatchTimeout, ConfigGroup, ConsensusType, OrdererAddresses, Policy,
};
use std::{collections::BTreeMap, time::Duration};

pub const DEFAULT_BATCH_SIZE: BatchSize = BatchSize {
    max_message_count: 10,
    absolute_max_bytes: 98 * 1024 * 1024,
    preferred_max_bytes: 512 * 1024,
};
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// orderer level configuration shared by every channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdererConfig {
    consensus_type: String,
    batch_size: BatchSize,
    batch_timeout: Duration,
    addresses: Vec<String>,
}

impl OrdererConfig {
    pub(super) fn from_channel_group(channel_group: &ConfigGroup) -> Result<Self, Error> {
        let orderer = channel_group
            .group(keys::ORDERER_GROUP)
            .ok_or(Error::MissingGroup(keys::ORDERER_GROUP))?;

        let consensus_type = orderer
            .decode_value::<ConsensusType>(keys::CONSENSUS_TYPE)?
            .ok_or(Error::MissingValue {
                group: keys::ORDERER_GROUP,
                key: keys::CONSENSUS_TYPE,
            })?;
        let batch_size = orderer
            .decode_value::<BatchSize>(keys::BATCH_SIZE)?
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let batch_timeout = orderer
            .decode_value::<BatchTimeout>(keys::BATCH_TIMEOUT)?
            .map(|timeout| timeout.timeout)
            .unwrap_or(DEFAULT_BATCH_TIMEOUT);
        let addresses = channel_group
            .decode_value::<OrdererAddresses>(keys::ORDERER_ADDRESSES)?
            .unwrap_or_default()
            .addresses;

        Ok(OrdererConfig {
            consensus_type: consensus_type.consensus_type,
            batch_size,
            batch_timeout,
            addresses,
        })
    }

    pub fn consensus_type(&self) -> &str {
        &self.consensus_type
    }

    pub fn batch_size(&self) -> &BatchSize {
        &self.batch_size
    }

    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsortiumConfig {
    channel_creation_policy: Policy,
    organizations: Vec<String>,
}

impl ConsortiumConfig {
    pub fn channel_creation_policy(&self) -> &Policy {
        &self.channel_creation_policy
    }

    pub fn organizations(&self) -> &[String] {
        &self.organizations
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsortiumsConfig {
    consortiums: BTreeMap<String, ConsortiumConfig>,
}

impl ConsortiumsConfig {
    /// `Ok(None)` if the channel group has no consortiums group, which is
    /// the case of every channel but the system channel
    pub(super) fn from_channel_group(channel_group: &ConfigGroup) -> Result<Option<Self>, Error> {
        let group = match channel_group.group(keys::CONSORTIUMS_GROUP) {
            None => return Ok(None),
            Some(group) => group,
        };

        let mut consortiums = BTreeMap::new();
        for (name, consortium) in &group.groups {
            let channel_creation_policy = consortium
                .decode_value::<Policy>(keys::CHANNEL_CREATION_POLICY)?
                .ok_or_else(|| Error::MissingChannelCreationPolicy {
                    consortium: name.clone(),
                })?;
            consortiums.insert(
                name.clone(),
                ConsortiumConfig {
                    channel_creation_policy,
                    organizations: consortium.groups.keys().cloned().collect(),
                },
            );
        }

        Ok(Some(ConsortiumsConfig { consortiums }))
    }

    pub fn consortiums(&self) -> &BTreeMap<String, ConsortiumConfig> {
        &self.consortiums
    }

    pub fn consortium(&self, name: &str) -> Option<&ConsortiumConfig> {
        self.consortiums.get(name)
    }
}
