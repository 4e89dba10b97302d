//! Genesis configuration of channels.
//!
//! A [`GenesisProfile`] describes the initial configuration tree of a
//! channel. With consortiums it describes the system channel, which is
//! what the node writes to an empty ledger on its first start.

use crate::{
    crypto::{self, create_signed_envelope, LocalSigner},
    ledger,
    multichain::{EPOCH, MSG_VERSION},
};
use orderer_lib::{
    codec,
    interfaces::{
        keys, BatchSize, BatchTimeout, Block, BlockData, Config, ConfigEnvelope, ConfigGroup,
        ConfigSignature, ConfigUpdate, ConfigUpdateEnvelope, ConfigValue, Consortium,
        ConsensusType, Envelope, HashingAlgorithm, HeaderType, ImplicitMetaPolicy,
        ImplicitMetaRule, MspConfig, OrdererAddresses, Policy, PolicyType,
    },
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use thiserror::Error;

const HASHING_ALGORITHM: &str = "SHA256";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] codec::Error),
    #[error("cannot sign the configuration transaction")]
    Signing(#[from] crypto::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisProfile {
    pub channel_id: String,
    #[serde(default = "default_consensus_type")]
    pub consensus_type: String,
    #[serde(default = "default_max_message_count")]
    pub max_message_count: u32,
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,
    #[serde(default)]
    pub orderer_addresses: Vec<String>,
    /// consortium name to member organizations, `None` for a channel
    /// which is not the system channel
    #[serde(default)]
    pub consortiums: Option<BTreeMap<String, Vec<String>>>,
}

fn default_consensus_type() -> String {
    "solo".to_owned()
}

fn default_max_message_count() -> u32 {
    crate::configtx::DEFAULT_BATCH_SIZE.max_message_count
}

fn default_batch_timeout_ms() -> u64 {
    crate::configtx::DEFAULT_BATCH_TIMEOUT.as_millis() as u64
}

fn implicit_meta(sub_policy: &str, rule: ImplicitMetaRule) -> Result<Policy, codec::Error> {
    Ok(Policy {
        policy_type: PolicyType::ImplicitMeta,
        value: codec::encode(&ImplicitMetaPolicy {
            sub_policy: sub_policy.to_owned(),
            rule,
        })?,
    })
}

fn with_standard_policies(group: ConfigGroup) -> Result<ConfigGroup, codec::Error> {
    Ok(group
        .with_policy(
            keys::ADMINS_POLICY,
            implicit_meta(keys::ADMINS_POLICY, ImplicitMetaRule::Majority)?,
        )
        .with_policy(
            keys::READERS_POLICY,
            implicit_meta(keys::READERS_POLICY, ImplicitMetaRule::Any)?,
        )
        .with_policy(
            keys::WRITERS_POLICY,
            implicit_meta(keys::WRITERS_POLICY, ImplicitMetaRule::Any)?,
        ))
}

fn organization_group(name: &str) -> Result<ConfigGroup, codec::Error> {
    let mut group = ConfigGroup::new().with_value(
        keys::MSP,
        ConfigValue::encode(&MspConfig {
            name: name.to_owned(),
            config: Vec::new(),
        })?
        .with_mod_policy(keys::ADMINS_POLICY),
    );
    group.mod_policy = keys::ADMINS_POLICY.to_owned();
    Ok(group)
}

impl GenesisProfile {
    pub fn standard(channel_id: impl Into<String>) -> Self {
        GenesisProfile {
            channel_id: channel_id.into(),
            consensus_type: default_consensus_type(),
            max_message_count: default_max_message_count(),
            batch_timeout_ms: default_batch_timeout_ms(),
            orderer_addresses: Vec::new(),
            consortiums: None,
        }
    }

    /// a system channel without any consortium yet
    pub fn system(channel_id: impl Into<String>) -> Self {
        GenesisProfile {
            consortiums: Some(BTreeMap::new()),
            ..Self::standard(channel_id)
        }
    }

    pub fn with_consortium(mut self, name: &str, organizations: &[&str]) -> Self {
        self.consortiums.get_or_insert_with(BTreeMap::new).insert(
            name.to_owned(),
            organizations.iter().map(|org| (*org).to_owned()).collect(),
        );
        self
    }

    pub fn with_consensus_type(mut self, consensus_type: impl Into<String>) -> Self {
        self.consensus_type = consensus_type.into();
        self
    }

    fn orderer_group(&self) -> Result<ConfigGroup, codec::Error> {
        let mut batch_size = crate::configtx::DEFAULT_BATCH_SIZE;
        batch_size.max_message_count = self.max_message_count;

        let mut group = with_standard_policies(
            ConfigGroup::new()
                .with_value(
                    keys::CONSENSUS_TYPE,
                    ConfigValue::encode(&ConsensusType {
                        consensus_type: self.consensus_type.clone(),
                    })?
                    .with_mod_policy(keys::ADMINS_POLICY),
                )
                .with_value(
                    keys::BATCH_SIZE,
                    ConfigValue::encode::<BatchSize>(&batch_size)?
                        .with_mod_policy(keys::ADMINS_POLICY),
                )
                .with_value(
                    keys::BATCH_TIMEOUT,
                    ConfigValue::encode(&BatchTimeout {
                        timeout: Duration::from_millis(self.batch_timeout_ms),
                    })?
                    .with_mod_policy(keys::ADMINS_POLICY),
                ),
        )?;
        group.mod_policy = keys::ADMINS_POLICY.to_owned();
        Ok(group)
    }

    fn consortiums_group(
        consortiums: &BTreeMap<String, Vec<String>>,
    ) -> Result<ConfigGroup, codec::Error> {
        let mut group = ConfigGroup::new();
        group.mod_policy = keys::ORDERER_ADMINS_POLICY_PATH.to_owned();
        for (name, organizations) in consortiums {
            let mut consortium = ConfigGroup::new().with_value(
                keys::CHANNEL_CREATION_POLICY,
                ConfigValue::encode(&implicit_meta(keys::ADMINS_POLICY, ImplicitMetaRule::Any)?)?
                    .with_mod_policy(keys::ORDERER_ADMINS_POLICY_PATH),
            );
            consortium.mod_policy = keys::ORDERER_ADMINS_POLICY_PATH.to_owned();
            for organization in organizations {
                consortium = consortium.with_group(organization, organization_group(organization)?);
            }
            group = group.with_group(name, consortium);
        }
        Ok(group)
    }

    /// the configuration tree of the channel
    pub fn channel_group(&self) -> Result<ConfigGroup, codec::Error> {
        let mut group = with_standard_policies(
            ConfigGroup::new()
                .with_value(
                    keys::HASHING_ALGORITHM,
                    ConfigValue::encode(&HashingAlgorithm {
                        name: HASHING_ALGORITHM.to_owned(),
                    })?
                    .with_mod_policy(keys::ADMINS_POLICY),
                )
                .with_value(
                    keys::ORDERER_ADDRESSES,
                    ConfigValue::encode(&OrdererAddresses {
                        addresses: self.orderer_addresses.clone(),
                    })?
                    .with_mod_policy(keys::ORDERER_ADMINS_POLICY_PATH),
                )
                .with_group(keys::ORDERER_GROUP, self.orderer_group()?),
        )?;
        if let Some(consortiums) = &self.consortiums {
            group = group.with_group(keys::CONSORTIUMS_GROUP, Self::consortiums_group(consortiums)?);
        }
        group.mod_policy = keys::ADMINS_POLICY.to_owned();
        Ok(group)
    }

    /// the signed configuration transaction of the channel's first block
    pub fn config_tx(&self, signer: &dyn LocalSigner) -> Result<Envelope, Error> {
        let config_envelope = ConfigEnvelope {
            config: Some(Config {
                sequence: 0,
                channel_group: Some(Arc::new(self.channel_group()?)),
            }),
            last_update: None,
        };
        Ok(create_signed_envelope(
            HeaderType::Config,
            &self.channel_id,
            signer,
            &config_envelope,
            MSG_VERSION,
            EPOCH,
        )?)
    }

    /// block 0 of the channel
    pub fn block(&self, signer: &dyn LocalSigner) -> Result<Block, Error> {
        let data = BlockData {
            data: vec![codec::encode(&self.config_tx(signer)?)?],
        };
        let mut block = Block::new(0, Vec::new());
        block.header.data_hash = ledger::block_data_hash(&data);
        block.data = data;
        block.set_last_config(0)?;
        Ok(block)
    }
}

/// build the request to create `channel_id` on behalf of `consortium`
/// with the given member organizations
pub fn channel_creation_tx(
    channel_id: &str,
    consortium: &str,
    organizations: &[&str],
    signer: &dyn LocalSigner,
) -> Result<Envelope, Error> {
    let mut application = ConfigGroup::new();
    for organization in organizations {
        application = application.with_group(*organization, ConfigGroup::new());
    }
    let consortium = ConfigValue::encode(&Consortium {
        name: consortium.to_owned(),
    })?;

    let read_set = ConfigGroup::new()
        .with_value(keys::CONSORTIUM, consortium.clone())
        .with_group(keys::APPLICATION_GROUP, application.clone());
    application.version = 1;
    application.mod_policy = keys::ADMINS_POLICY.to_owned();
    let write_set = ConfigGroup::new()
        .with_value(keys::CONSORTIUM, consortium)
        .with_group(keys::APPLICATION_GROUP, application);

    let config_update = codec::encode(&ConfigUpdate {
        channel_id: channel_id.to_owned(),
        read_set: Some(read_set),
        write_set: Some(write_set),
    })?;

    let signature_header = codec::encode(&signer.new_signature_header()?)?;
    let mut signed = signature_header.clone();
    signed.extend_from_slice(&config_update);
    let signature = ConfigSignature {
        signature_header,
        signature: signer.sign(&signed)?,
    };

    Ok(create_signed_envelope(
        HeaderType::ConfigUpdate,
        channel_id,
        signer,
        &ConfigUpdateEnvelope {
            config_update,
            signatures: vec![signature],
        },
        MSG_VERSION,
        EPOCH,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Ed25519Signer;

    #[test]
    fn profile_from_yaml() {
        let profile: GenesisProfile = serde_yaml::from_str(
            r#"
            channel_id: ordering-system
            max_message_count: 50
            consortiums:
              SampleConsortium: [Org1, Org2]
            "#,
        )
        .unwrap();

        assert_eq!(
            profile,
            GenesisProfile {
                max_message_count: 50,
                ..GenesisProfile::system("ordering-system")
                    .with_consortium("SampleConsortium", &["Org1", "Org2"])
            }
        );
    }

    #[test]
    fn system_channel_group() {
        let group = GenesisProfile::system("ordering-system")
            .with_consortium("SampleConsortium", &["Org1", "Org2"])
            .channel_group()
            .unwrap();

        let consortium = group
            .group(keys::CONSORTIUMS_GROUP)
            .and_then(|consortiums| consortiums.group("SampleConsortium"))
            .unwrap();
        assert_eq!(
            consortium.groups.keys().collect::<Vec<_>>(),
            vec!["Org1", "Org2"]
        );
        assert!(consortium.value(keys::CHANNEL_CREATION_POLICY).is_some());
        assert!(group.group(keys::ORDERER_GROUP).is_some());
        assert_eq!(group.policies.len(), 3);
    }

    #[test]
    fn genesis_block_points_at_itself() {
        let signer = Ed25519Signer::generate();
        let block = GenesisProfile::standard("mychannel").block(&signer).unwrap();
        assert_eq!(block.number(), 0);
        assert_eq!(block.last_config_index().unwrap(), 0);

        let payload = block.envelope(0).unwrap().decode_payload().unwrap();
        let channel_header = payload.channel_header().unwrap();
        assert_eq!(channel_header.header_type, HeaderType::Config);
        assert_eq!(channel_header.channel_id, "mychannel");
    }

    #[test]
    fn creation_request_proposes_version_one() {
        let signer = Ed25519Signer::generate();
        let envelope =
            channel_creation_tx("testchannel", "SampleConsortium", &["Org1"], &signer).unwrap();

        let payload = envelope.decode_payload().unwrap();
        assert_eq!(
            payload.channel_header().unwrap().header_type,
            HeaderType::ConfigUpdate
        );
        let update_envelope: ConfigUpdateEnvelope = codec::decode(&payload.data).unwrap();
        assert_eq!(update_envelope.signatures.len(), 1);
        let update: ConfigUpdate = codec::decode(&update_envelope.config_update).unwrap();
        assert_eq!(update.channel_id, "testchannel");

        let write_set = update.write_set.unwrap();
        let application = write_set.group(keys::APPLICATION_GROUP).unwrap();
        assert_eq!(application.version, 1);
        assert!(application.group("Org1").is_some());
        assert_eq!(
            write_set
                .decode_value::<Consortium>(keys::CONSORTIUM)
                .unwrap()
                .unwrap()
                .name,
            "SampleConsortium"
        );
        assert_eq!(
            update
                .read_set
                .unwrap()
                .group(keys::APPLICATION_GROUP)
                .unwrap()
                .version,
            0
        );
    }
}
