use super::{ConfigEngine, ConfigManager, ConsortiumsConfig, Error, OrdererConfig};
use orderer_lib::{
    codec,
    interfaces::{ConfigEnvelope, ConfigGroup, Envelope, HeaderType},
};
use std::sync::Arc;

pub struct StandardManager {
    chain_id: String,
    config_envelope: ConfigEnvelope,
    channel_group: Arc<ConfigGroup>,
    sequence: u64,
    orderer_config: OrdererConfig,
    consortiums_config: Option<ConsortiumsConfig>,
}

impl StandardManager {
    pub fn new(config_tx: &Envelope) -> Result<Self, Error> {
        let payload = config_tx.decode_payload()?;
        let channel_header = payload.channel_header().ok_or(Error::MissingHeader)?;
        if channel_header.header_type != HeaderType::Config {
            return Err(Error::WrongHeaderType(channel_header.header_type));
        }
        if channel_header.channel_id.is_empty() {
            return Err(Error::EmptyChannelId);
        }

        let config_envelope: ConfigEnvelope = codec::decode(&payload.data)?;
        let config = config_envelope
            .config
            .as_ref()
            .ok_or(Error::MissingChannelGroup)?;
        let channel_group = config
            .channel_group()
            .cloned()
            .ok_or(Error::MissingChannelGroup)?;

        let orderer_config = OrdererConfig::from_channel_group(&channel_group)?;
        let consortiums_config = ConsortiumsConfig::from_channel_group(&channel_group)?;

        Ok(StandardManager {
            chain_id: channel_header.channel_id.clone(),
            sequence: config.sequence,
            config_envelope,
            channel_group,
            orderer_config,
            consortiums_config,
        })
    }
}

impl ConfigManager for StandardManager {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn orderer_config(&self) -> &OrdererConfig {
        &self.orderer_config
    }

    fn consortiums_config(&self) -> Option<&ConsortiumsConfig> {
        self.consortiums_config.as_ref()
    }

    fn config_envelope(&self) -> &ConfigEnvelope {
        &self.config_envelope
    }

    fn channel_group(&self) -> &Arc<ConfigGroup> {
        &self.channel_group
    }
}

/// builds [`StandardManager`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardConfigEngine;

impl ConfigEngine for StandardConfigEngine {
    fn new_manager(&self, config_tx: &Envelope) -> Result<Arc<dyn ConfigManager>, Error> {
        Ok(Arc::new(StandardManager::new(config_tx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::{create_signed_envelope, Ed25519Signer},
        genesis::GenesisProfile,
    };
    use orderer_lib::interfaces::{keys, Config, ConfigValue, ConsensusType};
    use std::time::Duration;

    #[test]
    fn system_channel_exposes_consortiums() {
        let signer = Ed25519Signer::generate();
        let profile =
            GenesisProfile::system("ordering-system").with_consortium("SampleConsortium", &["Org1"]);
        let manager = StandardManager::new(&profile.config_tx(&signer).unwrap()).unwrap();

        assert_eq!(manager.chain_id(), "ordering-system");
        assert_eq!(manager.sequence(), 0);
        assert_eq!(manager.orderer_config().consensus_type(), "solo");
        assert_eq!(
            manager.orderer_config().batch_timeout(),
            Duration::from_millis(profile.batch_timeout_ms)
        );
        let consortiums = manager.consortiums_config().unwrap();
        let consortium = consortiums.consortium("SampleConsortium").unwrap();
        assert_eq!(consortium.organizations(), ["Org1".to_owned()]);
    }

    #[test]
    fn standard_channel_has_no_consortiums() {
        let signer = Ed25519Signer::generate();
        let profile = GenesisProfile::standard("mychannel");
        let manager = StandardConfigEngine
            .new_manager(&profile.config_tx(&signer).unwrap())
            .unwrap();
        assert_eq!(manager.chain_id(), "mychannel");
        assert!(manager.consortiums_config().is_none());
    }

    #[test]
    fn rejects_other_transactions() {
        let signer = Ed25519Signer::generate();
        let envelope = create_signed_envelope(
            HeaderType::Message,
            "mychannel",
            &signer,
            &ConfigEnvelope::default(),
            0,
            0,
        )
        .unwrap();
        assert!(matches!(
            StandardManager::new(&envelope),
            Err(Error::WrongHeaderType(HeaderType::Message))
        ));
    }

    #[test]
    fn rejects_missing_channel_group() {
        let signer = Ed25519Signer::generate();
        let envelope = create_signed_envelope(
            HeaderType::Config,
            "mychannel",
            &signer,
            &ConfigEnvelope {
                config: Some(Config::default()),
                last_update: None,
            },
            0,
            0,
        )
        .unwrap();
        assert!(matches!(
            StandardManager::new(&envelope),
            Err(Error::MissingChannelGroup)
        ));
    }

    #[test]
    fn rejects_missing_consensus_type() {
        let signer = Ed25519Signer::generate();
        let channel_group = ConfigGroup::new().with_group(keys::ORDERER_GROUP, ConfigGroup::new());
        let envelope = create_signed_envelope(
            HeaderType::Config,
            "mychannel",
            &signer,
            &ConfigEnvelope {
                config: Some(Config {
                    sequence: 0,
                    channel_group: Some(Arc::new(channel_group)),
                }),
                last_update: None,
            },
            0,
            0,
        )
        .unwrap();
        assert!(matches!(
            StandardManager::new(&envelope),
            Err(Error::MissingValue {
                key: keys::CONSENSUS_TYPE,
                ..
            })
        ));

        let channel_group = ConfigGroup::new().with_group(
            keys::ORDERER_GROUP,
            ConfigGroup::new().with_value(
                keys::CONSENSUS_TYPE,
                ConfigValue::encode(&ConsensusType {
                    consensus_type: "kafka".to_owned(),
                })
                .unwrap(),
            ),
        );
        let envelope = create_signed_envelope(
            HeaderType::Config,
            "mychannel",
            &signer,
            &ConfigEnvelope {
                config: Some(Config {
                    sequence: 4,
                    channel_group: Some(Arc::new(channel_group)),
                }),
                last_update: None,
            },
            0,
            0,
        )
        .unwrap();
        let manager = StandardManager::new(&envelope).unwrap();
        assert_eq!(manager.orderer_config().consensus_type(), "kafka");
        assert_eq!(manager.sequence(), 4);
        assert_eq!(
            manager.orderer_config().batch_size(),
            &crate::configtx::DEFAULT_BATCH_SIZE
        );
    }
}
