use super::{ConfigResources, CreationError, EPOCH, MSG_VERSION};
use crate::{
    configtx::{ConfigEngine, ConfigManager},
    crypto::{self, create_signed_envelope, LocalSigner},
    ledger,
};
use orderer_lib::{
    codec,
    interfaces::{
        keys, Config, ConfigEnvelope, ConfigGroup, ConfigPolicy, ConfigUpdate,
        ConfigUpdateEnvelope, ConfigValue, Consortium, Envelope, HeaderType,
    },
};
use std::sync::Arc;

/// plan the configuration of the channel requested by `envelope`
///
/// The request is checked against the consortiums of the system channel,
/// then the new channel inherits the orderer group and the channel level
/// values and policies of the system channel. Nothing is written: the
/// returned manager can be turned into the genesis transaction of the
/// channel with [`config_tx_from_manager`].
pub fn new_channel_config(
    system_channel: &ConfigResources,
    signer: &dyn LocalSigner,
    engine: &dyn ConfigEngine,
    envelope: &Envelope,
) -> Result<Arc<dyn ConfigManager>, CreationError> {
    let payload = envelope.decode_payload().map_err(CreationError::Payload)?;
    let update_envelope: ConfigUpdateEnvelope =
        codec::decode(&payload.data).map_err(CreationError::ConfigUpdateEnvelope)?;
    let update: ConfigUpdate =
        codec::decode(&update_envelope.config_update).map_err(CreationError::ConfigUpdate)?;
    ledger::validate_channel_id(&update.channel_id).map_err(CreationError::InvalidChannelId)?;

    let write_set = update.write_set.as_ref().ok_or(CreationError::EmptyWriteSet)?;
    let proposed_application = write_set
        .group(keys::APPLICATION_GROUP)
        .ok_or(CreationError::MissingApplicationGroup)?;
    if proposed_application.version != 1 {
        return Err(CreationError::ApplicationGroupVersion {
            version: proposed_application.version,
        });
    }

    let consortium: Consortium = write_set
        .value(keys::CONSORTIUM)
        .ok_or(CreationError::MissingConsortiumValue)?
        .decode()
        .map_err(CreationError::ConsortiumValue)?;

    let consortium_config = system_channel
        .consortiums_config()
        .ok_or(CreationError::NotConsortiumCapable)?
        .consortium(&consortium.name)
        .ok_or_else(|| CreationError::UnknownConsortium {
            name: consortium.name.clone(),
        })?;

    let mut application = ConfigGroup::new();
    application.version = proposed_application.version;
    application.mod_policy = keys::CHANNEL_CREATION_POLICY.to_owned();
    application.policies.insert(
        keys::CHANNEL_CREATION_POLICY.to_owned(),
        Arc::new(ConfigPolicy {
            version: 0,
            policy: Some(consortium_config.channel_creation_policy().clone()),
            mod_policy: String::new(),
        }),
    );

    let system_group = system_channel.config_manager().channel_group();
    let members = system_group
        .group(keys::CONSORTIUMS_GROUP)
        .and_then(|consortiums| consortiums.group(&consortium.name))
        .ok_or_else(|| CreationError::UnknownConsortium {
            name: consortium.name.clone(),
        })?;

    if proposed_application.groups.is_empty() && !members.groups.is_empty() {
        return Err(CreationError::NoMembers);
    }
    for organization in proposed_application.groups.keys() {
        let member = members.groups.get(organization).ok_or_else(|| {
            CreationError::NotConsortiumMember {
                organization: organization.clone(),
            }
        })?;
        application
            .groups
            .insert(organization.clone(), Arc::clone(member));
    }

    let mut channel_group = ConfigGroup::new();
    channel_group.values = system_group
        .values
        .iter()
        .filter(|(key, _)| key.as_str() != keys::CONSORTIUM)
        .map(|(key, value)| (key.clone(), Arc::clone(value)))
        .collect();
    channel_group.policies = system_group.policies.clone();
    if let Some(orderer) = system_group.group(keys::ORDERER_GROUP) {
        channel_group
            .groups
            .insert(keys::ORDERER_GROUP.to_owned(), Arc::clone(orderer));
    }
    channel_group
        .groups
        .insert(keys::APPLICATION_GROUP.to_owned(), Arc::new(application));
    channel_group.values.insert(
        keys::CONSORTIUM.to_owned(),
        Arc::new(
            ConfigValue::encode(&Consortium {
                name: consortium.name.clone(),
            })
            .map_err(CreationError::Codec)?
            .with_mod_policy(keys::ORDERER_ADMINS_POLICY_PATH),
        ),
    );

    let config_envelope = ConfigEnvelope {
        config: Some(Config {
            sequence: 0,
            channel_group: Some(Arc::new(channel_group)),
        }),
        last_update: None,
    };
    let config_tx = create_signed_envelope(
        HeaderType::Config,
        &update.channel_id,
        signer,
        &config_envelope,
        MSG_VERSION,
        EPOCH,
    )
    .map_err(CreationError::Signing)?;

    tracing::debug!(
        "planned channel {} for consortium {}",
        update.channel_id,
        consortium.name
    );
    engine
        .new_manager(&config_tx)
        .map_err(CreationError::ConfigManager)
}

/// the signed configuration transaction carrying the configuration of
/// `manager`, ready to be written as the first block of its channel
pub fn config_tx_from_manager(
    manager: &dyn ConfigManager,
    signer: &dyn LocalSigner,
) -> Result<Envelope, crypto::Error> {
    create_signed_envelope(
        HeaderType::Config,
        manager.chain_id(),
        signer,
        manager.config_envelope(),
        MSG_VERSION,
        EPOCH,
    )
}
