use super::{
    chain_support::BlockWriter, new_channel_config, AdmitError, BootstrapError, ChainKind,
    ChainSupport, ConfigResources, CreationError, LedgerResources, SupportError,
};
use crate::{
    configtx::{ConfigEngine, ConfigManager},
    consensus::Consenters,
    crypto::LocalSigner,
    ledger::{Factory, Reader},
};
use arc_swap::ArcSwap;
use orderer_lib::interfaces::Envelope;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::Span;

type Chains = HashMap<String, Arc<ChainSupport>>;

/// the registry of all the channels of the node
///
/// Readers always see a complete generation of the registry and never
/// block. A new generation is published when a channel is admitted.
pub struct Manager {
    registry: Arc<Registry>,
    system_channel: Arc<ChainSupport>,
}

/// state shared between the manager and the block writer of the system
/// channel, which admits the channels it orders the creation of
pub(crate) struct Registry {
    chains: ArcSwap<Chains>,
    consenters: Consenters,
    ledger_factory: Arc<dyn Factory>,
    signer: Arc<dyn LocalSigner>,
    engine: Arc<dyn ConfigEngine>,
    admission: Mutex<()>,
    span: Span,
}

impl Manager {
    /// load every channel found in the ledger storage and start them
    ///
    /// The standard channels are started as soon as they are loaded, the
    /// system channel only once every channel has been loaded.
    pub fn new(
        ledger_factory: Arc<dyn Factory>,
        consenters: Consenters,
        signer: Arc<dyn LocalSigner>,
        engine: Arc<dyn ConfigEngine>,
        span: Span,
    ) -> Result<Self, BootstrapError> {
        let registry = Arc::new(Registry {
            chains: ArcSwap::from_pointee(Chains::new()),
            consenters,
            ledger_factory,
            signer,
            engine,
            admission: Mutex::new(()),
            span,
        });

        let (chains, system_channel) = registry.span.in_scope(|| {
            let mut chains = Chains::new();
            let mut system_channel = None;
            let loaded = load_chains(&registry, &mut chains, &mut system_channel);
            match loaded.and_then(|()| system_channel.ok_or(BootstrapError::NoSystemChannel)) {
                Ok(system_channel) => Ok((chains, system_channel)),
                Err(error) => {
                    for chain in chains.values() {
                        chain.halt();
                    }
                    Err(error)
                }
            }
        })?;
        registry.chains.store(Arc::new(chains));

        let manager = Manager {
            registry,
            system_channel,
        };

        manager.registry.span.in_scope(|| {
            tracing::info!(
                "starting system channel {} with consensus type {}",
                manager.system_channel_id(),
                manager.system_channel.shared_config().consensus_type()
            );
            manager.system_channel.start();
        });

        Ok(manager)
    }

    pub fn system_channel_id(&self) -> &str {
        self.system_channel.chain_id()
    }

    pub fn system_channel(&self) -> &Arc<ChainSupport> {
        &self.system_channel
    }

    pub fn get_chain(&self, chain_id: &str) -> Option<Arc<ChainSupport>> {
        self.registry.get_chain(chain_id)
    }

    pub fn channels_count(&self) -> usize {
        self.registry.chains.load().len()
    }

    /// sorted identifiers of all the channels
    pub fn channel_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry.chains.load().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// plan the configuration of a new channel against the current
    /// configuration of the system channel
    pub fn new_channel_config(
        &self,
        envelope: &Envelope,
    ) -> Result<Arc<dyn ConfigManager>, CreationError> {
        self.registry
            .plan_channel(self.system_channel.resources().config(), envelope)
    }

    /// write the genesis block of a new channel, start it and publish a
    /// new generation of the registry containing it
    pub fn admit_channel(&self, config_tx: Envelope) -> Result<Arc<ChainSupport>, AdmitError> {
        self.registry.admit_channel(config_tx)
    }

    /// halt the consenters of every channel
    pub fn halt(&self) {
        let _enter = self.registry.span.enter();
        for chain in self.registry.chains.load().values() {
            tracing::debug!("halting chain {}", chain.chain_id());
            chain.halt();
        }
    }
}

impl Registry {
    pub(crate) fn get_chain(&self, chain_id: &str) -> Option<Arc<ChainSupport>> {
        self.chains.load().get(chain_id).cloned()
    }

    pub(crate) fn plan_channel(
        &self,
        system_channel: &ConfigResources,
        envelope: &Envelope,
    ) -> Result<Arc<dyn ConfigManager>, CreationError> {
        self.span.in_scope(|| {
            new_channel_config(system_channel, &*self.signer, &*self.engine, envelope)
        })
    }

    pub(crate) fn admit_channel(
        &self,
        config_tx: Envelope,
    ) -> Result<Arc<ChainSupport>, AdmitError> {
        let _enter = self.span.enter();
        let _admission = self
            .admission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let config = ConfigResources::from_config_tx(&*self.engine, &config_tx)?;
        let channel_id = config.chain_id().to_owned();
        if config.consortiums_config().is_some() {
            return Err(AdmitError::SystemChannelConfig { channel_id });
        }

        let current = self.chains.load_full();
        if current.contains_key(&channel_id) {
            return Err(AdmitError::ChannelExists { channel_id });
        }
        // checked before the ledger is created so a rejected channel
        // leaves no empty ledger behind
        let consensus_type = config.shared_config().consensus_type();
        if !self.consenters.contains_key(consensus_type) {
            return Err(SupportError::UnknownConsensusType {
                channel_id,
                consensus_type: consensus_type.to_owned(),
            }
            .into());
        }

        let resources = LedgerResources::open(config, &*self.ledger_factory)?;
        if resources.ledger().height() != 0 {
            return Err(AdmitError::ChannelExists { channel_id });
        }
        let chain = match self.start_ledger(resources, config_tx, &channel_id) {
            Ok(chain) => chain,
            Err(error) => {
                // an empty ledger would stop the next bootstrap
                if let Err(remove) = self.ledger_factory.remove(&channel_id) {
                    tracing::warn!(
                        "cannot remove the ledger of the rejected channel {}: {}",
                        channel_id,
                        remove
                    );
                }
                return Err(error);
            }
        };

        let mut chains = Chains::clone(&current);
        chains.insert(channel_id.clone(), Arc::clone(&chain));

        tracing::info!("created and starting new channel {}", channel_id);
        chain.start();
        self.chains.store(Arc::new(chains));

        Ok(chain)
    }

    fn start_ledger(
        &self,
        resources: LedgerResources,
        config_tx: Envelope,
        channel_id: &str,
    ) -> Result<Arc<ChainSupport>, AdmitError> {
        let writer = Arc::new(BlockWriter::new(resources, Arc::clone(&self.signer), 0));
        let chain = Arc::new(ChainSupport::new(
            writer,
            ChainKind::Standard,
            &self.consenters,
        )?);
        chain
            .write_config_block(config_tx)
            .map_err(|source| AdmitError::WriteBlock {
                channel_id: channel_id.to_owned(),
                source,
            })?;
        Ok(chain)
    }
}

fn load_chains(
    registry: &Arc<Registry>,
    chains: &mut Chains,
    system_channel: &mut Option<Arc<ChainSupport>>,
) -> Result<(), BootstrapError> {
    let factory = &*registry.ledger_factory;
    for channel_id in factory.channel_ids() {
        let ledger = factory
            .get_or_create(&channel_id)
            .map_err(|source| BootstrapError::Ledger {
                channel_id: channel_id.clone(),
                source,
            })?;
        let (config_tx, last_config) = config_tx(&channel_id, &*ledger)?;

        let config = ConfigResources::from_config_tx(&*registry.engine, &config_tx)?;
        let resources = LedgerResources::open(config, factory)?;
        let chain_id = resources.config().chain_id().to_owned();
        let kind = if resources.config().consortiums_config().is_some() {
            ChainKind::System
        } else {
            ChainKind::Standard
        };

        let writer = BlockWriter::new(resources, Arc::clone(&registry.signer), last_config);
        let writer = match kind {
            ChainKind::System => {
                if let Some(first) = system_channel {
                    return Err(BootstrapError::DuplicateSystemChannel {
                        first: first.chain_id().to_owned(),
                        second: chain_id,
                    });
                }
                writer.with_registry(Arc::downgrade(registry))
            }
            ChainKind::Standard => writer,
        };
        let chain = Arc::new(ChainSupport::new(
            Arc::new(writer),
            kind,
            &registry.consenters,
        )?);
        chains.insert(chain_id.clone(), Arc::clone(&chain));

        match kind {
            ChainKind::System => {
                tracing::debug!("found system channel {}, deferring its start", chain_id);
                *system_channel = Some(chain);
            }
            ChainKind::Standard => {
                tracing::debug!("starting chain {}", chain_id);
                chain.start();
            }
        }
    }
    Ok(())
}

/// the configuration transaction of the latest configuration block of a
/// ledger, with the number of that block
fn config_tx<R: Reader + ?Sized>(
    channel_id: &str,
    ledger: &R,
) -> Result<(Envelope, u64), BootstrapError> {
    let height = ledger.height();
    if height == 0 {
        return Err(BootstrapError::EmptyLedger {
            channel_id: channel_id.to_owned(),
        });
    }
    let read = |number: u64| {
        ledger
            .get_block(number)
            .map_err(|source| BootstrapError::Ledger {
                channel_id: channel_id.to_owned(),
                source,
            })
    };

    let last_block = read(height - 1)?.ok_or_else(|| BootstrapError::BlockNotFound {
        channel_id: channel_id.to_owned(),
        number: height - 1,
    })?;
    let index = last_block
        .last_config_index()
        .map_err(|source| BootstrapError::LastConfig {
            channel_id: channel_id.to_owned(),
            source,
        })?;
    let config_block = read(index)?.ok_or_else(|| BootstrapError::ConfigBlockNotFound {
        channel_id: channel_id.to_owned(),
        index,
    })?;
    let config_tx = config_block
        .envelope(0)
        .map_err(|source| BootstrapError::ConfigTx {
            channel_id: channel_id.to_owned(),
            source,
        })?;

    Ok((config_tx, index))
}
