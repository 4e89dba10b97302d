use super::{
    config_tx_from_manager, manager::Registry, CreationError, LedgerResources, SupportError,
    EPOCH, MSG_VERSION,
};
use crate::{
    configtx::{ConsortiumsConfig, OrdererConfig},
    consensus::{self, Chain, ConsenterSupport, Consenters},
    crypto::{create_signed_envelope, LocalSigner},
    ledger::{self, ReadWriter as _, Reader as _},
};
use orderer_lib::{
    codec,
    interfaces::{
        Block, BlockMetadataIndex, ConfigEnvelope, Envelope, HeaderType, LastConfig, Metadata,
        MetadataSignature,
    },
};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChainKind {
    /// the channel holding the consortiums
    System,
    Standard,
}

/// writes the blocks of one channel: the only path to its ledger
///
/// The writer of the system channel also holds the registry: the channel
/// creation requests it orders are planned before the block is written
/// and the channels are admitted once it is.
pub(crate) struct BlockWriter {
    resources: LedgerResources,
    signer: Arc<dyn LocalSigner>,
    // number of the latest configuration block, also serializes writers
    last_config: Mutex<u64>,
    registry: Option<Weak<Registry>>,
}

impl BlockWriter {
    pub(crate) fn new(
        resources: LedgerResources,
        signer: Arc<dyn LocalSigner>,
        last_config: u64,
    ) -> Self {
        BlockWriter {
            resources,
            signer,
            last_config: Mutex::new(last_config),
            registry: None,
        }
    }

    pub(crate) fn with_registry(mut self, registry: Weak<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub(crate) fn write(
        &self,
        batch: Vec<Envelope>,
        is_config: bool,
    ) -> Result<Block, consensus::Error> {
        let registry = self.registry.as_ref().and_then(Weak::upgrade);
        let (batch, planned) = match &registry {
            Some(registry) => self.plan_channels(registry, batch),
            None => (batch, Vec::new()),
        };

        let block = self.append(batch, is_config)?;

        if let Some(registry) = registry {
            for config_tx in planned {
                if let Err(error) = registry.admit_channel(config_tx) {
                    tracing::warn!("cannot create the ordered channel: {}", error);
                }
            }
        }
        Ok(block)
    }

    fn append(&self, batch: Vec<Envelope>, is_config: bool) -> Result<Block, consensus::Error> {
        let mut last_config = self
            .last_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let store = self.resources.ledger();

        let mut block = ledger::create_next_block(&**store, &batch)?;
        let index = if is_config {
            block.number()
        } else {
            *last_config
        };
        self.sign_last_config(&mut block, index)?;
        store.append(block.clone())?;

        *last_config = index;
        Ok(block)
    }

    /// replace the channel creation requests of the batch by the signed
    /// configuration transactions of the new channels. Rejected requests
    /// are dropped.
    fn plan_channels(
        &self,
        registry: &Registry,
        batch: Vec<Envelope>,
    ) -> (Vec<Envelope>, Vec<Envelope>) {
        let system_channel_id = self.resources.config().chain_id();
        let mut ordered = Vec::with_capacity(batch.len());
        let mut planned = Vec::new();
        let mut planned_ids = HashSet::new();

        for envelope in batch {
            let channel_id = match creation_target(system_channel_id, &envelope) {
                Some(channel_id) => channel_id,
                None => {
                    ordered.push(envelope);
                    continue;
                }
            };
            if registry.get_chain(&channel_id).is_some() || planned_ids.contains(&channel_id) {
                tracing::warn!("rejecting the creation of the existing channel {}", channel_id);
                continue;
            }
            match self.plan_channel(registry, &envelope) {
                Ok((orderer_tx, config_tx)) => {
                    tracing::debug!("ordering the creation of channel {}", channel_id);
                    ordered.push(orderer_tx);
                    planned.push(config_tx);
                    planned_ids.insert(channel_id);
                }
                Err(error) => {
                    tracing::warn!("rejecting the creation of channel {}: {}", channel_id, error)
                }
            }
        }

        (ordered, planned)
    }

    fn plan_channel(
        &self,
        registry: &Registry,
        request: &Envelope,
    ) -> Result<(Envelope, Envelope), CreationError> {
        let config = registry.plan_channel(self.resources.config(), request)?;
        let config_tx =
            config_tx_from_manager(&*config, &*self.signer).map_err(CreationError::Signing)?;
        let orderer_tx = create_signed_envelope(
            HeaderType::OrdererTransaction,
            self.resources.config().chain_id(),
            &*self.signer,
            &config_tx,
            MSG_VERSION,
            EPOCH,
        )
        .map_err(CreationError::Signing)?;
        Ok((orderer_tx, config_tx))
    }

    fn sign_last_config(&self, block: &mut Block, index: u64) -> Result<(), consensus::Error> {
        let value = codec::encode(&LastConfig { index })?;
        let signature_header = codec::encode(&self.signer.new_signature_header()?)?;

        let mut message = value.clone();
        message.extend_from_slice(&signature_header);
        message.extend_from_slice(&codec::encode(&block.header)?);
        let signature = self.signer.sign(&message)?;

        block.metadata.set(
            BlockMetadataIndex::LastConfig,
            &Metadata {
                value,
                signatures: vec![MetadataSignature {
                    signature_header,
                    signature,
                }],
            },
        )?;
        Ok(())
    }
}

impl ConsenterSupport for BlockWriter {
    fn chain_id(&self) -> &str {
        self.resources.config().chain_id()
    }

    fn shared_config(&self) -> &OrdererConfig {
        self.resources.config().shared_config()
    }

    fn height(&self) -> u64 {
        self.resources.ledger().height()
    }

    fn write_block(&self, batch: Vec<Envelope>) -> Result<Block, consensus::Error> {
        self.write(batch, false)
    }
}

/// the channel a configuration update addressed to another channel than
/// the system channel asks to create
fn creation_target(system_channel_id: &str, envelope: &Envelope) -> Option<String> {
    let payload = envelope.decode_payload().ok()?;
    let channel_header = payload.channel_header()?;
    if channel_header.header_type == HeaderType::ConfigUpdate
        && channel_header.channel_id != system_channel_id
    {
        Some(channel_header.channel_id.clone())
    } else {
        None
    }
}

/// the runtime of one channel: its resources bound to a consenter
pub struct ChainSupport {
    writer: Arc<BlockWriter>,
    chain: Box<dyn Chain>,
    kind: ChainKind,
    started: AtomicBool,
}

impl ChainSupport {
    pub(crate) fn new(
        writer: Arc<BlockWriter>,
        kind: ChainKind,
        consenters: &Consenters,
    ) -> Result<Self, SupportError> {
        let config = writer.resources.config();
        let consensus_type = config.shared_config().consensus_type();
        let consenter =
            consenters
                .get(consensus_type)
                .ok_or_else(|| SupportError::UnknownConsensusType {
                    channel_id: config.chain_id().to_owned(),
                    consensus_type: consensus_type.to_owned(),
                })?;
        let chain = consenter
            .handle_chain(Arc::clone(&writer) as Arc<dyn ConsenterSupport>)
            .map_err(|source| SupportError::Consenter {
                channel_id: config.chain_id().to_owned(),
                source,
            })?;

        Ok(ChainSupport {
            writer,
            chain,
            kind,
            started: AtomicBool::new(false),
        })
    }

    /// start the consenter. A started chain stays started, calling this
    /// again has no effect.
    pub fn start(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("starting chain {}", self.chain_id());
            self.chain.start();
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn halt(&self) {
        self.chain.halt();
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    pub fn chain_id(&self) -> &str {
        self.writer.resources.config().chain_id()
    }

    pub fn resources(&self) -> &LedgerResources {
        &self.writer.resources
    }

    pub fn shared_config(&self) -> &OrdererConfig {
        self.writer.resources.config().shared_config()
    }

    pub fn consortiums_config(&self) -> Option<&ConsortiumsConfig> {
        self.writer.resources.config().consortiums_config()
    }

    pub fn config_envelope(&self) -> &ConfigEnvelope {
        self.writer.resources.config().config_envelope()
    }

    pub fn height(&self) -> u64 {
        self.writer.height()
    }

    /// submit a message to the consenter
    pub fn enqueue(&self, envelope: Envelope) -> bool {
        self.chain.enqueue(envelope)
    }

    /// write a block of ordered messages
    pub fn write_block(&self, batch: Vec<Envelope>) -> Result<Block, consensus::Error> {
        self.writer.write(batch, false)
    }

    pub(crate) fn write_config_block(
        &self,
        config_tx: Envelope,
    ) -> Result<Block, consensus::Error> {
        self.writer.write(vec![config_tx], true)
    }
}
