mod error;

pub use self::error::{Error, ErrorKind};
use crate::{
    crypto::{Ed25519Signer, LocalSigner},
    genesis::GenesisProfile,
    ledger::{Factory, FileLedgerFactory, RamLedgerFactory, ReadWriter as _},
    settings::Settings,
};
use std::sync::Arc;
use tracing::{span, Level};

/// prepare the ledger storage from the given settings
pub fn prepare_ledger(settings: &Settings) -> Result<Arc<dyn Factory>, Error> {
    let span = span!(Level::TRACE, "sub_task", kind = "storage");
    let _enter = span.enter();
    if let Some(dir) = &settings.storage {
        std::fs::create_dir_all(dir).map_err(|source| Error::Io {
            source,
            reason: ErrorKind::LedgerStorage,
        })?;

        tracing::info!("storing ledgers in '{:?}'", dir);

        Ok(Arc::new(FileLedgerFactory::new(dir)?))
    } else {
        tracing::info!("storing ledgers in memory");
        Ok(Arc::new(RamLedgerFactory::new()))
    }
}

pub fn load_signer(settings: &Settings) -> Result<Arc<dyn LocalSigner>, Error> {
    let signer = match &settings.signer_key {
        Some(path) => Ed25519Signer::from_file(path)?,
        None => Ed25519Signer::generate(),
    };
    tracing::info!(
        "signing as {}",
        hex::encode(signer.verifying_key().as_bytes())
    );
    Ok(Arc::new(signer))
}

/// write the first block of the system channel when the storage holds
/// no channel yet
pub fn bootstrap_genesis(
    factory: &dyn Factory,
    genesis: Option<&GenesisProfile>,
    signer: &dyn LocalSigner,
) -> Result<(), Error> {
    let span = span!(Level::TRACE, "sub_task", kind = "genesis");
    let _enter = span.enter();

    if !factory.channel_ids().is_empty() {
        if genesis.is_some() {
            tracing::debug!("the storage already holds channels, ignoring the genesis profile");
        }
        return Ok(());
    }

    let profile = genesis.ok_or(Error::ExpectedGenesis)?;
    let block = profile.block(signer)?;
    factory.get_or_create(&profile.channel_id)?.append(block)?;
    tracing::info!("wrote the genesis block of channel {}", profile.channel_id);
    Ok(())
}
