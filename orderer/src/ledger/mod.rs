//! Append-only, per channel block storage.
//!
//! Two backends are provided: [`RamLedgerFactory`] keeps every block in
//! memory and [`FileLedgerFactory`] keeps one directory per channel.

mod file;
mod ram;

pub use self::{
    file::{FileLedger, FileLedgerFactory},
    ram::{RamLedger, RamLedgerFactory},
};
use orderer_lib::{
    codec,
    interfaces::{Block, BlockData, BlockHeader, Envelope},
};
use sha2::{Digest, Sha256};
use std::{io, path::PathBuf, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("block {got} cannot be appended, expected block number {expected}")]
    OutOfOrder { expected: u64, got: u64 },
    #[error("`{0}` is not a valid channel identifier")]
    InvalidChannelId(String),
    #[error("I/O error with the ledger file `{}`", .path.to_string_lossy())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed ledger content")]
    Codec(#[from] codec::Error),
}

pub trait Reader: Send + Sync {
    /// number of blocks in the ledger
    fn height(&self) -> u64;

    /// `Ok(None)` if there is no block with the given number
    fn get_block(&self, number: u64) -> Result<Option<Block>, Error>;
}

pub trait ReadWriter: Reader {
    /// append the block on top of the ledger. The block number must
    /// be the current height.
    fn append(&self, block: Block) -> Result<(), Error>;
}

pub trait Factory: Send + Sync {
    /// identifiers of every channel which has a ledger
    fn channel_ids(&self) -> Vec<String>;

    fn get_or_create(&self, channel_id: &str) -> Result<Arc<dyn ReadWriter>, Error>;

    /// drop the ledger of the channel and everything it stores. Removing
    /// an unknown channel is not an error.
    fn remove(&self, channel_id: &str) -> Result<(), Error>;
}

/// build the block following the current top of the ledger, holding the
/// given envelopes. Metadata are left empty.
pub fn create_next_block<R>(reader: &R, envelopes: &[Envelope]) -> Result<Block, Error>
where
    R: Reader + ?Sized,
{
    let height = reader.height();
    let previous_hash = match height.checked_sub(1) {
        None => Vec::new(),
        Some(top) => match reader.get_block(top)? {
            Some(block) => block_header_hash(&block.header)?,
            None => Vec::new(),
        },
    };

    let data = BlockData {
        data: envelopes
            .iter()
            .map(codec::encode)
            .collect::<Result<_, _>>()?,
    };

    let mut block = Block::new(height, previous_hash);
    block.header.data_hash = block_data_hash(&data);
    block.data = data;
    Ok(block)
}

pub fn block_header_hash(header: &BlockHeader) -> Result<Vec<u8>, Error> {
    let bytes = codec::encode(header)?;
    Ok(Sha256::digest(&bytes).to_vec())
}

pub fn block_data_hash(data: &BlockData) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for envelope in &data.data {
        hasher.update(envelope);
    }
    hasher.finalize().to_vec()
}

/// read the top block of the ledger
pub fn last_block<R>(reader: &R) -> Result<Option<Block>, Error>
where
    R: Reader + ?Sized,
{
    match reader.height().checked_sub(1) {
        None => Ok(None),
        Some(top) => reader.get_block(top),
    }
}

/// channel identifiers become directory names: only lower case ASCII
/// alphanumerics, `.`, `_` and `-` are accepted, starting with a letter
pub(crate) fn validate_channel_id(channel_id: &str) -> Result<(), Error> {
    let mut chars = channel_id.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_' || c == '-'
        })
        && channel_id.len() <= 249;
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidChannelId(channel_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_block_is_chained() {
        let ledger = RamLedger::new();
        let envelope = Envelope {
            payload: vec![1, 2, 3],
            signature: vec![4],
        };

        let genesis = create_next_block(&ledger, &[envelope.clone()]).unwrap();
        assert_eq!(genesis.number(), 0);
        assert!(genesis.header.previous_hash.is_empty());
        ledger.append(genesis.clone()).unwrap();

        let next = create_next_block(&ledger, &[envelope.clone(), envelope]).unwrap();
        assert_eq!(next.number(), 1);
        assert_eq!(
            next.header.previous_hash,
            block_header_hash(&genesis.header).unwrap()
        );
        assert_eq!(next.header.data_hash, block_data_hash(&next.data));
        assert_eq!(next.data.data.len(), 2);
    }

    #[test]
    fn channel_id_validation() {
        assert!(validate_channel_id("ordering-system").is_ok());
        assert!(validate_channel_id("testchannel.v2_1").is_ok());
        assert!(validate_channel_id("").is_err());
        assert!(validate_channel_id("../escape").is_err());
        assert!(validate_channel_id("Upper").is_err());
        assert!(validate_channel_id("9lives").is_err());
    }
}
