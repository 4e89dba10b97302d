use crate::{codec, interfaces::Envelope};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block {number} has no envelope at index {index}")]
    NoEnvelope { number: u64, index: usize },
    #[error("block {number} has no `{index:?}` metadata")]
    NoMetadata {
        number: u64,
        index: BlockMetadataIndex,
    },
    #[error("block {number} has malformed data")]
    Malformed {
        number: u64,
        #[source]
        source: codec::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub data: BlockData,
    pub metadata: BlockMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub previous_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
}

/// encoded envelopes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub data: Vec<Vec<u8>>,
}

/// encoded [`Metadata`] entries, indexed by [`BlockMetadataIndex`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    pub metadata: Vec<Vec<u8>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockMetadataIndex {
    Signatures = 0,
    LastConfig = 1,
    TransactionsFilter = 2,
    Orderer = 3,
}

const METADATA_ENTRIES: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub value: Vec<u8>,
    pub signatures: Vec<MetadataSignature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSignature {
    pub signature_header: Vec<u8>,
    pub signature: Vec<u8>,
}

/// the value of the `LastConfig` metadata: the number of the block
/// holding the latest configuration transaction of the channel
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastConfig {
    pub index: u64,
}

impl Default for BlockMetadata {
    fn default() -> Self {
        BlockMetadata {
            metadata: vec![Vec::new(); METADATA_ENTRIES],
        }
    }
}

impl BlockMetadata {
    pub fn get(&self, index: BlockMetadataIndex) -> Option<&[u8]> {
        self.metadata
            .get(index as usize)
            .map(Vec::as_slice)
            .filter(|bytes| !bytes.is_empty())
    }

    pub fn set(&mut self, index: BlockMetadataIndex, metadata: &Metadata) -> Result<(), codec::Error> {
        let index = index as usize;
        if self.metadata.len() <= index {
            self.metadata.resize(index + 1, Vec::new());
        }
        self.metadata[index] = codec::encode(metadata)?;
        Ok(())
    }
}

impl Block {
    pub fn new(number: u64, previous_hash: Vec<u8>) -> Self {
        Block {
            header: BlockHeader {
                number,
                previous_hash,
                data_hash: Vec::new(),
            },
            data: BlockData::default(),
            metadata: BlockMetadata::default(),
        }
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn envelope(&self, index: usize) -> Result<Envelope, BlockError> {
        let number = self.number();
        let bytes = self
            .data
            .data
            .get(index)
            .ok_or(BlockError::NoEnvelope { number, index })?;
        codec::decode(bytes).map_err(|source| BlockError::Malformed { number, source })
    }

    pub fn metadata(&self, index: BlockMetadataIndex) -> Result<Metadata, BlockError> {
        let number = self.number();
        let bytes = self
            .metadata
            .get(index)
            .ok_or(BlockError::NoMetadata { number, index })?;
        codec::decode(bytes).map_err(|source| BlockError::Malformed { number, source })
    }

    /// number of the block holding the channel's latest configuration
    pub fn last_config_index(&self) -> Result<u64, BlockError> {
        let metadata = self.metadata(BlockMetadataIndex::LastConfig)?;
        let last_config: LastConfig =
            codec::decode(&metadata.value).map_err(|source| BlockError::Malformed {
                number: self.number(),
                source,
            })?;
        Ok(last_config.index)
    }

    /// record `index` as the last configuration block, without signatures
    pub fn set_last_config(&mut self, index: u64) -> Result<(), codec::Error> {
        let metadata = Metadata {
            value: codec::encode(&LastConfig { index })?,
            signatures: Vec::new(),
        };
        self.metadata.set(BlockMetadataIndex::LastConfig, &metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_config_is_missing_on_a_fresh_block() {
        let block = Block::new(3, Vec::new());
        assert!(matches!(
            block.last_config_index(),
            Err(BlockError::NoMetadata {
                number: 3,
                index: BlockMetadataIndex::LastConfig
            })
        ));
    }

    #[test]
    fn last_config_is_read_back() {
        let mut block = Block::new(7, Vec::new());
        block.set_last_config(5).unwrap();
        assert_eq!(block.last_config_index().unwrap(), 5);
    }

    #[test]
    fn malformed_last_config() {
        let mut block = Block::new(1, Vec::new());
        block.metadata.metadata[BlockMetadataIndex::LastConfig as usize] = vec![1, 2, 3];
        assert!(matches!(
            block.last_config_index(),
            Err(BlockError::Malformed { number: 1, .. })
        ));
    }

    #[test]
    fn missing_envelope() {
        let block = Block::new(0, Vec::new());
        assert!(matches!(
            block.envelope(0),
            Err(BlockError::NoEnvelope {
                number: 0,
                index: 0
            })
        ));
    }
}
