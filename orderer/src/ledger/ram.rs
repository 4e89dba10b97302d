use super::{validate_channel_id, Error, Factory, ReadWriter, Reader};
use orderer_lib::interfaces::Block;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

#[derive(Default)]
pub struct RamLedger {
    blocks: RwLock<Vec<Block>>,
}

impl RamLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reader for RamLedger {
    fn height(&self) -> u64 {
        self.blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len() as u64
    }

    fn get_block(&self, number: u64) -> Result<Option<Block>, Error> {
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(usize::try_from(number)
            .ok()
            .and_then(|number| blocks.get(number))
            .cloned())
    }
}

impl ReadWriter for RamLedger {
    fn append(&self, block: Block) -> Result<(), Error> {
        let mut blocks = self.blocks.write().unwrap_or_else(PoisonError::into_inner);
        let expected = blocks.len() as u64;
        if block.number() != expected {
            return Err(Error::OutOfOrder {
                expected,
                got: block.number(),
            });
        }
        blocks.push(block);
        Ok(())
    }
}

/// keeps every ledger in memory, nothing survives a restart
#[derive(Default)]
pub struct RamLedgerFactory {
    ledgers: Mutex<HashMap<String, Arc<RamLedger>>>,
}

impl RamLedgerFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Factory for RamLedgerFactory {
    fn channel_ids(&self) -> Vec<String> {
        let ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = ledgers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get_or_create(&self, channel_id: &str) -> Result<Arc<dyn ReadWriter>, Error> {
        validate_channel_id(channel_id)?;
        let mut ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        let ledger = ledgers
            .entry(channel_id.to_owned())
            .or_insert_with(|| Arc::new(RamLedger::new()));
        Ok(Arc::clone(ledger) as Arc<dyn ReadWriter>)
    }

    fn remove(&self, channel_id: &str) -> Result<(), Error> {
        self.ledgers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(channel_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get() {
        let ledger = RamLedger::new();
        assert_eq!(ledger.height(), 0);
        assert!(ledger.get_block(0).unwrap().is_none());

        ledger.append(Block::new(0, Vec::new())).unwrap();
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.get_block(0).unwrap().unwrap().number(), 0);
        assert!(ledger.get_block(1).unwrap().is_none());
    }

    #[test]
    fn append_out_of_order() {
        let ledger = RamLedger::new();
        assert!(matches!(
            ledger.append(Block::new(1, Vec::new())),
            Err(Error::OutOfOrder {
                expected: 0,
                got: 1
            })
        ));
    }

    #[test]
    fn factory_returns_the_same_ledger() {
        let factory = RamLedgerFactory::new();
        assert!(factory.channel_ids().is_empty());

        let first = factory.get_or_create("mychannel").unwrap();
        first.append(Block::new(0, Vec::new())).unwrap();
        let second = factory.get_or_create("mychannel").unwrap();
        assert_eq!(second.height(), 1);
        factory.get_or_create("another").unwrap();

        assert_eq!(factory.channel_ids(), vec!["another", "mychannel"]);
    }

    #[test]
    fn removed_ledger_starts_over() {
        let factory = RamLedgerFactory::new();
        let ledger = factory.get_or_create("mychannel").unwrap();
        ledger.append(Block::new(0, Vec::new())).unwrap();

        factory.remove("mychannel").unwrap();
        factory.remove("unknown").unwrap();
        assert!(factory.channel_ids().is_empty());
        assert_eq!(factory.get_or_create("mychannel").unwrap().height(), 0);
    }
}
