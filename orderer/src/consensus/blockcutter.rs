use orderer_lib::interfaces::{BatchSize, Envelope};
use std::mem;

/// accumulates the ordered messages of a channel and cuts them into
/// batches bounded by the channel's batch size
pub(crate) struct BlockCutter {
    batch_size: BatchSize,
    pending: Vec<Envelope>,
    pending_bytes: u64,
}

impl BlockCutter {
    pub(crate) fn new(batch_size: BatchSize) -> Self {
        BlockCutter {
            batch_size,
            pending: Vec::new(),
            pending_bytes: 0,
        }
    }

    /// add the next ordered message and return the batches it completes,
    /// oldest first
    ///
    /// A message above the absolute maximum size is dropped. A message
    /// above the preferred maximum size goes in a batch of its own.
    pub(crate) fn ordered(&mut self, envelope: Envelope) -> Vec<Vec<Envelope>> {
        let size = message_size(&envelope);
        let mut batches = Vec::new();

        if size > u64::from(self.batch_size.absolute_max_bytes) {
            tracing::warn!(
                "dropping a message of {} bytes, above the absolute maximum of {} bytes",
                size,
                self.batch_size.absolute_max_bytes
            );
            return batches;
        }

        let preferred = u64::from(self.batch_size.preferred_max_bytes);
        if size > preferred {
            if !self.is_empty() {
                batches.push(self.cut());
            }
            batches.push(vec![envelope]);
            return batches;
        }

        if self.pending_bytes + size > preferred && !self.is_empty() {
            batches.push(self.cut());
        }

        self.pending_bytes += size;
        self.pending.push(envelope);
        if self.pending.len() >= self.batch_size.max_message_count.max(1) as usize {
            batches.push(self.cut());
        }
        batches
    }

    /// take every pending message
    pub(crate) fn cut(&mut self) -> Vec<Envelope> {
        self.pending_bytes = 0;
        mem::take(&mut self.pending)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn message_size(envelope: &Envelope) -> u64 {
    (envelope.payload.len() + envelope.signature.len()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn batch_size(max_message_count: u32, absolute: u32, preferred: u32) -> BatchSize {
        BatchSize {
            max_message_count,
            absolute_max_bytes: absolute,
            preferred_max_bytes: preferred,
        }
    }

    fn message(len: usize) -> Envelope {
        Envelope {
            payload: vec![0; len],
            signature: vec![1; 2],
        }
    }

    #[test]
    fn cuts_on_message_count() {
        let mut cutter = BlockCutter::new(batch_size(2, 1024, 512));

        assert!(cutter.ordered(message(8)).is_empty());
        assert!(!cutter.is_empty());
        let batches = cutter.ordered(message(8));
        assert_eq!(batches, vec![vec![message(8), message(8)]]);
        assert!(cutter.is_empty());
    }

    #[test]
    fn drops_messages_above_the_absolute_maximum() {
        let mut cutter = BlockCutter::new(batch_size(10, 100, 50));
        cutter.ordered(message(8));

        assert!(cutter.ordered(message(99)).is_empty());
        assert_eq!(cutter.cut(), vec![message(8)]);
    }

    #[test]
    fn isolates_messages_above_the_preferred_maximum() {
        let mut cutter = BlockCutter::new(batch_size(10, 100, 50));
        cutter.ordered(message(8));

        let batches = cutter.ordered(message(60));
        assert_eq!(batches, vec![vec![message(8)], vec![message(60)]]);
        assert!(cutter.is_empty());
    }

    #[test]
    fn cuts_before_overflowing_the_preferred_maximum() {
        let mut cutter = BlockCutter::new(batch_size(10, 100, 50));
        assert!(cutter.ordered(message(28)).is_empty());

        let batches = cutter.ordered(message(28));
        assert_eq!(batches, vec![vec![message(28)]]);
        assert_eq!(cutter.cut(), vec![message(28)]);
    }

    #[quickcheck]
    fn batches_respect_the_batch_size(lengths: Vec<u8>) -> bool {
        let size = batch_size(4, 200, 100);
        let mut cutter = BlockCutter::new(size);
        let mut batches = Vec::new();
        for len in lengths {
            batches.extend(cutter.ordered(message(len as usize)));
        }
        batches.push(cutter.cut());

        batches.iter().all(|batch| {
            let bytes: u64 = batch.iter().map(message_size).sum();
            batch.len() <= size.max_message_count as usize
                && (batch.len() <= 1 || bytes <= u64::from(size.preferred_max_bytes))
                && bytes <= u64::from(size.absolute_max_bytes)
        })
    }
}
