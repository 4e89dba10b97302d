use super::{blockcutter::BlockCutter, Chain, Consenter, ConsenterSupport, Error};
use orderer_lib::interfaces::Envelope;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::{
    runtime::Handle,
    sync::mpsc,
    task,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{span, Instrument as _, Level};

/// single node consensus: messages are ordered in the order they are
/// enqueued and cut into blocks by count, by size or by timeout
pub struct Solo {
    runtime: Handle,
}

impl Solo {
    pub const CONSENSUS_TYPE: &'static str = "solo";

    pub fn new(runtime: Handle) -> Self {
        Solo { runtime }
    }
}

impl Consenter for Solo {
    fn handle_chain(&self, support: Arc<dyn ConsenterSupport>) -> Result<Box<dyn Chain>, Error> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Box::new(SoloChain {
            support,
            runtime: self.runtime.clone(),
            sender,
            receiver: Mutex::new(Some(receiver)),
            halted: CancellationToken::new(),
        }))
    }
}

struct SoloChain {
    support: Arc<dyn ConsenterSupport>,
    runtime: Handle,
    sender: mpsc::UnboundedSender<Envelope>,
    // taken by the task on start
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
    halted: CancellationToken,
}

impl Chain for SoloChain {
    fn start(&self) {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(receiver) = receiver {
            let span = span!(
                Level::TRACE,
                "sub_task",
                kind = "solo",
                channel = self.support.chain_id()
            );
            self.runtime.spawn(
                run(Arc::clone(&self.support), receiver, self.halted.clone()).instrument(span),
            );
        }
    }

    fn enqueue(&self, envelope: Envelope) -> bool {
        !self.halted.is_cancelled() && self.sender.send(envelope).is_ok()
    }

    fn halt(&self) {
        self.halted.cancel();
    }
}

async fn run(
    support: Arc<dyn ConsenterSupport>,
    mut queue: mpsc::UnboundedReceiver<Envelope>,
    halted: CancellationToken,
) {
    let mut cutter = BlockCutter::new(*support.shared_config().batch_size());
    let mut deadline: Option<Instant> = None;

    tracing::debug!("solo chain started at height {}", support.height());

    loop {
        let timer = sleep_until(deadline.unwrap_or_else(Instant::now));
        tokio::select! {
            _ = halted.cancelled() => {
                tracing::debug!("solo chain halted");
                break;
            }
            envelope = queue.recv() => match envelope {
                None => break,
                Some(envelope) => {
                    for batch in cutter.ordered(envelope) {
                        write(&support, batch).await;
                    }
                    if cutter.is_empty() {
                        deadline = None;
                    } else if deadline.is_none() {
                        deadline = Some(Instant::now() + support.shared_config().batch_timeout());
                    }
                }
            },
            _ = timer, if deadline.is_some() => {
                write(&support, cutter.cut()).await;
                deadline = None;
            }
        }
    }
}

/// write the batch from the blocking pool, the ledger does file I/O
async fn write(support: &Arc<dyn ConsenterSupport>, batch: Vec<Envelope>) {
    if batch.is_empty() {
        return;
    }
    let count = batch.len();
    let support = Arc::clone(support);
    match task::spawn_blocking(move || support.write_block(batch)).await {
        Ok(Ok(block)) => tracing::debug!("block {} cut with {} messages", block.number(), count),
        Ok(Err(error)) => tracing::error!("cannot write block: {}", error),
        Err(error) => tracing::error!("block writing task failed: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        configtx::{ConfigManager, OrdererConfig, StandardManager},
        crypto::Ed25519Signer,
        genesis::GenesisProfile,
    };
    use orderer_lib::interfaces::Block;
    use std::{
        sync::atomic::{AtomicU64, Ordering},
        time::Duration,
    };

    struct ForwardingSupport {
        config: OrdererConfig,
        height: AtomicU64,
        written: mpsc::UnboundedSender<Vec<Envelope>>,
    }

    impl ConsenterSupport for ForwardingSupport {
        fn chain_id(&self) -> &str {
            "mychannel"
        }

        fn shared_config(&self) -> &OrdererConfig {
            &self.config
        }

        fn height(&self) -> u64 {
            self.height.load(Ordering::SeqCst)
        }

        fn write_block(&self, batch: Vec<Envelope>) -> Result<Block, Error> {
            let number = self.height.fetch_add(1, Ordering::SeqCst);
            self.written.send(batch).unwrap();
            Ok(Block::new(number, Vec::new()))
        }
    }

    fn chain(
        max_message_count: u32,
        batch_timeout_ms: u64,
    ) -> (Box<dyn Chain>, mpsc::UnboundedReceiver<Vec<Envelope>>) {
        let mut profile = GenesisProfile::standard("mychannel");
        profile.max_message_count = max_message_count;
        profile.batch_timeout_ms = batch_timeout_ms;
        let manager = StandardManager::new(&profile.config_tx(&Ed25519Signer::generate()).unwrap())
            .unwrap();

        let (written, receiver) = mpsc::unbounded_channel();
        let support = Arc::new(ForwardingSupport {
            config: manager.orderer_config().clone(),
            height: AtomicU64::new(1),
            written,
        });
        let chain = Solo::new(Handle::current()).handle_chain(support).unwrap();
        (chain, receiver)
    }

    fn envelope(byte: u8) -> Envelope {
        Envelope {
            payload: vec![byte],
            signature: Vec::new(),
        }
    }

    #[tokio::test]
    async fn cuts_on_message_count() {
        let (chain, mut written) = chain(2, 60_000);
        chain.start();
        for byte in 0..4 {
            assert!(chain.enqueue(envelope(byte)));
        }

        let first = tokio::time::timeout(Duration::from_secs(5), written.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, vec![envelope(0), envelope(1)]);
        let second = tokio::time::timeout(Duration::from_secs(5), written.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second, vec![envelope(2), envelope(3)]);
        chain.halt();
    }

    #[tokio::test]
    async fn cuts_on_timeout() {
        let (chain, mut written) = chain(10, 20);
        chain.start();
        assert!(chain.enqueue(envelope(7)));

        let batch = tokio::time::timeout(Duration::from_secs(5), written.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch, vec![envelope(7)]);
        chain.halt();
    }

    #[tokio::test]
    async fn large_messages_get_their_own_block() {
        let (chain, mut written) = chain(10, 60_000);
        chain.start();
        let large = Envelope {
            payload: vec![0; 600 * 1024],
            signature: Vec::new(),
        };
        assert!(chain.enqueue(envelope(1)));
        assert!(chain.enqueue(large.clone()));
        assert!(chain.enqueue(envelope(2)));

        for expected in [vec![envelope(1)], vec![large]] {
            let batch = tokio::time::timeout(Duration::from_secs(5), written.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(batch, expected);
        }
        chain.halt();
    }

    #[tokio::test]
    async fn halted_chain_refuses_messages() {
        let (chain, _written) = chain(10, 20);
        chain.start();
        chain.halt();
        assert!(!chain.enqueue(envelope(1)));
    }
}
