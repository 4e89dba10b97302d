use super::{Chain, Consenter, ConsenterSupport, Consenters, Error};
use orderer_lib::interfaces::Envelope;
use std::sync::{Arc, Mutex};

/// consenter whose chains only record the order in which they are
/// started
#[derive(Clone, Default)]
pub struct RecordingConsenter {
    pub started: Arc<Mutex<Vec<String>>>,
}

impl RecordingConsenter {
    pub const CONSENSUS_TYPE: &'static str = "solo";

    pub fn consenters(&self) -> Consenters {
        let mut consenters = Consenters::new();
        consenters.insert(
            Self::CONSENSUS_TYPE.to_owned(),
            Arc::new(self.clone()) as Arc<dyn Consenter>,
        );
        consenters
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

struct RecordingChain {
    channel_id: String,
    started: Arc<Mutex<Vec<String>>>,
}

impl Consenter for RecordingConsenter {
    fn handle_chain(&self, support: Arc<dyn ConsenterSupport>) -> Result<Box<dyn Chain>, Error> {
        Ok(Box::new(RecordingChain {
            channel_id: support.chain_id().to_owned(),
            started: Arc::clone(&self.started),
        }))
    }
}

impl Chain for RecordingChain {
    fn start(&self) {
        self.started.lock().unwrap().push(self.channel_id.clone());
    }

    fn enqueue(&self, _envelope: Envelope) -> bool {
        true
    }

    fn halt(&self) {}
}
