use crate::codec;
use serde::{Deserialize, Serialize};

/// signed, encoded payload. This is the unit submitted to the orderer
/// and the unit stored in a block's data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub header: Option<Header>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub channel_header: ChannelHeader,
    pub signature_header: SignatureHeader,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderType {
    Message,
    Config,
    ConfigUpdate,
    EndorserTransaction,
    OrdererTransaction,
    DeliverSeekInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub header_type: HeaderType,
    /// message format version
    pub version: i32,
    /// seconds since the unix epoch at creation time
    pub timestamp: u64,
    pub channel_id: String,
    pub tx_id: String,
    pub epoch: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl Envelope {
    pub fn decode_payload(&self) -> Result<Payload, codec::Error> {
        codec::decode(&self.payload)
    }
}

impl Payload {
    pub fn channel_header(&self) -> Option<&ChannelHeader> {
        self.header.as_ref().map(|header| &header.channel_header)
    }
}
