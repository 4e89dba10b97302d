//! Wire level interfaces shared by the orderer node and its tooling:
//! envelopes, blocks and the recursive configuration tree.

pub mod codec;
pub mod interfaces;
