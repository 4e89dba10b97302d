//! messages carried, encoded, by [`ConfigValue`]s and [`ConfigPolicy`]s.
//!
//! [`ConfigValue`]: super::ConfigValue
//! [`ConfigPolicy`]: super::ConfigPolicy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// the name of the consortium a channel belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consortium {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusType {
    pub consensus_type: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSize {
    pub max_message_count: u32,
    pub absolute_max_bytes: u32,
    pub preferred_max_bytes: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTimeout {
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingAlgorithm {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererAddresses {
    pub addresses: Vec<String>,
}

/// identity configuration of an organization. The content of `config`
/// is opaque to the orderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MspConfig {
    pub name: String,
    pub config: Vec<u8>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyType {
    Unknown,
    Signature,
    Msp,
    ImplicitMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub policy_type: PolicyType,
    /// encoded policy, its format depends on `policy_type`
    pub value: Vec<u8>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImplicitMetaRule {
    Any,
    All,
    Majority,
}

/// a policy evaluated against the same named policy of the sub-groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplicitMetaPolicy {
    pub sub_policy: String,
    pub rule: ImplicitMetaRule,
}
