use super::logging::FileSettings;
use crate::genesis::GenesisProfile;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub storage: Option<PathBuf>,
    pub log: Option<FileSettings>,
    /// profile of the system channel written to an empty storage
    pub genesis: Option<GenesisProfile>,
    pub signer_key: Option<PathBuf>,
}
