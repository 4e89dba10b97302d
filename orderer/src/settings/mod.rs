//! Settings of the node, from the command line and the configuration file.

mod command_arguments;
pub mod config;
pub mod logging;

pub use self::command_arguments::CommandLine;
use self::{config::Config, logging::LogSettings};
use crate::genesis::GenesisProfile;
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot read the file `{}`", .path.to_string_lossy())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error while parsing the node configuration file")]
    Config(#[source] serde_yaml::Error),
    #[error("Error while parsing the genesis profile")]
    Genesis(#[source] serde_yaml::Error),
}

/// Overall Settings for node
#[derive(Debug)]
pub struct Settings {
    pub storage: Option<PathBuf>,
    pub genesis: Option<GenesisProfile>,
    pub signer_key: Option<PathBuf>,
}

pub struct RawSettings {
    command_line: CommandLine,
    config: Option<Config>,
}

fn open(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl RawSettings {
    pub fn load(command_line: CommandLine) -> Result<Self, Error> {
        let config = match &command_line.node_config {
            Some(node_config) => {
                Some(serde_yaml::from_reader(open(node_config)?).map_err(Error::Config)?)
            }
            None => None,
        };
        Ok(Self {
            command_line,
            config,
        })
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(
            &self.command_line.log,
            self.config.as_ref().and_then(|cfg| cfg.log.as_ref()),
        )
    }

    pub fn storage_check(&self) -> bool {
        self.command_line.storage_check
    }

    /// Load the settings
    /// - from the command arguments
    /// - from the config
    ///
    /// the command line arguments take precedence.
    pub fn try_into_settings(self) -> Result<Settings, Error> {
        let RawSettings {
            command_line,
            config,
        } = self;

        let storage = command_line
            .storage
            .or_else(|| config.as_ref().and_then(|cfg| cfg.storage.clone()));

        let genesis = match &command_line.genesis {
            Some(path) => Some(serde_yaml::from_reader(open(path)?).map_err(Error::Genesis)?),
            None => config.as_ref().and_then(|cfg| cfg.genesis.clone()),
        };

        let signer_key = command_line
            .signer_key
            .or_else(|| config.as_ref().and_then(|cfg| cfg.signer_key.clone()));
        if signer_key.is_none() {
            tracing::warn!("no signer key configured, the node signs with an ephemeral key");
        }

        Ok(Settings {
            storage,
            genesis,
            signer_key,
        })
    }
}
