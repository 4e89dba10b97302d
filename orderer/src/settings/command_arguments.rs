use super::logging::CliSettings;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "orderer")]
pub struct CommandLine {
    /// Set the node config (in YAML format) to use as general configuration
    #[structopt(long = "config", parse(from_os_str))]
    pub node_config: Option<PathBuf>,

    /// Path to the ledger storage directory, one sub-directory per channel.
    /// Without storage the ledgers are kept in memory.
    #[structopt(long = "storage", parse(from_os_str))]
    pub storage: Option<PathBuf>,

    /// Genesis profile (in YAML format) of the system channel, used to
    /// write its first block when the storage holds no channel
    #[structopt(long = "genesis", parse(from_os_str))]
    pub genesis: Option<PathBuf>,

    /// File holding the hex encoded seed of the signing key of the node.
    /// A fresh key is generated when absent.
    #[structopt(long = "signer-key", parse(from_os_str))]
    pub signer_key: Option<PathBuf>,

    /// Load the channels from the storage and exit.
    #[structopt(long = "storage-check")]
    pub storage_check: bool,

    #[structopt(flatten)]
    pub log: CliSettings,
}

impl CommandLine {
    /// load the command arguments from the command line args
    ///
    /// on error during reading the command line arguments, the
    /// function will print an error message and will terminate
    /// the process.
    pub fn load() -> Self {
        Self::from_args()
    }
}
