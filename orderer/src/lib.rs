pub mod configtx;
pub mod consensus;
pub mod crypto;
pub mod genesis;
pub mod ledger;
pub mod multichain;
pub mod settings;
pub mod start_up;

use crate::{
    configtx::StandardConfigEngine,
    consensus::{Consenter, Consenters, Solo},
    multichain::Manager,
    settings::{CommandLine, RawSettings},
};
use std::sync::Arc;
use tracing::{span, Level};

fn start() -> Result<(), start_up::Error> {
    let raw_settings = RawSettings::load(CommandLine::load())?;
    let exit_after_storage_check = raw_settings.storage_check();

    let (_logger_guards, log_info_msgs) = raw_settings.log_settings().init_log()?;

    let init_span = span!(Level::TRACE, "task", kind = "init");
    let _enter = init_span.enter();
    tracing::info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(msgs) = log_info_msgs {
        for msg in &msgs {
            tracing::info!("{}", msg);
        }
    }

    let settings = raw_settings.try_into_settings()?;

    let runtime = tokio::runtime::Runtime::new().map_err(|source| start_up::Error::Io {
        source,
        reason: start_up::ErrorKind::Runtime,
    })?;

    let ledger_factory = start_up::prepare_ledger(&settings)?;
    let signer = start_up::load_signer(&settings)?;
    start_up::bootstrap_genesis(&*ledger_factory, settings.genesis.as_ref(), &*signer)?;

    let mut consenters = Consenters::new();
    consenters.insert(
        Solo::CONSENSUS_TYPE.to_owned(),
        Arc::new(Solo::new(runtime.handle().clone())) as Arc<dyn Consenter>,
    );

    let manager = Manager::new(
        ledger_factory,
        consenters,
        signer,
        Arc::new(StandardConfigEngine),
        span!(Level::TRACE, "sub_task", kind = "multichain"),
    )?;
    tracing::info!(
        "loaded {} channels, the system channel is {}",
        manager.channels_count(),
        manager.system_channel_id()
    );

    if exit_after_storage_check {
        tracing::info!("Exiting after successful storage check");
        manager.halt();
        return Ok(());
    }

    let interrupted = runtime.block_on(tokio::signal::ctrl_c());
    tracing::info!("shutting down");
    manager.halt();
    interrupted.map_err(|source| start_up::Error::Io {
        source,
        reason: start_up::ErrorKind::Signal,
    })
}

pub fn main() {
    use std::error::Error;

    if let Err(error) = start() {
        eprintln!("{}", error);
        let mut source = error.source();
        while let Some(err) = source {
            eprintln!(" |-> {}", err);
            source = err.source();
        }

        std::process::exit(error.code());
    }
}
