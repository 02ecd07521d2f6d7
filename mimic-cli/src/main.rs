use anyhow::Result;
use clap::Parser;
use commands::{Cli, run};
use mimic_common::MimicError;
use mimic_common::observability::init_logging;
use mimic_config::{MimicConfig, MimicConfigLoader, default_config_path};
use mimic_runtime::MimicRuntime;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(cli.config.as_deref())?;

    // 2) Logging: flags override the `logging` section
    let mut logging = cfg.logging.clone();
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    logging.emit_stderr |= cli.stderr;
    let log_path = init_logging(logging.to_log_config("mimic"))?;
    debug!(target: "mimic.cli", log = %log_path.display(), "logging initialised");

    let runtime = MimicRuntime::build("mimic-worker", None)?;
    let handle = runtime.handle();
    let _ctrl_c = handle.cancel_on_ctrl_c();

    let outcome = runtime.block_on(run(cli, cfg, handle.cancellation()));
    runtime.shutdown(Duration::from_millis(250));
    info!(target: "mimic.cli", ok = outcome.is_ok(), "done");
    outcome
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> Result<MimicConfig, MimicError> {
    let loader = match (explicit, default_config_path()) {
        (Some(path), _) => MimicConfigLoader::new().with_file(path),
        (None, Some(path)) => MimicConfigLoader::new().with_optional_file(path),
        (None, None) => MimicConfigLoader::new(),
    };
    loader.load().map_err(|e| MimicError::Config(e.to_string()))
}
