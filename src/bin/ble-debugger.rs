use clap::Parser;
use log::info;
use ble_debugger::{init_logging, run};
use ble_debugger::config::args::Args;
use ble_debugger::config::types::Config;
use ble_debugger::error::{error_msgbox, AppRunError};

fn main() -> Result<(), AppRunError> {
    let args = Args::parse();
    let config = Config::from(args);

    init_logging(config.log_level)?;
    info!(concat!("BLE Debugger ", env!("CARGO_PKG_VERSION")));

    match run(config) {
        Err(err) => {
            error_msgbox("Unexpected error", &err);
            Err(err)
        }
        Ok(_) => Ok(())
    }
}
