mod activities;
mod api;
mod cli;
mod config;
mod error;
mod logging;
mod server;

use cli::Cli;
use config::Config;
use log::{debug, error};

fn main() {
    let cli = Cli::parse_args();
    let config = Config::load_config(cli.config.as_deref());

    // Set RUST_LOG to override the configured level:
    // ERROR → WARN → INFO → DEBUG → TRACE
    let logger = match logging::init(&config.logging) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());
    debug!("Effective configuration: {:?}", config);

    if let Err(err) = cli.handle_command_line(config) {
        error!("{:?}", err);
        logger.flush();
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
