mod assignment;
mod auth;
mod cli;
mod config;
pub mod database;
pub mod error;
mod participant;
mod server;
mod settings;
mod signals;
mod urls;

use log::{debug, error, info};

fn init_logger(level: &config::LogLevel) {
    env_logger::Builder::from_default_env()
        .filter_level(level.into())
        .init();
}

async fn run(command: cli::Command) -> Result<(), error::Error> {
    match command {
        cli::Command::Done => Ok(()),
        cli::Command::Init(config) => {
            init_logger(&config.log_level);
            server::plenum_server::init_service(&config).await?;
            info!("Database initialized");
            Ok(())
        }
        cli::Command::ResetAdmin(config) => {
            init_logger(&config.log_level);
            server::plenum_server::reset_admin(&config).await
        }
        cli::Command::Serve(config) => {
            init_logger(&config.log_level);
            info!("Starting plenum application");
            debug!("Config: {}", config);
            let server = server::PlenumServer::with_config(config).await?;
            server.run().await
        }
    }
}

#[tokio::main]
async fn main() {
    // Handle CLI arguments and configuration first to get log level
    let command = match cli::handle_cli_args() {
        Ok(command) => command,
        Err(e) => {
            // Initialize basic logger for error reporting
            env_logger::init();
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(command).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
