use crate::config::{Config, LogLevel};
use crate::error::Error;
use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(name = "plenum")]
#[command(version)]
#[command(about = "Elections and event settings for assemblies")]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        default_value = "plenum.toml"
    )]
    pub config: String,

    /// Generate a default configuration file
    #[arg(long = "generate-config")]
    pub generate_config: bool,

    /// Create the tables, built-in groups and admin user, then exit
    #[arg(long = "init")]
    pub init_service: bool,

    /// Reset the admin user to the default password, then exit
    #[arg(long = "reset-admin")]
    pub reset_admin: bool,

    /// Listen address (overrides config file)
    #[arg(short = 'l', long = "listen", value_name = "ADDRESS")]
    pub listen: Option<String>,

    /// Log level (overrides config file)
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        help = "Set log level (error, warn, info, debug, trace)"
    )]
    pub log_level: Option<String>,
}

/// What main should do after the arguments are handled
pub enum Command {
    Serve(Config),
    Init(Config),
    ResetAdmin(Config),
    Done,
}

pub fn handle_cli_args() -> Result<Command, Error> {
    resolve(Cli::parse())
}

fn resolve(cli: Cli) -> Result<Command, Error> {
    // Generate config file if requested
    if cli.generate_config {
        Config::default().save_to_file(&cli.config)?;
        info!("Generated default configuration file: {}", cli.config);
        return Ok(Command::Done);
    }

    let mut config = Config::from_file(&cli.config).map_err(|e| {
        Error::Config(format!("Failed to load '{}': {}", cli.config, e))
    })?;

    // Override with command line arguments
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }

    if let Some(log_level_str) = cli.log_level {
        config.log_level = log_level_str.parse::<LogLevel>()?;
    }

    config.validate()?;

    if cli.init_service {
        return Ok(Command::Init(config));
    }
    if cli.reset_admin {
        return Ok(Command::ResetAdmin(config));
    }
    Ok(Command::Serve(config))
}
