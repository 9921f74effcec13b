use log::info;
use std::sync::Arc;

use super::{build_router, AppState};
use crate::config::Config;
use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::settings::ConfigStore;
use crate::signals::Signals;

pub struct PlenumServer {
    config: Config,
    state: AppState,
}

impl PlenumServer {
    /// Open the database, run the post database setup receivers and
    /// collect the settings of all modules
    pub async fn with_config(config: Config) -> Result<Self, Error> {
        let signals = Signals::with_app_receivers();
        let db = DatabaseService::new(&config.database).await?;
        signals.send_post_database_setup(&db).await?;

        let registry = signals.collect_config()?;
        info!(
            "{} config pages with {} variables registered",
            registry.collections().len(),
            registry.len()
        );
        let store = ConfigStore::new(db.clone(), Arc::new(registry), config.config_cache_duration);

        Ok(Self {
            config,
            state: AppState { db, store },
        })
    }

    pub async fn run(&self) -> Result<(), Error> {
        let listen_addr = self.config.parse_listen_addr()?;
        info!("Starting plenum server on {}", listen_addr);

        let listener = tokio::net::TcpListener::bind(listen_addr).await?;
        axum::serve(listener, build_router(self.state.clone())).await?;
        Ok(())
    }
}

/// Create the tables and run the post database setup receivers
pub async fn init_service(config: &Config) -> Result<(), Error> {
    let db = DatabaseService::new(&config.database).await?;
    Signals::with_app_receivers()
        .send_post_database_setup(&db)
        .await
}

/// Reset the admin user to the default password
pub async fn reset_admin(config: &Config) -> Result<(), Error> {
    let db = DatabaseService::new(&config.database).await?;
    let admin = crate::participant::create_or_reset_admin_user(&db).await?;
    info!("Password of '{}' was reset to the default", admin.username);
    Ok(())
}
