//! Lifecycle hooks. Modules connect receivers under a `dispatch_uid`;
//! connecting the same uid again replaces nothing and is ignored.

use futures::future::BoxFuture;
use log::{debug, info};
use std::sync::Arc;

use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::settings::{ConfigGroupedCollection, SettingsRegistry};

pub type ConfigReceiver = Arc<dyn Fn() -> ConfigGroupedCollection + Send + Sync>;
pub type PostDatabaseSetupReceiver =
    Arc<dyn Fn(DatabaseService) -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

pub struct Signal<R> {
    name: &'static str,
    receivers: Vec<(String, R)>,
}

impl<R> Signal<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            receivers: Vec::new(),
        }
    }

    /// Returns false if a receiver with this uid is already connected
    pub fn connect(&mut self, dispatch_uid: &str, receiver: R) -> bool {
        if self.receivers.iter().any(|(uid, _)| uid == dispatch_uid) {
            debug!("{}: '{}' already connected", self.name, dispatch_uid);
            return false;
        }
        self.receivers.push((dispatch_uid.to_string(), receiver));
        true
    }

    pub fn receivers(&self) -> impl Iterator<Item = (&str, &R)> {
        self.receivers.iter().map(|(uid, r)| (uid.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

pub struct Signals {
    pub config_signal: Signal<ConfigReceiver>,
    pub post_database_setup: Signal<PostDatabaseSetupReceiver>,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            config_signal: Signal::new("config_signal"),
            post_database_setup: Signal::new("post_database_setup"),
        }
    }
}

impl Signals {
    /// Signals with the receivers of all application modules connected
    pub fn with_app_receivers() -> Self {
        let mut s = Self::default();
        s.config_signal.connect(
            "setup_general_config",
            Arc::new(crate::settings::general::setup_general_config),
        );
        s.config_signal.connect(
            "setup_participant_config",
            Arc::new(crate::participant::setup_participant_config),
        );
        s.post_database_setup.connect(
            "participant_create_builtin_groups_and_admin",
            Arc::new(|db: DatabaseService| -> BoxFuture<'static, Result<(), Error>> {
                Box::pin(async move {
                    crate::participant::create_builtin_groups_and_admin(&db).await?;
                    Ok::<(), Error>(())
                })
            }),
        );
        s
    }

    /// Send the config signal and collect every answer into a registry
    pub fn collect_config(&self) -> Result<SettingsRegistry, Error> {
        debug!(
            "Sending config_signal to {} receivers",
            self.config_signal.len()
        );
        let mut registry = SettingsRegistry::new();
        for (uid, receiver) in self.config_signal.receivers() {
            debug!("config_signal -> {}", uid);
            registry.register(receiver())?;
        }
        Ok(registry)
    }

    /// Run every post database setup receiver in connection order, stopping at the first error
    pub async fn send_post_database_setup(&self, db: &DatabaseService) -> Result<(), Error> {
        for (uid, receiver) in self.post_database_setup.receivers() {
            info!("post_database_setup -> {}", uid);
            receiver(db.clone())
                .await
                .map_err(|e| Error::Signal(format!("{}: {}", uid, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::service::tests::create_test_service;
    use crate::settings::ConfigGroup;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_connect_dedupes_by_uid() {
        let mut s: Signal<u32> = Signal::new("test");
        assert!(s.is_empty());
        assert!(s.connect("a", 1));
        assert!(!s.connect("a", 2));
        assert!(s.connect("b", 3));
        let r = s.receivers().map(|(_, v)| *v).collect::<Vec<_>>();
        assert_eq!(r, vec![1, 3]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_collect_app_config() {
        let registry = Signals::with_app_receivers().collect_config().unwrap();
        let urls = registry
            .collections()
            .iter()
            .map(|c| c.url.clone())
            .collect::<Vec<_>>();
        assert_eq!(urls, vec!["general", "participant"]);
        assert!(registry.variable("system_enable_anonymous").is_some());
        assert!(registry.variable("participant_pdf_url").is_some());
    }

    #[test]
    fn test_conflicting_receivers_fail() {
        let mut s = Signals::default();
        let make = || ConfigGroupedCollection {
            title: "X".into(),
            url: "x".into(),
            required_permission: String::new(),
            weight: 0,
            groups: vec![ConfigGroup::new("G", vec![])],
        };
        s.config_signal.connect("one", Arc::new(make));
        s.config_signal.connect("two", Arc::new(make));
        assert!(s.collect_config().is_err());
    }

    #[tokio::test]
    async fn test_post_database_setup_runs_receivers_in_order() {
        let (db, _dir) = create_test_service().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let mut s = Signals::default();

        let c = calls.clone();
        s.post_database_setup.connect(
            "count",
            Arc::new(
                move |_db: DatabaseService| -> BoxFuture<'static, Result<(), Error>> {
                    let c = c.clone();
                    Box::pin(async move {
                        c.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), Error>(())
                    })
                },
            ),
        );
        s.post_database_setup.connect(
            "fail",
            Arc::new(
                |_db: DatabaseService| -> BoxFuture<'static, Result<(), Error>> {
                    Box::pin(async { Err::<(), Error>(Error::Server("boom".into())) })
                },
            ),
        );

        let err = s.send_post_database_setup(&db).await.unwrap_err();
        assert!(err.to_string().contains("fail"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_app_post_database_setup_seeds_groups() {
        let (db, _dir) = create_test_service().await;
        let s = Signals::with_app_receivers();
        s.send_post_database_setup(&db).await.unwrap();
        s.send_post_database_setup(&db).await.unwrap();
        assert_eq!(db.repository().list_groups().await.unwrap().len(), 4);
    }
}
