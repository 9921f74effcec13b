use log::debug;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::registry::SettingsRegistry;
use super::types::ConfigValue;
use crate::database::service::DatabaseService;
use crate::error::Error;

/// Dictionary-like access to the persistent key-value config store.
/// Unset keys read as the registered default.
#[derive(Clone)]
pub struct ConfigStore {
    db: DatabaseService,
    registry: Arc<SettingsRegistry>,
    cache: Cache<String, ConfigValue>,
}

impl ConfigStore {
    pub fn new(db: DatabaseService, registry: Arc<SettingsRegistry>, ttl: Duration) -> Self {
        Self {
            db,
            registry,
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    pub async fn get(&self, key: &str) -> Result<ConfigValue, Error> {
        if let Some(v) = self.cache.get(key).await {
            return Ok(v);
        }

        let value = match self.db.repository().get_config_value(key).await? {
            Some(json) => serde_json::from_str::<ConfigValue>(&json)?,
            None => self
                .registry
                .default_value(key)
                .cloned()
                .ok_or_else(|| Error::UnknownConfigKey(key.to_string()))?,
        };
        self.cache.insert(key.to_string(), value.clone()).await;
        Ok(value)
    }

    pub async fn get_bool(&self, key: &str) -> Result<bool, Error> {
        let v = self.get(key).await?;
        v.as_bool()
            .ok_or_else(|| Error::Config(format!("'{}' is a {}, not a bool", key, v.type_name())))
    }

    pub async fn get_string(&self, key: &str) -> Result<String, Error> {
        let v = self.get(key).await?;
        match v {
            ConfigValue::String(s) => Ok(s),
            other => Err(Error::Config(format!(
                "'{}' is a {}, not a string",
                key,
                other.type_name()
            ))),
        }
    }

    pub async fn set(&self, key: &str, value: impl Into<ConfigValue>) -> Result<(), Error> {
        let value = value.into();
        let default = self
            .registry
            .default_value(key)
            .ok_or_else(|| Error::UnknownConfigKey(key.to_string()))?;
        if !value.matches_type(default) {
            return Err(Error::Validation(format!(
                "'{}' expects a {} value, got {}",
                key,
                default.type_name(),
                value.type_name()
            )));
        }

        let json = serde_json::to_string(&value)?;
        self.db.repository().set_config_value(key, &json).await?;
        self.cache.insert(key.to_string(), value).await;
        debug!("Config '{}' set to {}", key, json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::service::tests::create_test_service;
    use crate::settings::types::{ConfigGroup, ConfigGroupedCollection, ConfigVariable};

    fn registry() -> Arc<SettingsRegistry> {
        let mut r = SettingsRegistry::new();
        r.register(ConfigGroupedCollection {
            title: "Test".into(),
            url: "test".into(),
            required_permission: "config.can_manage".into(),
            weight: 1,
            groups: vec![ConfigGroup::new(
                "Group",
                vec![
                    ConfigVariable::new("title", "Default title"),
                    ConfigVariable::new("flag", false),
                ],
            )],
        })
        .unwrap();
        Arc::new(r)
    }

    #[tokio::test]
    async fn test_defaults_and_writes() {
        let (db, _dir) = create_test_service().await;
        let store = ConfigStore::new(db.clone(), registry(), Duration::from_secs(60));

        assert_eq!(store.get_string("title").await.unwrap(), "Default title");
        assert!(!store.get_bool("flag").await.unwrap());

        store.set("title", "Spring assembly").await.unwrap();
        store.set("flag", true).await.unwrap();
        assert_eq!(store.get_string("title").await.unwrap(), "Spring assembly");
        assert!(store.get_bool("flag").await.unwrap());

        // a second store over the same database sees the persisted values
        let fresh = ConfigStore::new(db, registry(), Duration::from_secs(60));
        assert_eq!(fresh.get_string("title").await.unwrap(), "Spring assembly");
        assert!(fresh.get_bool("flag").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_and_mistyped_keys() {
        let (db, _dir) = create_test_service().await;
        let store = ConfigStore::new(db, registry(), Duration::from_secs(60));

        assert!(matches!(
            store.get("nope").await,
            Err(Error::UnknownConfigKey(_))
        ));
        assert!(matches!(
            store.set("nope", "x").await,
            Err(Error::UnknownConfigKey(_))
        ));
        assert!(matches!(
            store.set("flag", "yes").await,
            Err(Error::Validation(_))
        ));
        assert!(store.get_bool("title").await.is_err());
    }
}
