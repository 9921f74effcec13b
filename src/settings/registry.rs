use log::{debug, info};
use std::collections::HashMap;

use super::types::{ConfigGroupedCollection, ConfigValue, ConfigVariable};
use crate::error::Error;

/// All config variables of the application, collected from the config signal
#[derive(Debug, Default)]
pub struct SettingsRegistry {
    collections: Vec<ConfigGroupedCollection>,
    // variable name -> (collection index, variable)
    variables: HashMap<String, (usize, ConfigVariable)>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, collection: ConfigGroupedCollection) -> Result<(), Error> {
        if self.collections.iter().any(|c| c.url == collection.url) {
            return Err(Error::Config(format!(
                "Config page '{}' is already registered",
                collection.url
            )));
        }
        for var in collection.variables() {
            if self.variables.contains_key(&var.name) {
                return Err(Error::Config(format!(
                    "Config variable '{}' is already registered",
                    var.name
                )));
            }
        }

        let index = self.collections.len();
        for var in collection.variables() {
            debug!("Registering config variable: {}", var.name);
            self.variables
                .insert(var.name.clone(), (index, var.clone()));
        }
        info!(
            "Registered config page '{}' with {} variables",
            collection.url,
            collection.variables().count()
        );
        self.collections.push(collection);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&ConfigVariable> {
        self.variables.get(name).map(|(_, v)| v)
    }

    pub fn default_value(&self, name: &str) -> Option<&ConfigValue> {
        self.variable(name).map(|v| &v.default_value)
    }

    pub fn collection(&self, url: &str) -> Option<&ConfigGroupedCollection> {
        self.collections.iter().find(|c| c.url == url)
    }

    /// Collections ordered by weight
    pub fn collections(&self) -> Vec<&ConfigGroupedCollection> {
        let mut c = self.collections.iter().collect::<Vec<_>>();
        c.sort_by_key(|c| c.weight);
        c
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
