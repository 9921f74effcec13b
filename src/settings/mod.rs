//! Application settings: variable registry, key-value store and the config pages.

pub mod general;
pub mod registry;
pub mod store;
pub mod types;

pub use registry::SettingsRegistry;
pub use store::ConfigStore;
pub use types::{
    ConfigGroup, ConfigGroupedCollection, ConfigValue, ConfigVariable, FieldKind, FormField,
};

use crate::error::Error;
use std::collections::BTreeMap;

/// Current values of every variable on a config page
pub async fn collection_values(
    store: &ConfigStore,
    url: &str,
) -> Result<BTreeMap<String, ConfigValue>, Error> {
    let collection = store
        .registry()
        .collection(url)
        .ok_or_else(|| Error::NotFound(format!("Config page '{}'", url)))?;
    let mut values = BTreeMap::new();
    for var in collection.variables() {
        values.insert(var.name.clone(), store.get(&var.name).await?);
    }
    Ok(values)
}

/// Validate and store submitted values of a config page.
/// Nothing is written unless every value is valid.
pub async fn save_collection(
    store: &ConfigStore,
    url: &str,
    submitted: &BTreeMap<String, ConfigValue>,
) -> Result<(), Error> {
    let collection = store
        .registry()
        .collection(url)
        .ok_or_else(|| Error::NotFound(format!("Config page '{}'", url)))?;

    for (name, value) in submitted {
        let var = collection
            .variables()
            .find(|v| &v.name == name)
            .ok_or_else(|| Error::Validation(format!("'{}' is not part of this page", name)))?;
        if let Some(field) = &var.form_field {
            field.clean(name, value)?;
        }
        if !value.matches_type(&var.default_value) {
            return Err(Error::Validation(format!(
                "{}: unexpected {} value",
                name,
                value.type_name()
            )));
        }
    }

    for (name, value) in submitted {
        store.set(name, value.clone()).await?;
    }
    Ok(())
}
