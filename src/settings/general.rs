//! General settings page: event data, front page texts and anonymous access.

use log::info;
use serde::{Deserialize, Serialize};

use super::store::ConfigStore;
use super::types::{
    ConfigGroup, ConfigGroupedCollection, ConfigValue, ConfigVariable, FieldKind, FormField,
};
use crate::auth::Actor;
use crate::database::common::{ANONYMOUS_GROUP_NAME, PERM_MANAGE_CONFIG};
use crate::database::models::Group;
use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::urls::Route;

pub const EVENT_NAME: &str = "event_name";
pub const EVENT_DESCRIPTION: &str = "event_description";
pub const EVENT_DATE: &str = "event_date";
pub const EVENT_LOCATION: &str = "event_location";
pub const EVENT_ORGANIZER: &str = "event_organizer";
pub const FRONTPAGE_TITLE: &str = "frontpage_title";
pub const FRONTPAGE_WELCOMETEXT: &str = "frontpage_welcometext";
pub const SYSTEM_ENABLE_ANONYMOUS: &str = "system_enable_anonymous";

/// Codenames granted to a newly created "Anonymous" group
pub const ANONYMOUS_DEFAULT_PERMS: [&str; 3] =
    ["can_see_agenda", "can_see_projector", "can_see_motion"];

pub const MSG_ANONYMOUS_ENABLED: &str = "Anonymous access enabled. Please modify the \"Anonymous\" group to fit your required permissions.";
pub const MSG_SAVED: &str = "General settings successfully saved.";

/// Receiver for the config signal
pub fn setup_general_config() -> ConfigGroupedCollection {
    let event = ConfigGroup::new(
        "Event",
        vec![
            ConfigVariable::new(EVENT_NAME, "Plenum").form_field(
                FormField::new(FieldKind::Text, "Event name").required(true),
            ),
            ConfigVariable::new(EVENT_DESCRIPTION, "Presentation and assembly system")
                .translatable(true)
                .form_field(FormField::new(FieldKind::Text, "Short description of event")),
            ConfigVariable::new(EVENT_DATE, "")
                .form_field(FormField::new(FieldKind::Date, "Event date")),
            ConfigVariable::new(EVENT_LOCATION, "")
                .form_field(FormField::new(FieldKind::Text, "Event location")),
            ConfigVariable::new(EVENT_ORGANIZER, "")
                .form_field(FormField::new(FieldKind::Text, "Event organized by")),
        ],
    );
    let frontpage = ConfigGroup::new(
        "Front page",
        vec![
            ConfigVariable::new(FRONTPAGE_TITLE, "Welcome")
                .translatable(true)
                .form_field(FormField::new(FieldKind::Text, "Title")),
            ConfigVariable::new(FRONTPAGE_WELCOMETEXT, "[Space for your welcome text.]")
                .translatable(true)
                .form_field(FormField::new(FieldKind::Textarea, "Welcome text")),
        ],
    );
    let system = ConfigGroup::new(
        "System",
        vec![ConfigVariable::new(SYSTEM_ENABLE_ANONYMOUS, false).form_field(
            FormField::new(FieldKind::Boolean, "Allow access for anonymous guest users"),
        )],
    );

    ConfigGroupedCollection {
        title: "General".to_string(),
        url: "general".to_string(),
        required_permission: PERM_MANAGE_CONFIG.to_string(),
        weight: 10,
        groups: vec![event, frontpage, system],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfigForm {
    pub event_name: String,
    #[serde(default)]
    pub event_description: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub event_location: String,
    #[serde(default)]
    pub event_organizer: String,
    #[serde(default)]
    pub frontpage_title: String,
    #[serde(default)]
    pub frontpage_welcometext: String,
    #[serde(default)]
    pub system_enable_anonymous: bool,
}

impl GeneralConfigForm {
    fn fields(&self) -> [(&'static str, ConfigValue); 8] {
        [
            (EVENT_NAME, self.event_name.as_str().into()),
            (EVENT_DESCRIPTION, self.event_description.as_str().into()),
            (EVENT_DATE, self.event_date.as_str().into()),
            (EVENT_LOCATION, self.event_location.as_str().into()),
            (EVENT_ORGANIZER, self.event_organizer.as_str().into()),
            (FRONTPAGE_TITLE, self.frontpage_title.as_str().into()),
            (FRONTPAGE_WELCOMETEXT, self.frontpage_welcometext.as_str().into()),
            (SYSTEM_ENABLE_ANONYMOUS, self.system_enable_anonymous.into()),
        ]
    }
}

/// The general settings form bound to the config store
pub struct GeneralConfig<'a> {
    store: &'a ConfigStore,
    db: &'a DatabaseService,
}

impl<'a> GeneralConfig<'a> {
    pub const PERMISSION_REQUIRED: &'static str = PERM_MANAGE_CONFIG;

    pub fn new(store: &'a ConfigStore, db: &'a DatabaseService) -> Self {
        Self { store, db }
    }

    pub async fn get_initial(&self) -> Result<GeneralConfigForm, Error> {
        Ok(GeneralConfigForm {
            event_name: self.store.get_string(EVENT_NAME).await?,
            event_description: self.store.get_string(EVENT_DESCRIPTION).await?,
            event_date: self.store.get_string(EVENT_DATE).await?,
            event_location: self.store.get_string(EVENT_LOCATION).await?,
            event_organizer: self.store.get_string(EVENT_ORGANIZER).await?,
            frontpage_title: self.store.get_string(FRONTPAGE_TITLE).await?,
            frontpage_welcometext: self.store.get_string(FRONTPAGE_WELCOMETEXT).await?,
            system_enable_anonymous: self.store.get_bool(SYSTEM_ENABLE_ANONYMOUS).await?,
        })
    }

    /// Validate every field against its form field definition
    pub fn clean(&self, form: &GeneralConfigForm) -> Result<(), Error> {
        for (name, value) in form.fields() {
            let var = self
                .store
                .registry()
                .variable(name)
                .ok_or_else(|| Error::UnknownConfigKey(name.to_string()))?;
            if let Some(field) = &var.form_field {
                field.clean(name, &value)?;
            }
        }
        Ok(())
    }

    /// Persist the submitted form. Returns the user-facing messages.
    pub async fn form_valid(&self, form: &GeneralConfigForm) -> Result<Vec<String>, Error> {
        self.clean(form)?;

        // the group must exist before anonymous access is switched on
        let mut messages = Vec::new();
        if form.system_enable_anonymous {
            let group = self.ensure_anonymous_group().await?;
            info!("Anonymous access enabled, group id {}", group.id);
            messages.push(MSG_ANONYMOUS_ENABLED.to_string());
        }

        for (name, value) in form.fields() {
            self.store.set(name, value).await?;
        }

        messages.push(MSG_SAVED.to_string());
        Ok(messages)
    }

    /// Look up the "Anonymous" group and (re)create it with the default permissions if missing
    pub async fn ensure_anonymous_group(&self) -> Result<Group, Error> {
        let repo = self.db.repository();
        if let Some(group) = repo.get_group_by_name(ANONYMOUS_GROUP_NAME).await? {
            return Ok(group);
        }

        let group = repo.create_group(None, ANONYMOUS_GROUP_NAME).await?;
        let perm_ids = repo
            .list_permissions_by_codenames(&ANONYMOUS_DEFAULT_PERMS)
            .await?
            .iter()
            .map(|p| p.id)
            .collect::<Vec<_>>();
        repo.add_group_permissions(group.id, &perm_ids).await?;
        info!("Created group '{}' with default permissions", group.name);
        Ok(group)
    }
}

/// Running version, shown on the version page
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Navigation tab of the config app
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tab {
    pub title: String,
    pub url: String,
    pub permission: bool,
    pub selected: bool,
}

pub fn register_tab(request_path: &str, actor: &Actor) -> Tab {
    Tab {
        title: "Configuration".to_string(),
        url: Route::ConfigGeneral.url(),
        permission: actor.has_perm(PERM_MANAGE_CONFIG),
        selected: request_path.starts_with("/config/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::service::tests::{create_test_service, execute_raw};
    use crate::settings::SettingsRegistry;
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup() -> (ConfigStore, DatabaseService, tempfile::TempDir) {
        let (db, dir) = create_test_service().await;
        let mut registry = SettingsRegistry::new();
        registry.register(setup_general_config()).unwrap();
        let store = ConfigStore::new(db.clone(), Arc::new(registry), Duration::from_secs(60));
        (store, db, dir)
    }

    fn sample_form() -> GeneralConfigForm {
        GeneralConfigForm {
            event_name: "Delegates conference".into(),
            event_description: "Yearly conference".into(),
            event_date: "2026-11-07".into(),
            event_location: "Town hall".into(),
            event_organizer: "Board".into(),
            frontpage_title: "Hello delegates".into(),
            frontpage_welcometext: "Line one\nLine two".into(),
            system_enable_anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_initial_values_are_defaults() {
        let (store, db, _dir) = setup().await;
        let initial = GeneralConfig::new(&store, &db).get_initial().await.unwrap();
        assert_eq!(initial.event_name, "Plenum");
        assert_eq!(initial.frontpage_title, "Welcome");
        assert!(!initial.system_enable_anonymous);
    }

    #[tokio::test]
    async fn test_form_round_trip() {
        let (store, db, _dir) = setup().await;
        let view = GeneralConfig::new(&store, &db);
        let form = sample_form();

        let messages = view.form_valid(&form).await.unwrap();
        assert_eq!(messages, vec![MSG_SAVED.to_string()]);
        assert_eq!(view.get_initial().await.unwrap(), form);

        // and again through a cold cache
        let cold = ConfigStore::new(
            db.clone(),
            Arc::new({
                let mut r = SettingsRegistry::new();
                r.register(setup_general_config()).unwrap();
                r
            }),
            Duration::from_secs(60),
        );
        assert_eq!(GeneralConfig::new(&cold, &db).get_initial().await.unwrap(), form);
        // disabled anonymous access doesn't touch groups
        assert!(db
            .repository()
            .get_group_by_name(ANONYMOUS_GROUP_NAME)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_saved() {
        let (store, db, _dir) = setup().await;
        let view = GeneralConfig::new(&store, &db);

        let mut form = sample_form();
        form.event_name = String::new();
        assert!(matches!(view.form_valid(&form).await, Err(Error::Validation(_))));

        let mut form = sample_form();
        form.event_date = "next friday".into();
        assert!(view.form_valid(&form).await.is_err());
        assert_eq!(view.get_initial().await.unwrap().event_location, "");
    }

    #[tokio::test]
    async fn test_enable_anonymous_fails_without_storing() {
        let (store, db, dir) = setup().await;
        execute_raw(&dir, "DROP TABLE auth_group_permissions").await;
        execute_raw(&dir, "DROP TABLE auth_groups").await;
        let view = GeneralConfig::new(&store, &db);

        let mut form = sample_form();
        form.system_enable_anonymous = true;
        assert!(view.form_valid(&form).await.is_err());

        let initial = view.get_initial().await.unwrap();
        assert!(!initial.system_enable_anonymous);
        assert_eq!(initial.event_name, "Plenum");
    }

    #[tokio::test]
    async fn test_enable_anonymous_creates_group_once() {
        let (store, db, _dir) = setup().await;
        let view = GeneralConfig::new(&store, &db);
        let mut form = sample_form();
        form.system_enable_anonymous = true;

        let messages = view.form_valid(&form).await.unwrap();
        assert_eq!(
            messages,
            vec![MSG_ANONYMOUS_ENABLED.to_string(), MSG_SAVED.to_string()]
        );
        assert!(store.get_bool(SYSTEM_ENABLE_ANONYMOUS).await.unwrap());

        let repo = db.repository();
        let group = repo
            .get_group_by_name(ANONYMOUS_GROUP_NAME)
            .await
            .unwrap()
            .unwrap();
        let mut perms = repo
            .list_group_permissions(group.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.qualified_name())
            .collect::<Vec<_>>();
        perms.sort();
        assert_eq!(
            perms,
            vec![
                "agenda.can_see_agenda",
                "core.can_see_projector",
                "motion.can_see_motion"
            ]
        );

        // submitting again reuses the group
        view.form_valid(&form).await.unwrap();
        let anonymous = repo
            .list_groups()
            .await
            .unwrap()
            .into_iter()
            .filter(|g| g.name == ANONYMOUS_GROUP_NAME)
            .collect::<Vec<_>>();
        assert_eq!(anonymous, vec![group]);

        form.system_enable_anonymous = false;
        view.form_valid(&form).await.unwrap();
        assert!(!store.get_bool(SYSTEM_ENABLE_ANONYMOUS).await.unwrap());
    }

    #[tokio::test]
    async fn test_anonymous_group_reused_when_renamed_group_exists() {
        let (store, db, _dir) = setup().await;
        let existing = db
            .repository()
            .create_group(Some(1), ANONYMOUS_GROUP_NAME)
            .await
            .unwrap();
        let group = GeneralConfig::new(&store, &db)
            .ensure_anonymous_group()
            .await
            .unwrap();
        assert_eq!(group, existing);
        // existing group keeps its (empty) permission set
        assert!(db
            .repository()
            .list_group_permissions(group.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_register_tab() {
        let (store, db, _dir) = setup().await;
        store.set(SYSTEM_ENABLE_ANONYMOUS, true).await.unwrap();
        let anonymous = Actor::anonymous(&db, &store).await.unwrap();

        let tab = register_tab("/config/general", &anonymous);
        assert_eq!(tab.url, "/config/general");
        assert!(tab.selected);
        assert!(!tab.permission);
        assert!(!register_tab("/assignment/", &anonymous).selected);
    }
}
