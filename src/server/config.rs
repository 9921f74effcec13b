use axum::extract::{Path, State};
use axum::http::Uri;
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{ActionReply, AppState};
use crate::auth::Actor;
use crate::error::Error;
use crate::settings::general::{self, GeneralConfig, GeneralConfigForm, Tab};
use crate::settings::{self, ConfigGroupedCollection, ConfigValue};
use crate::urls::Route;

#[derive(Debug, Serialize)]
pub struct GeneralPage {
    pub form: GeneralConfigForm,
    pub tab: Tab,
}

#[derive(Debug, Serialize)]
pub struct VersionPage {
    pub versions: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct CollectionPage {
    #[serde(flatten)]
    pub collection: ConfigGroupedCollection,
    pub values: BTreeMap<String, ConfigValue>,
}

pub async fn general(
    State(state): State<AppState>,
    actor: Actor,
    uri: Uri,
) -> Result<Json<GeneralPage>, Error> {
    actor.require_perm(GeneralConfig::PERMISSION_REQUIRED)?;
    let form = GeneralConfig::new(&state.store, &state.db)
        .get_initial()
        .await?;
    Ok(Json(GeneralPage {
        form,
        tab: general::register_tab(uri.path(), &actor),
    }))
}

pub async fn save_general(
    State(state): State<AppState>,
    actor: Actor,
    Json(form): Json<GeneralConfigForm>,
) -> Result<Json<ActionReply>, Error> {
    actor.require_perm(GeneralConfig::PERMISSION_REQUIRED)?;
    let messages = GeneralConfig::new(&state.store, &state.db)
        .form_valid(&form)
        .await?;
    Ok(Json(ActionReply {
        messages,
        location: Route::ConfigGeneral.url(),
    }))
}

pub async fn version(actor: Actor) -> Result<Json<VersionPage>, Error> {
    actor.require_perm(GeneralConfig::PERMISSION_REQUIRED)?;
    Ok(Json(VersionPage {
        versions: vec![("Plenum".to_string(), general::version().to_string())],
    }))
}

fn find_collection(
    state: &AppState,
    actor: &Actor,
    url: &str,
) -> Result<ConfigGroupedCollection, Error> {
    let collection = state
        .store
        .registry()
        .collection(url)
        .ok_or_else(|| Error::NotFound(format!("Config page '{}'", url)))?;
    if !collection.required_permission.is_empty() {
        actor.require_perm(&collection.required_permission)?;
    }
    Ok(collection.clone())
}

pub async fn collection(
    State(state): State<AppState>,
    actor: Actor,
    Path(url): Path<String>,
) -> Result<Json<CollectionPage>, Error> {
    let collection = find_collection(&state, &actor, &url)?;
    let values = settings::collection_values(&state.store, &url).await?;
    Ok(Json(CollectionPage { collection, values }))
}

pub async fn save_collection(
    State(state): State<AppState>,
    actor: Actor,
    Path(url): Path<String>,
    Json(submitted): Json<BTreeMap<String, ConfigValue>>,
) -> Result<Json<ActionReply>, Error> {
    let collection = find_collection(&state, &actor, &url)?;
    settings::save_collection(&state.store, &url, &submitted).await?;
    Ok(Json(ActionReply::new(
        format!("{} settings successfully saved.", collection.title),
        Route::ConfigCollection { url }.url(),
    )))
}
