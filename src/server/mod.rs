mod assignment;
mod auth;
mod config;
mod error;
pub mod plenum_server;

pub use plenum_server::PlenumServer;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use log::debug;
use serde::Serialize;

use crate::database::service::DatabaseService;
use crate::settings::ConfigStore;
use crate::urls::{self, Route};

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseService,
    pub store: ConfigStore,
}

/// Answer of a form action: the messages to show and where to go next
#[derive(Debug, Serialize)]
pub struct ActionReply {
    pub messages: Vec<String>,
    pub location: String,
}

impl ActionReply {
    pub fn new(message: impl Into<String>, location: String) -> Self {
        Self {
            messages: vec![message.into()],
            location,
        }
    }
}

/// Question asked before a destructive action, answered by POSTing to the same url
#[derive(Debug, Serialize)]
pub struct Confirm {
    pub question: String,
    pub action: String,
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let resp = next.run(req).await;
    match Route::resolve(&path) {
        Some(route) => debug!("{} {} [{}] -> {}", method, path, route.name(), resp.status()),
        None => debug!("{} {} -> {}", method, path, resp.status()),
    }
    resp
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(urls::ASSIGNMENT_OVERVIEW, get(assignment::overview))
        .route(
            urls::ASSIGNMENT_NEW,
            get(assignment::new_form).post(assignment::create),
        )
        .route(
            urls::ASSIGNMENT_VIEW,
            get(assignment::view).post(assignment::nominate_other),
        )
        .route(
            urls::ASSIGNMENT_EDIT,
            get(assignment::edit_form).post(assignment::edit),
        )
        .route(
            urls::ASSIGNMENT_DELETE,
            get(assignment::delete_confirm).post(assignment::delete),
        )
        .route(
            urls::ASSIGNMENT_SET_STATUS,
            get(assignment::set_status).post(assignment::set_status),
        )
        .route(
            urls::ASSIGNMENT_RUN,
            get(assignment::run).post(assignment::run),
        )
        .route(
            urls::ASSIGNMENT_DELRUN,
            get(assignment::delrun).post(assignment::delrun),
        )
        .route(
            urls::ASSIGNMENT_DELOTHER,
            get(assignment::delother_confirm).post(assignment::delother),
        )
        .route(urls::ASSIGNMENT_SET_ELECTED, post(assignment::set_elected))
        .route(urls::ASSIGNMENT_DEL_ELECTED, post(assignment::del_elected))
        .route(urls::PRINT_ASSIGNMENT_POLL, get(assignment::print_poll))
        .route(
            urls::ASSIGNMENT_GEN_POLL,
            get(assignment::gen_poll).post(assignment::gen_poll),
        )
        .route(
            urls::ASSIGNMENT_POLL_VIEW,
            get(assignment::poll_view).post(assignment::save_poll),
        )
        .route(
            urls::ASSIGNMENT_POLL_DELETE,
            get(assignment::delete_poll_confirm).post(assignment::delete_poll),
        )
        .route(
            urls::CONFIG_GENERAL,
            get(config::general).post(config::save_general),
        )
        .route(urls::CONFIG_VERSION, get(config::version))
        .route(
            urls::CONFIG_COLLECTION,
            get(config::collection).post(config::save_collection),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
