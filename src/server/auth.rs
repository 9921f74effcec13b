use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::{engine::general_purpose, Engine as _};
use log::debug;

use super::AppState;
use crate::auth::Actor;
use crate::error::Error;

/// Username and password of a `Basic` authorization header
fn basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(h) => h,
            None => return Actor::anonymous(&state.db, &state.store).await,
        };
        let (username, password) = header
            .to_str()
            .ok()
            .and_then(basic_credentials)
            .ok_or(Error::Unauthorized)?;
        let actor = Actor::authenticate(&state.db, &username, &password).await;
        if actor.is_err() {
            debug!("Authentication failed for '{}'", username);
        }
        actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_credentials() {
        // "alice:pa:ss"
        assert_eq!(
            basic_credentials("Basic YWxpY2U6cGE6c3M="),
            Some(("alice".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(basic_credentials("Bearer abc"), None);
        assert_eq!(basic_credentials("Basic !!!"), None);
        // "alice" without separator
        assert_eq!(basic_credentials("Basic YWxpY2U="), None);
    }
}
