use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;

use super::api::error::{ApiError, ErrorResponse};
use super::config::Permission;
use super::state::AppState;

/// Operator identified by one of the configured API keys.
#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    permissions: HashSet<Permission>,
}

impl Operator {
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.permissions.contains(&permission) {
            return Ok(());
        }
        log::warn!("Operator {} lacks the {} permission", self.name, permission);
        Err(ApiError::Forbidden(permission))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    Missing,
    Malformed,
    Unknown,
}

impl KeyRejection {
    fn code(self) -> &'static str {
        match self {
            KeyRejection::Missing => "missing_api_key",
            KeyRejection::Malformed => "invalid_authorization",
            KeyRejection::Unknown => "invalid_api_key",
        }
    }
}

impl IntoResponse for KeyRejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse::with_message(self.code(), "expected Authorization: Bearer <key>");
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Key from an `Authorization: Bearer <key>` header. The scheme is matched
/// case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, KeyRejection> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(KeyRejection::Missing)?
        .to_str()
        .map_err(|_| KeyRejection::Malformed)?;

    let (scheme, token) = value.split_once(' ').ok_or(KeyRejection::Malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(KeyRejection::Malformed);
    }
    Ok(token)
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = KeyRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let Some(key) = state.config.find_api_key(token) else {
            log::warn!("Unknown API key on {}", parts.uri.path());
            return Err(KeyRejection::Unknown);
        };

        Ok(Operator {
            name: key.name.clone(),
            permissions: key.permissions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer ops-key")), Ok("ops-key"));
        assert_eq!(bearer_token(&headers("bearer  ops-key ")), Ok("ops-key"));
    }

    #[test]
    fn other_schemes_and_empty_keys_are_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(KeyRejection::Missing));
        assert_eq!(
            bearer_token(&headers("Basic b3BzOmtleQ==")),
            Err(KeyRejection::Malformed)
        );
        assert_eq!(bearer_token(&headers("Bearer ")), Err(KeyRejection::Malformed));
        assert_eq!(bearer_token(&headers("ops-key")), Err(KeyRejection::Malformed));
    }

    #[test]
    fn operator_needs_granted_permission() {
        let ops = Operator {
            name: "ops".into(),
            permissions: HashSet::from([Permission::ControlFeed]),
        };
        let viewer = Operator {
            name: "viewer".into(),
            permissions: HashSet::new(),
        };

        assert!(ops.require(Permission::ControlFeed).is_ok());
        assert!(matches!(
            viewer.require(Permission::ControlFeed),
            Err(ApiError::Forbidden(Permission::ControlFeed))
        ));
    }
}
