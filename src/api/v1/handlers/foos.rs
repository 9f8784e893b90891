/*
 * Responsibility
 * - /foos and /admin handlers behind the authorization gate
 * - Read the caller from the AccessToken extractor (claims validated by the gate)
 */
use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::api::v1::extractors::AccessToken;

#[derive(Debug, Serialize)]
pub struct CallerResponse {
    pub user_id: String,
    pub client_id: String,
    pub scopes: Vec<String>,
}

impl CallerResponse {
    fn from_token(AccessToken(token): &AccessToken) -> Self {
        let mut scopes: Vec<String> = token.scopes().into_iter().map(str::to_string).collect();
        scopes.sort();
        Self {
            user_id: token.user_id.clone(),
            client_id: token.client_id.clone(),
            scopes,
        }
    }
}

pub async fn list_foos(token: AccessToken) -> Json<Value> {
    Json(serde_json::json!({
        "caller": CallerResponse::from_token(&token),
        "foos": [],
    }))
}

pub async fn update_foos(
    token: AccessToken,
    Json(foo): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !foo.is_object() {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Json(serde_json::json!({
        "caller": CallerResponse::from_token(&token),
        "foo": foo,
    })))
}

pub async fn admin_overview(token: AccessToken) -> Json<CallerResponse> {
    Json(CallerResponse::from_token(&token))
}
