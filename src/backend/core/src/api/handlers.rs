//! HTTP handlers.
//!
//! A deliberately small surface proving the engine end-to-end: login issues
//! the claims token, `/me` echoes the caller's claims, `/users` runs a
//! constraint-filtered listing.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::QueryBuilder;

use crate::access::context::RequestContext;
use crate::api::AppState;
use crate::claims::payload::AccessClaims;
use crate::error::{PalisadeError, Result};
use crate::store::{UserEntity, UserRow};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub claims: AccessClaims,
}

/// `POST /auth/login` — authenticate and issue the access token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let outcome = state.auth.login(&request.login, &request.password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        claims: outcome.claims,
    }))
}

/// `GET /me` — the caller's decoded claims.
pub async fn me(context: RequestContext) -> Result<Json<AccessClaims>> {
    context
        .connected_user
        .clone()
        .map(Json)
        .ok_or_else(|| PalisadeError::permission_denied("no connected user on /me"))
}

/// `GET /users` — list users visible to the caller.
///
/// The permission chain already ran in the guard; here the decision it
/// wrote into the context drives the row filter.
pub async fn list_users(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<Json<Vec<UserRow>>> {
    let entity = state.entities.descriptor::<UserEntity>()?;

    let mut builder =
        QueryBuilder::new("SELECT users.id, users.login, users.client_id FROM users");
    state
        .chain
        .constrain(&mut builder, &context, Some(entity.as_ref()))
        .await?;
    builder.push(" ORDER BY users.login");

    let users: Vec<UserRow> = builder.build_query_as().fetch_all(&state.pool).await?;
    Ok(Json(users))
}

/// `GET /health` — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
