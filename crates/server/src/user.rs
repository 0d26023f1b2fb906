//! Registration and sessions.

use api_types::user::{Login, Profile, Register, Registered, Session};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use engine::AuthenticatedUser;

use crate::{ServerError, server::ServerState};

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<Registered>), ServerError> {
    let user_id = state
        .engine
        .register(&payload.name, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(Registered { user_id })))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Session>, ServerError> {
    let token = state
        .engine
        .login(payload.user_id, &payload.password)
        .await?;
    Ok(Json(Session {
        token: token.into_inner(),
    }))
}

/// Close the session the request was authenticated with.
pub async fn logout(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<StatusCode, ServerError> {
    state.engine.logout(&user, bearer.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Profile>, ServerError> {
    let user = state.engine.user(user_id).await?;
    Ok(Json(Profile {
        id: user.id,
        name: user.name,
    }))
}
