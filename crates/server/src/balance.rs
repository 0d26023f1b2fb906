use api_types::balance::{AddBalance, Balance};
use axum::{Extension, Json, extract::State};
use engine::AuthenticatedUser;

use crate::{ServerError, server::ServerState};

pub async fn get(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<Json<Balance>, ServerError> {
    let balance = state.engine.balance(&user).await?;
    Ok(Json(Balance { balance }))
}

/// Top up the caller's balance; responds with the new amount.
pub async fn add(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AddBalance>,
) -> Result<Json<Balance>, ServerError> {
    let balance = state.engine.add_balance(&user, payload.amount).await?;
    Ok(Json(Balance { balance }))
}
