//! Favorite folder endpoints. Every route acts on the caller's own folders.

use api_types::{
    favorite::{FavoriteAdd, Folder, FolderCreated, FolderList, FolderNew},
    item::ItemList,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::AuthenticatedUser;

use crate::{ServerError, items::summary_view, server::ServerState};

pub async fn folder_new(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Json(payload): Json<FolderNew>,
) -> Result<(StatusCode, Json<FolderCreated>), ServerError> {
    let folder_id = state.engine.add_folder(&user, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(FolderCreated { folder_id })))
}

pub async fn list_folders(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<Json<FolderList>, ServerError> {
    let folders = state
        .engine
        .list_folders(&user)
        .await?
        .into_iter()
        .map(|f| Folder {
            id: f.id,
            name: f.name,
        })
        .collect();
    Ok(Json(FolderList { folders }))
}

pub async fn add(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Json(payload): Json<FavoriteAdd>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .add_item_to_folder(&user, payload.item_id, payload.folder_id)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn list_items(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Path(folder_id): Path<i64>,
) -> Result<Json<ItemList>, ServerError> {
    let items = state
        .engine
        .list_favorite_items(&user, folder_id)
        .await?
        .into_iter()
        .map(summary_view)
        .collect();
    Ok(Json(ItemList { items }))
}

pub async fn remove(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Path((folder_id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_favorite(&user, item_id, folder_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
