//! Listing, trading and browsing endpoints.

use api_types::{
    ItemStatus,
    item::{ItemCreated, ItemList, ItemSummary, ItemUpsert, ItemView, Search, Sell},
    sale::Sale,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use engine::{AuthenticatedUser, NewItemCmd, UpdateItemCmd};

use crate::{ServerError, sales::sale_view, server::ServerState};

fn status_view(status: engine::ItemStatus) -> ItemStatus {
    match status {
        engine::ItemStatus::Initial => ItemStatus::Initial,
        engine::ItemStatus::OnSale => ItemStatus::OnSale,
        engine::ItemStatus::SoldOut => ItemStatus::SoldOut,
    }
}

pub(crate) fn summary_view(item: engine::ItemSummary) -> ItemSummary {
    ItemSummary {
        id: item.id,
        name: item.name,
        price: item.price,
        seller_id: item.seller_id,
        category_id: item.category_id,
        category_name: item.category_name,
        status: status_view(item.status),
        updated_at: item.updated_at,
    }
}

fn item_list(items: Vec<engine::ItemSummary>) -> Json<ItemList> {
    Json(ItemList {
        items: items.into_iter().map(summary_view).collect(),
    })
}

fn decode_image(image: &str) -> Result<Vec<u8>, ServerError> {
    STANDARD
        .decode(image)
        .map_err(|err| ServerError::Generic(format!("invalid base64 image: {err}")))
}

fn new_item_cmd(payload: ItemUpsert) -> Result<NewItemCmd, ServerError> {
    let image = decode_image(&payload.image)?;
    Ok(NewItemCmd::new(payload.name, payload.price, payload.category_id)
        .description(payload.description)
        .image(image))
}

pub async fn item_new(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ItemUpsert>,
) -> Result<(StatusCode, Json<ItemCreated>), ServerError> {
    let cmd = new_item_cmd(payload)?;
    let item_id = state.engine.add_item(&user, cmd).await?;
    Ok((StatusCode::CREATED, Json(ItemCreated { item_id })))
}

pub async fn item_update(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
    Json(payload): Json<ItemUpsert>,
) -> Result<Json<ItemCreated>, ServerError> {
    let cmd = UpdateItemCmd::from(new_item_cmd(payload)?);
    let item_id = state.engine.update_item(&user, item_id, cmd).await?;
    Ok(Json(ItemCreated { item_id }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
) -> Result<Json<ItemView>, ServerError> {
    let detail = state.engine.item(item_id).await?;
    let item = detail.item;
    Ok(Json(ItemView {
        id: item.id,
        name: item.name,
        price: item.price,
        description: item.description,
        category_id: item.category_id,
        category_name: detail.category_name,
        seller_id: item.seller_id,
        status: status_view(item.status),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }))
}

/// Raw image bytes, served as JPEG.
pub async fn image(
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, ServerError> {
    let bytes = state.engine.item_image(item_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

pub async fn list_on_sale(
    State(state): State<ServerState>,
) -> Result<Json<ItemList>, ServerError> {
    Ok(item_list(state.engine.list_on_sale().await?))
}

pub async fn list_by_seller(
    State(state): State<ServerState>,
    Path(seller_id): Path<i64>,
) -> Result<Json<ItemList>, ServerError> {
    Ok(item_list(state.engine.list_by_seller(seller_id).await?))
}

pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<Search>,
) -> Result<Json<ItemList>, ServerError> {
    Ok(item_list(state.engine.search(&query.name).await?))
}

pub async fn sell(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Json(payload): Json<Sell>,
) -> Result<StatusCode, ServerError> {
    state.engine.sell(&user, payload.item_id).await?;
    Ok(StatusCode::OK)
}

pub async fn purchase(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
) -> Result<Json<Sale>, ServerError> {
    let sale = state.engine.purchase(&user, item_id).await?;
    Ok(Json(sale_view(sale)))
}
