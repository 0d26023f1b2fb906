//! Purchase history.

use api_types::sale::{Sale, SaleList};
use axum::{Extension, Json, extract::State};
use engine::AuthenticatedUser;

use crate::{ServerError, server::ServerState};

pub(crate) fn sale_view(sale: engine::Sale) -> Sale {
    Sale {
        id: sale.id,
        item_id: sale.item_id,
        buyer_id: sale.buyer_id,
        seller_id: sale.seller_id,
        price: sale.price,
        sold_at: sale.sold_at,
    }
}

pub async fn list(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<Json<SaleList>, ServerError> {
    let sales = state
        .engine
        .purchases(&user)
        .await?
        .into_iter()
        .map(sale_view)
        .collect();
    Ok(Json(SaleList { sales }))
}
