//! Status transitions that move money: putting an item on sale and buying it.
//!
//! Each operation starts its transaction with the guarded write (a conditional
//! update keyed on the current status), then reads to explain a rejection.
//! The guard decides who wins a race, the reads only pick the error.

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{EngineError, ItemStatus, ResultEngine, Sale, items, sales};

use super::{AuthenticatedUser, Engine, access::item_status, with_tx};

impl Engine {
    /// Put one of the caller's `Initial` items on sale.
    ///
    /// Nothing but the status changes.
    pub async fn sell(&self, seller: &AuthenticatedUser, item_id: i64) -> ResultEngine<()> {
        let seller_id = seller.user_id();
        let from = ItemStatus::Initial;
        let to = from.sell()?;

        with_tx!(self, |db_tx| {
            let res = items::Entity::update_many()
                .col_expr(items::Column::Status, Expr::value(to.as_str()))
                .filter(items::Column::Id.eq(item_id))
                .filter(items::Column::SellerId.eq(seller_id))
                .filter(items::Column::Status.eq(from.as_str()))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                let model = self.require_item_owned(&db_tx, item_id, seller_id).await?;
                item_status(&model)?.sell()?;
                return Err(DbErr::RecordNotUpdated.into());
            }

            tracing::info!(item_id, seller_id, "item put on sale");
            Ok(())
        })
    }

    /// Buy an item that is on sale.
    ///
    /// In one transaction: the item flips to `SoldOut`, the buyer is debited,
    /// the seller (read inside the transaction) is credited and a [`Sale`] is
    /// recorded. Any failure rolls all of it back. Of several concurrent
    /// buyers exactly one succeeds; the others get `PreconditionFailed`.
    pub async fn purchase(&self, buyer: &AuthenticatedUser, item_id: i64) -> ResultEngine<Sale> {
        let buyer_id = buyer.user_id();
        let from = ItemStatus::OnSale;
        let to = from.purchase()?;

        with_tx!(self, |db_tx| {
            let claimed = items::Entity::update_many()
                .col_expr(items::Column::Status, Expr::value(to.as_str()))
                .filter(items::Column::Id.eq(item_id))
                .filter(items::Column::Status.eq(from.as_str()))
                .filter(items::Column::SellerId.ne(buyer_id))
                .exec(&db_tx)
                .await?
                .rows_affected
                == 1;

            let item = self.require_item(&db_tx, item_id).await?;
            if !claimed {
                tracing::debug!(item_id, buyer_id, status = %item.status, "purchase rejected");
                if item.seller_id == buyer_id {
                    return Err(EngineError::PreconditionFailed(
                        "sellers cannot purchase their own items".to_string(),
                    ));
                }
                item_status(&item)?.purchase()?;
                return Err(DbErr::RecordNotUpdated.into());
            }

            if !self.debit(&db_tx, buyer_id, item.price).await? {
                self.require_user(&db_tx, buyer_id).await?;
                tracing::debug!(item_id, buyer_id, price = item.price, "insufficient funds");
                return Err(EngineError::InsufficientFunds(format!(
                    "balance is below the price of {}",
                    item.price
                )));
            }
            if !self.credit(&db_tx, item.seller_id, item.price).await? {
                self.require_user(&db_tx, item.seller_id).await?;
                return Err(EngineError::PreconditionFailed(
                    "seller balance would exceed the maximum representable amount".to_string(),
                ));
            }

            let sale = sales::new_sale(item_id, buyer_id, item.seller_id, item.price, Utc::now())
                .insert(&db_tx)
                .await?;

            tracing::info!(
                item_id,
                buyer_id,
                seller_id = item.seller_id,
                price = item.price,
                "purchase completed"
            );
            Ok(Sale::from(sale))
        })
    }

    /// Purchases made by the caller, newest first.
    pub async fn purchases(&self, buyer: &AuthenticatedUser) -> ResultEngine<Vec<Sale>> {
        with_tx!(self, |db_tx| {
            let models = sales::Entity::find()
                .filter(sales::Column::BuyerId.eq(buyer.user_id()))
                .order_by_desc(sales::Column::SoldAt)
                .order_by_desc(sales::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Sale::from).collect())
        })
    }
}
