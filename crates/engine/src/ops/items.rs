use chrono::Utc;
use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait, prelude::*,
    sea_query::{Expr, LikeExpr},
};

use crate::{
    EngineError, Item, ItemDetail, ItemStatus, ItemSummary, NewItemCmd, ResultEngine,
    UpdateItemCmd, categories,
    items::{self, SummaryRow},
    util::{
        escape_like, is_foreign_key_violation, normalize_required_name, validate_image,
        validate_price,
    },
};

use super::{AuthenticatedUser, Engine, access::item_status, with_tx};

/// Items joined with their category, projected to [`ItemSummary`] columns.
pub(super) fn summaries() -> Select<items::Entity> {
    items::Entity::find()
        .select_only()
        .column(items::Column::Id)
        .column(items::Column::Name)
        .column(items::Column::Price)
        .column(items::Column::SellerId)
        .column(items::Column::CategoryId)
        .column_as(categories::Column::Name, "category_name")
        .column(items::Column::Status)
        .column(items::Column::UpdatedAt)
        .join(JoinType::InnerJoin, items::Relation::Category.def())
}

pub(super) async fn load_summaries<C>(
    query: Select<items::Entity>,
    db: &C,
) -> ResultEngine<Vec<ItemSummary>>
where
    C: ConnectionTrait,
{
    query
        .into_model::<SummaryRow>()
        .all(db)
        .await?
        .into_iter()
        .map(ItemSummary::try_from)
        .collect()
}

impl Engine {
    /// List a new item in `Initial` status and return its id.
    pub async fn add_item(
        &self,
        seller: &AuthenticatedUser,
        cmd: NewItemCmd,
    ) -> ResultEngine<i64> {
        let name = normalize_required_name(&cmd.name, "item")?;
        validate_price(cmd.price)?;
        validate_image(&cmd.image, self.max_image_bytes)?;
        let seller_id = seller.user_id();
        let category_id = cmd.category_id;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let active = items::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                price: ActiveValue::Set(cmd.price),
                description: ActiveValue::Set(cmd.description),
                category_id: ActiveValue::Set(category_id),
                seller_id: ActiveValue::Set(seller_id),
                image: ActiveValue::Set(cmd.image),
                status: ActiveValue::Set(ItemStatus::Initial.as_str().to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            let model = match active.insert(&db_tx).await {
                Ok(model) => model,
                Err(err) if is_foreign_key_violation(&err) => {
                    self.require_category(&db_tx, category_id).await?;
                    self.require_user(&db_tx, seller_id).await?;
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            };
            // Covers connections opened without foreign key enforcement.
            self.require_category(&db_tx, category_id).await?;

            tracing::info!(item_id = model.id, seller_id, price = model.price, "item listed");
            Ok(model.id)
        })
    }

    /// Replace the editable fields of one of the caller's listings.
    ///
    /// Only `Initial` items can be edited; status and seller never change.
    pub async fn update_item(
        &self,
        seller: &AuthenticatedUser,
        item_id: i64,
        cmd: UpdateItemCmd,
    ) -> ResultEngine<i64> {
        let name = normalize_required_name(&cmd.name, "item")?;
        validate_price(cmd.price)?;
        validate_image(&cmd.image, self.max_image_bytes)?;
        let seller_id = seller.user_id();
        let category_id = cmd.category_id;

        with_tx!(self, |db_tx| {
            let active = items::ActiveModel {
                id: ActiveValue::Unchanged(item_id),
                name: ActiveValue::Set(name),
                price: ActiveValue::Set(cmd.price),
                description: ActiveValue::Set(cmd.description),
                category_id: ActiveValue::Set(category_id),
                image: ActiveValue::Set(cmd.image),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let updated = items::Entity::update(active)
                .filter(items::Column::SellerId.eq(seller_id))
                .filter(items::Column::Status.eq(ItemStatus::Initial.as_str()))
                .exec(&db_tx)
                .await;
            match updated {
                Ok(_) => {}
                Err(DbErr::RecordNotUpdated) => {
                    let model = self.require_item_owned(&db_tx, item_id, seller_id).await?;
                    item_status(&model)?.ensure_editable()?;
                    return Err(DbErr::RecordNotUpdated.into());
                }
                Err(err) if is_foreign_key_violation(&err) => {
                    self.require_category(&db_tx, category_id).await?;
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
            self.require_category(&db_tx, category_id).await?;

            tracing::info!(item_id, seller_id, "item updated");
            Ok(item_id)
        })
    }

    /// One item with its category name.
    pub async fn item(&self, item_id: i64) -> ResultEngine<ItemDetail> {
        with_tx!(self, |db_tx| {
            let (model, category) = items::Entity::find_by_id(item_id)
                .find_also_related(categories::Entity)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("item not exists".to_string()))?;
            let category = category
                .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;
            Ok(ItemDetail {
                item: Item::try_from(model)?,
                category_name: category.name,
            })
        })
    }

    /// Raw image bytes of an item.
    pub async fn item_image(&self, item_id: i64) -> ResultEngine<Vec<u8>> {
        with_tx!(self, |db_tx| {
            items::Entity::find_by_id(item_id)
                .select_only()
                .column(items::Column::Image)
                .into_tuple::<Vec<u8>>()
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("item not exists".to_string()))
        })
    }

    /// Items currently on sale, most recently updated first.
    pub async fn list_on_sale(&self) -> ResultEngine<Vec<ItemSummary>> {
        with_tx!(self, |db_tx| {
            let query = summaries()
                .filter(items::Column::Status.eq(ItemStatus::OnSale.as_str()))
                .order_by_desc(items::Column::UpdatedAt)
                .order_by_desc(items::Column::Id);
            load_summaries(query, &db_tx).await
        })
    }

    /// Every item of a seller, whatever its status, in creation order.
    pub async fn list_by_seller(&self, seller_id: i64) -> ResultEngine<Vec<ItemSummary>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, seller_id).await?;
            let query = summaries()
                .filter(items::Column::SellerId.eq(seller_id))
                .order_by_asc(items::Column::Id);
            load_summaries(query, &db_tx).await
        })
    }

    /// On-sale items whose name contains `name`, most recently updated first.
    ///
    /// `%` and `_` in `name` match literally.
    pub async fn search(&self, name: &str) -> ResultEngine<Vec<ItemSummary>> {
        let pattern = format!("%{}%", escape_like(name.trim()));
        with_tx!(self, |db_tx| {
            let query = summaries()
                .filter(items::Column::Status.eq(ItemStatus::OnSale.as_str()))
                .filter(
                    Expr::col((items::Entity, items::Column::Name))
                        .like(LikeExpr::new(pattern).escape('\\')),
                )
                .order_by_desc(items::Column::UpdatedAt)
                .order_by_desc(items::Column::Id);
            load_summaries(query, &db_tx).await
        })
    }
}
