//! Completed purchases.
//!
//! A `Sale` is written in the same store transaction that marks the item
//! sold out and moves the money, so every sold item has exactly one row.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub item_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub price: i64,
    pub sold_at: DateTime<Utc>,
}

impl From<Model> for Sale {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            buyer_id: model.buyer_id,
            seller_id: model.seller_id,
            price: model.price,
            sold_at: model.sold_at,
        }
    }
}

/// Active model for a new sale; the id is assigned by the insert.
pub(crate) fn new_sale(
    item_id: i64,
    buyer_id: i64,
    seller_id: i64,
    price: i64,
    sold_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::NotSet,
        item_id: ActiveValue::Set(item_id),
        buyer_id: ActiveValue::Set(buyer_id),
        seller_id: ActiveValue::Set(seller_id),
        price: ActiveValue::Set(price),
        sold_at: ActiveValue::Set(sold_at),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub item_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub price: i64,
    pub sold_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Item,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
