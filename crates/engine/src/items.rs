//! Listings and the item status machine.
//!
//! An item moves strictly forward through its lifecycle:
//!
//! ```text
//! Initial --sell--> OnSale --purchase--> SoldOut
//! ```
//!
//! [`ItemStatus::sell`] and [`ItemStatus::purchase`] are the only places that
//! decide whether a transition is legal. The operations in `ops` persist the
//! outcome with conditional updates keyed on the current status.

use chrono::{DateTime, Utc};
use sea_orm::{FromQueryResult, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Initial,
    OnSale,
    SoldOut,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::OnSale => "on_sale",
            Self::SoldOut => "sold_out",
        }
    }

    /// Status after the seller puts the item on sale.
    pub fn sell(self) -> ResultEngine<Self> {
        match self {
            Self::Initial => Ok(Self::OnSale),
            other => Err(EngineError::PreconditionFailed(format!(
                "item is {}, only initial items can be put on sale",
                other.as_str()
            ))),
        }
    }

    /// Status after a buyer purchases the item.
    pub fn purchase(self) -> ResultEngine<Self> {
        match self {
            Self::OnSale => Ok(Self::SoldOut),
            other => Err(EngineError::PreconditionFailed(format!(
                "item is {}, only items on sale can be purchased",
                other.as_str()
            ))),
        }
    }

    /// Listings can be edited until they are put on sale.
    pub fn ensure_editable(self) -> ResultEngine<()> {
        match self {
            Self::Initial => Ok(()),
            other => Err(EngineError::PreconditionFailed(format!(
                "item is {}, only initial items can be edited",
                other.as_str()
            ))),
        }
    }
}

impl TryFrom<&str> for ItemStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "initial" => Ok(Self::Initial),
            "on_sale" => Ok(Self::OnSale),
            "sold_out" => Ok(Self::SoldOut),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid item status: {other}"
            ))),
        }
    }
}

/// A full listing, image included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
    pub seller_id: i64,
    pub image: Vec<u8>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Model> for Item {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            status: ItemStatus::try_from(model.status.as_str())?,
            id: model.id,
            name: model.name,
            price: model.price,
            description: model.description,
            category_id: model.category_id,
            seller_id: model.seller_id,
            image: model.image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// An item together with the name of its category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemDetail {
    pub item: Item,
    pub category_name: String,
}

/// Listing projection used by every list/search operation. Carries no image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub seller_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the items/categories join behind [`ItemSummary`].
#[derive(Debug, FromQueryResult)]
pub(crate) struct SummaryRow {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub seller_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for ItemSummary {
    type Error = EngineError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: ItemStatus::try_from(row.status.as_str())?,
            id: row.id,
            name: row.name,
            price: row.price,
            seller_id: row.seller_id,
            category_id: row.category_id,
            category_name: row.category_name,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
    pub seller_id: i64,
    pub image: Vec<u8>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SellerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Seller,
    #[sea_orm(has_many = "super::favorite_items::Entity")]
    FavoriteItems,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::favorite_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FavoriteItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_names() {
        for status in [ItemStatus::Initial, ItemStatus::OnSale, ItemStatus::SoldOut] {
            assert_eq!(ItemStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(matches!(
            ItemStatus::try_from("reserved"),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sell_only_from_initial() {
        assert_eq!(ItemStatus::Initial.sell().unwrap(), ItemStatus::OnSale);
        assert!(matches!(
            ItemStatus::OnSale.sell(),
            Err(EngineError::PreconditionFailed(_))
        ));
        assert!(matches!(
            ItemStatus::SoldOut.sell(),
            Err(EngineError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn purchase_only_from_on_sale() {
        assert_eq!(ItemStatus::OnSale.purchase().unwrap(), ItemStatus::SoldOut);
        assert!(matches!(
            ItemStatus::Initial.purchase(),
            Err(EngineError::PreconditionFailed(_))
        ));
        assert!(matches!(
            ItemStatus::SoldOut.purchase(),
            Err(EngineError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn sold_out_is_terminal() {
        let status = ItemStatus::SoldOut;
        assert!(status.sell().is_err());
        assert!(status.purchase().is_err());
        assert!(status.ensure_editable().is_err());
    }

    #[test]
    fn only_initial_items_are_editable() {
        assert!(ItemStatus::Initial.ensure_editable().is_ok());
        assert!(ItemStatus::OnSale.ensure_editable().is_err());
    }
}
