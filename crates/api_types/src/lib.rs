use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a listing: `initial` → `on_sale` → `sold_out`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Initial,
    OnSale,
    SoldOut,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub name: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Registered {
        pub user_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub user_id: i64,
        pub password: String,
    }

    /// Public view of a user. Balances are only shown to their owner.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Profile {
        pub id: i64,
        pub name: String,
    }

    /// A bearer token for the `Authorization` header.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Session {
        pub token: String,
    }
}

pub mod item {
    use super::*;

    /// Request body for creating or updating a listing.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemUpsert {
        pub name: String,
        /// Must be > 0.
        pub price: i64,
        #[serde(default)]
        pub description: String,
        pub category_id: i64,
        /// Image bytes, standard base64.
        #[serde(default)]
        pub image: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemCreated {
        pub item_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemView {
        pub id: i64,
        pub name: String,
        pub price: i64,
        pub description: String,
        pub category_id: i64,
        pub category_name: String,
        pub seller_id: i64,
        pub status: ItemStatus,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Listing row returned by list and search endpoints.
    #[derive(Debug, Serialize, Deserialize)]
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemList {
        pub items: Vec<ItemSummary>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Search {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Sell {
        pub item_id: i64,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AddBalance {
        /// Must be >= 0.
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Balance {
        pub balance: i64,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Category {
        pub id: i64,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryList {
        pub categories: Vec<Category>,
    }
}

pub mod favorite {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FolderNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FolderCreated {
        pub folder_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Folder {
        pub id: i64,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FolderList {
        pub folders: Vec<Folder>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FavoriteAdd {
        pub item_id: i64,
        pub folder_id: i64,
    }
}

pub mod sale {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Sale {
        pub id: i64,
        pub item_id: i64,
        pub buyer_id: i64,
        pub seller_id: i64,
        pub price: i64,
        pub sold_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleList {
        pub sales: Vec<Sale>,
    }
}
