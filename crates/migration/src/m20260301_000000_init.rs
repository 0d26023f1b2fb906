//! Initial schema migration.
//!
//! Creates the complete schema for Mercato:
//!
//! - `users`: accounts with a hashed credential and an integer balance
//! - `categories`: static listing categories (seeded here)
//! - `items`: listings owned by a seller, with their image payload and status
//! - `favorite_folders`: user-owned buckets of favorite items
//! - `favorite_items`: item/folder associations
//! - `sessions`: issued login sessions (token digests only)
//! - `sales`: one row per completed purchase

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Categories available on a fresh database.
const SEED_CATEGORIES: [&str; 6] = [
    "fashion",
    "furniture",
    "kitchen",
    "electronics",
    "books",
    "toys",
];

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Password,
    Balance,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Items {
    Table,
    Id,
    Name,
    Price,
    Description,
    CategoryId,
    SellerId,
    Image,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum FavoriteFolders {
    Table,
    Id,
    UserId,
    Name,
}

#[derive(Iden)]
enum FavoriteItems {
    Table,
    FolderId,
    ItemId,
    AddedAt,
}

#[derive(Iden)]
enum Sessions {
    Table,
    TokenHash,
    UserId,
    CreatedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum Sales {
    Table,
    Id,
    ItemId,
    BuyerId,
    SellerId,
    Price,
    SoldAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(
                        ColumnDef::new(Users::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .check(Expr::col(Users::Balance).gte(0))
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-name-unique")
                    .table(Categories::Table)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        let backend = db.get_database_backend();
        for name in SEED_CATEGORIES {
            let stmt = Query::insert()
                .into_table(Categories::Table)
                .columns([Categories::Name])
                .values_panic([name.into()])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 3. Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::Price).big_integer().not_null())
                    .col(ColumnDef::new(Items::Description).string().not_null())
                    .col(ColumnDef::new(Items::CategoryId).big_integer().not_null())
                    .col(ColumnDef::new(Items::SellerId).big_integer().not_null())
                    .col(ColumnDef::new(Items::Image).blob().not_null())
                    .col(
                        ColumnDef::new(Items::Status)
                            .string()
                            .not_null()
                            .default("initial"),
                    )
                    .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Items::UpdatedAt).timestamp().not_null())
                    .check(Expr::col(Items::Price).gt(0))
                    .check(Expr::col(Items::Status).is_in(["initial", "on_sale", "sold_out"]))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-category_id")
                            .from(Items::Table, Items::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-seller_id")
                            .from(Items::Table, Items::SellerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-items-status-updated_at")
                    .table(Items::Table)
                    .col(Items::Status)
                    .col(Items::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-items-seller_id")
                    .table(Items::Table)
                    .col(Items::SellerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Favorite folders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FavoriteFolders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FavoriteFolders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FavoriteFolders::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FavoriteFolders::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-favorite_folders-user_id")
                            .from(FavoriteFolders::Table, FavoriteFolders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Favorite items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FavoriteItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FavoriteItems::FolderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FavoriteItems::ItemId).big_integer().not_null())
                    .col(
                        ColumnDef::new(FavoriteItems::AddedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(FavoriteItems::FolderId)
                            .col(FavoriteItems::ItemId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-favorite_items-folder_id")
                            .from(FavoriteItems::Table, FavoriteItems::FolderId)
                            .to(FavoriteFolders::Table, FavoriteFolders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-favorite_items-item_id")
                            .from(FavoriteItems::Table, FavoriteItems::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Sessions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::TokenHash)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Sessions::ExpiresAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-user_id")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Sales
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sales::ItemId).big_integer().not_null())
                    .col(ColumnDef::new(Sales::BuyerId).big_integer().not_null())
                    .col(ColumnDef::new(Sales::SellerId).big_integer().not_null())
                    .col(ColumnDef::new(Sales::Price).big_integer().not_null())
                    .col(ColumnDef::new(Sales::SoldAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-item_id")
                            .from(Sales::Table, Sales::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-buyer_id")
                            .from(Sales::Table, Sales::BuyerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-seller_id")
                            .from(Sales::Table, Sales::SellerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // An item is sold at most once.
        manager
            .create_index(
                Index::create()
                    .name("idx-sales-item_id-unique")
                    .table(Sales::Table)
                    .col(Sales::ItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales-buyer_id-sold_at")
                    .table(Sales::Table)
                    .col(Sales::BuyerId)
                    .col(Sales::SoldAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FavoriteItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FavoriteFolders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
