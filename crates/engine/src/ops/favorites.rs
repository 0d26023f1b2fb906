//! Favorite folders.
//!
//! Folders are private: every operation on a folder requires the caller to
//! own it. Adding an item that is already in a folder is a no-op.

use chrono::Utc;
use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};

use crate::{
    EngineError, FavoriteFolder, ItemSummary, ResultEngine, favorite_folders, favorite_items,
    items,
    util::{is_foreign_key_violation, normalize_required_name},
};

use super::{
    AuthenticatedUser, Engine,
    items::{load_summaries, summaries},
    with_tx,
};

impl Engine {
    /// Create a folder owned by the caller. Names need not be unique.
    pub async fn add_folder(&self, user: &AuthenticatedUser, name: &str) -> ResultEngine<i64> {
        let name = normalize_required_name(name, "folder")?;
        let user_id = user.user_id();
        with_tx!(self, |db_tx| {
            let inserted = favorite_folders::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                name: ActiveValue::Set(name),
            }
            .insert(&db_tx)
            .await;
            let model = match inserted {
                Ok(model) => model,
                Err(err) if is_foreign_key_violation(&err) => {
                    self.require_user(&db_tx, user_id).await?;
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            };
            tracing::debug!(folder_id = model.id, user_id, "favorite folder created");
            Ok(model.id)
        })
    }

    /// Folders of the caller, in creation order.
    pub async fn list_folders(
        &self,
        user: &AuthenticatedUser,
    ) -> ResultEngine<Vec<FavoriteFolder>> {
        with_tx!(self, |db_tx| {
            let models = favorite_folders::Entity::find()
                .filter(favorite_folders::Column::UserId.eq(user.user_id()))
                .order_by_asc(favorite_folders::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(FavoriteFolder::from).collect())
        })
    }

    /// Put an item into one of the caller's folders.
    pub async fn add_item_to_folder(
        &self,
        user: &AuthenticatedUser,
        item_id: i64,
        folder_id: i64,
    ) -> ResultEngine<()> {
        let user_id = user.user_id();
        with_tx!(self, |db_tx| {
            let inserted = favorite_items::Entity::insert(favorite_items::ActiveModel {
                folder_id: ActiveValue::Set(folder_id),
                item_id: ActiveValue::Set(item_id),
                added_at: ActiveValue::Set(Utc::now()),
            })
            .on_conflict(
                OnConflict::columns([
                    favorite_items::Column::FolderId,
                    favorite_items::Column::ItemId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&db_tx)
            .await;
            match inserted {
                Ok(_) => {}
                Err(err) if is_foreign_key_violation(&err) => {
                    self.require_folder_owned(&db_tx, folder_id, user_id).await?;
                    self.require_item(&db_tx, item_id).await?;
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
            self.require_folder_owned(&db_tx, folder_id, user_id).await?;
            self.require_item(&db_tx, item_id).await?;

            tracing::debug!(item_id, folder_id, user_id, "item added to favorites");
            Ok(())
        })
    }

    /// Items of one of the caller's folders, in the order they were added.
    pub async fn list_favorite_items(
        &self,
        user: &AuthenticatedUser,
        folder_id: i64,
    ) -> ResultEngine<Vec<ItemSummary>> {
        with_tx!(self, |db_tx| {
            self.require_folder_owned(&db_tx, folder_id, user.user_id())
                .await?;
            let query = summaries()
                .join(JoinType::InnerJoin, items::Relation::FavoriteItems.def())
                .filter(favorite_items::Column::FolderId.eq(folder_id))
                .order_by_asc(favorite_items::Column::AddedAt)
                .order_by_asc(items::Column::Id);
            load_summaries(query, &db_tx).await
        })
    }

    /// Take an item out of one of the caller's folders.
    pub async fn remove_favorite(
        &self,
        user: &AuthenticatedUser,
        item_id: i64,
        folder_id: i64,
    ) -> ResultEngine<()> {
        let user_id = user.user_id();
        with_tx!(self, |db_tx| {
            let res = favorite_items::Entity::delete_many()
                .filter(favorite_items::Column::FolderId.eq(folder_id))
                .filter(favorite_items::Column::ItemId.eq(item_id))
                .exec(&db_tx)
                .await?;
            self.require_folder_owned(&db_tx, folder_id, user_id).await?;
            if res.rows_affected == 0 {
                return Err(EngineError::NotFound(
                    "item is not in the favorite folder".to_string(),
                ));
            }
            Ok(())
        })
    }
}
