use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{EngineError, ItemStatus, ResultEngine, categories, favorite_folders, items, users};

use super::Engine;

/// Generates a `require_*` lookup that fails with `NotFound` when the row is
/// missing.
macro_rules! impl_require_by_id {
    ($require_fn:ident, $entity:path, $model:ty, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: i64,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::NotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_by_id!(require_user, users::Entity, users::Model, "user not exists");

    impl_require_by_id!(require_item, items::Entity, items::Model, "item not exists");

    impl_require_by_id!(
        require_folder,
        favorite_folders::Entity,
        favorite_folders::Model,
        "favorite folder not exists"
    );

    /// A listing can only reference a known category; a missing one is a bad
    /// argument rather than a missing resource.
    pub(super) async fn require_category(
        &self,
        db: &DatabaseTransaction,
        category_id: i64,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidArgument(format!("category {category_id} not exists"))
            })
    }

    /// Load an item and check that `user_id` is its seller.
    pub(super) async fn require_item_owned(
        &self,
        db: &DatabaseTransaction,
        item_id: i64,
        user_id: i64,
    ) -> ResultEngine<items::Model> {
        let item = self.require_item(db, item_id).await?;
        if item.seller_id != user_id {
            return Err(EngineError::Forbidden(
                "item belongs to another seller".to_string(),
            ));
        }
        Ok(item)
    }

    /// Load a folder and check that `user_id` owns it.
    pub(super) async fn require_folder_owned(
        &self,
        db: &DatabaseTransaction,
        folder_id: i64,
        user_id: i64,
    ) -> ResultEngine<favorite_folders::Model> {
        let folder = self.require_folder(db, folder_id).await?;
        if folder.user_id != user_id {
            return Err(EngineError::Forbidden(
                "favorite folder belongs to another user".to_string(),
            ));
        }
        Ok(folder)
    }
}

pub(super) fn item_status(model: &items::Model) -> ResultEngine<ItemStatus> {
    ItemStatus::try_from(model.status.as_str())
}
