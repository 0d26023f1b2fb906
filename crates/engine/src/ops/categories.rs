use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    Category, EngineError, ResultEngine, categories,
    util::{is_unique_violation, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// All categories, by id.
    pub async fn list_categories(&self) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .order_by_asc(categories::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Category::from).collect())
        })
    }

    /// Add a category. Names are unique, ignoring case.
    ///
    /// Operator-only: not reachable over HTTP.
    pub async fn create_category(&self, name: &str) -> ResultEngine<i64> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let exists = categories::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::InvalidArgument(format!(
                    "category '{name}' already exists"
                )));
            }

            let inserted = categories::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name.clone()),
            }
            .insert(&db_tx)
            .await;
            let model = match inserted {
                Ok(model) => model,
                Err(err) if is_unique_violation(&err) => {
                    return Err(EngineError::InvalidArgument(format!(
                        "category '{name}' already exists"
                    )));
                }
                Err(err) => return Err(err.into()),
            };
            tracing::info!(category_id = model.id, name = %model.name, "category created");
            Ok(model.id)
        })
    }
}
