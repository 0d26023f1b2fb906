//! Balance ledger.
//!
//! Balances are only ever changed through conditional updates, so a balance
//! can neither go below zero nor overflow `i64`, whatever else runs
//! concurrently.

use sea_orm::{
    DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{EngineError, ResultEngine, users};

use super::{AuthenticatedUser, Engine, with_tx};

impl Engine {
    /// Top up the caller's balance and return the new amount.
    ///
    /// Negative amounts are rejected with `InvalidArgument` and leave the
    /// balance unchanged.
    pub async fn add_balance(&self, user: &AuthenticatedUser, amount: i64) -> ResultEngine<i64> {
        if amount < 0 {
            return Err(EngineError::InvalidArgument(format!(
                "amount must be >= 0, got {amount}"
            )));
        }
        let user_id = user.user_id();

        with_tx!(self, |db_tx| {
            if !self.credit(&db_tx, user_id, amount).await? {
                self.require_user(&db_tx, user_id).await?;
                return Err(EngineError::InvalidArgument(
                    "balance would exceed the maximum representable amount".to_string(),
                ));
            }
            let model = self.require_user(&db_tx, user_id).await?;
            tracing::debug!(user_id, amount, balance = model.balance, "balance added");
            Ok(model.balance)
        })
    }

    /// Current balance of the caller.
    pub async fn balance(&self, user: &AuthenticatedUser) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user.user_id()).await?;
            Ok(model.balance)
        })
    }

    /// `balance -= amount` if the user can afford it. Returns whether a row
    /// changed.
    pub(super) async fn debit(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
    ) -> ResultEngine<bool> {
        let res = users::Entity::update_many()
            .col_expr(
                users::Column::Balance,
                Expr::col(users::Column::Balance).sub(amount),
            )
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Balance.gte(amount))
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// `balance += amount` unless it would overflow. Returns whether a row
    /// changed.
    pub(super) async fn credit(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
    ) -> ResultEngine<bool> {
        let res = users::Entity::update_many()
            .col_expr(
                users::Column::Balance,
                Expr::col(users::Column::Balance).add(amount),
            )
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Balance.lte(i64::MAX - amount))
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }
}
