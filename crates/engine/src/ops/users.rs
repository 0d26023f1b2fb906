use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, SessionToken, User,
    credentials::{generate_token, token_digest},
    sessions, users,
    util::normalize_required_name,
};

use super::{AuthenticatedUser, Engine, with_tx};

async fn delete_expired_sessions<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> ResultEngine<u64> {
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

impl Engine {
    /// Run the configured hasher on the blocking pool.
    async fn hash_password(&self, password: &str) -> ResultEngine<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| EngineError::Credential(format!("hashing task failed: {err}")))?
    }

    async fn verify_password(&self, stored: String, password: &str) -> ResultEngine<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&stored, &password))
            .await
            .map_err(|err| EngineError::Credential(format!("verify task failed: {err}")))?
    }

    async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| delete_expired_sessions(&db_tx, now).await)
    }

    /// Create an account with a zero balance and return its id.
    ///
    /// The id comes from the insert itself.
    pub async fn register(&self, name: &str, password: &str) -> ResultEngine<i64> {
        let name = normalize_required_name(name, "user")?;
        if password.is_empty() {
            return Err(EngineError::InvalidArgument(
                "password must not be empty".to_string(),
            ));
        }
        let password = self.hash_password(password).await?;

        with_tx!(self, |db_tx| {
            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                password: ActiveValue::Set(password),
                balance: ActiveValue::Set(0),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(user_id = model.id, "user registered");
            Ok(model.id)
        })
    }

    /// Verify credentials and open a session.
    ///
    /// An unknown user and a wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, user_id: i64, password: &str) -> ResultEngine<SessionToken> {
        let invalid = || EngineError::Unauthorized("invalid credentials".to_string());

        let user = users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        if !self.verify_password(user.password, password).await? {
            tracing::debug!(user_id, "login rejected");
            return Err(invalid());
        }

        let token = generate_token()?;
        let created_at = Utc::now();
        let expires_at = created_at
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| EngineError::InvalidArgument("session ttl overflow".to_string()))?;

        with_tx!(self, |db_tx| {
            let pruned = delete_expired_sessions(&db_tx, created_at).await?;
            if pruned > 0 {
                tracing::debug!(pruned, "expired sessions removed");
            }
            sessions::ActiveModel {
                token_hash: ActiveValue::Set(token_digest(token.as_str())),
                user_id: ActiveValue::Set(user.id),
                created_at: ActiveValue::Set(created_at),
                expires_at: ActiveValue::Set(expires_at),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(user_id, "session opened");
            Ok(token)
        })
    }

    /// Resolve a bearer token into the user it was issued to.
    ///
    /// Meeting an expired session removes it along with any other expired
    /// rows.
    pub async fn authenticate(&self, token: &str) -> ResultEngine<AuthenticatedUser> {
        let invalid = || EngineError::Unauthorized("invalid or expired session".to_string());

        let session = sessions::Entity::find_by_id(token_digest(token))
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;

        let now = Utc::now();
        if session.expires_at > now {
            return Ok(AuthenticatedUser::new(session.user_id));
        }

        let pruned = self.prune_expired_sessions(now).await?;
        tracing::debug!(user_id = session.user_id, pruned, "expired session rejected");
        Err(invalid())
    }

    /// Close the session identified by `token`.
    pub async fn logout(&self, user: &AuthenticatedUser, token: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let res = sessions::Entity::delete_many()
                .filter(sessions::Column::TokenHash.eq(token_digest(token)))
                .filter(sessions::Column::UserId.eq(user.user_id()))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(EngineError::Unauthorized(
                    "invalid or expired session".to_string(),
                ));
            }
            Ok(())
        })
    }

    /// Public profile of a user.
    pub async fn user(&self, user_id: i64) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            Ok(User::from(model))
        })
    }
}
