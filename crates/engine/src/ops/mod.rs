use std::{sync::Arc, time::Duration};

use chrono::TimeDelta;
use sea_orm::DatabaseConnection;

use crate::{CredentialHasher, EngineError, ResultEngine, SaltedSha256};

mod access;
mod balances;
mod categories;
mod favorites;
mod items;
mod trade;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(72 * 60 * 60);
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Proof that a request carries a valid session.
///
/// Only [`Engine::authenticate`] can produce one, so every operation that
/// takes an `&AuthenticatedUser` acts on behalf of a verified user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user_id: i64,
}

impl AuthenticatedUser {
    pub(crate) fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    hasher: Arc<dyn CredentialHasher>,
    session_ttl: TimeDelta,
    max_image_bytes: usize,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    hasher: Arc<dyn CredentialHasher>,
    session_ttl: Duration,
    max_image_bytes: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            hasher: Arc::new(SaltedSha256::default()),
            session_ttl: DEFAULT_SESSION_TTL,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the password hasher.
    pub fn hasher(mut self, hasher: impl CredentialHasher + 'static) -> EngineBuilder {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Lifetime of sessions issued by `login`. Defaults to 72 hours.
    pub fn session_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.session_ttl = ttl;
        self
    }

    /// Largest accepted item image, in bytes. Defaults to 5 MiB.
    pub fn max_image_bytes(mut self, max: usize) -> EngineBuilder {
        self.max_image_bytes = max;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let session_ttl = TimeDelta::from_std(self.session_ttl).map_err(|_| {
            EngineError::InvalidArgument("session ttl is out of range".to_string())
        })?;
        if session_ttl <= TimeDelta::zero() {
            return Err(EngineError::InvalidArgument(
                "session ttl must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            hasher: self.hasher,
            session_ttl,
            max_image_bytes: self.max_image_bytes,
        })
    }
}
