//! Marketplace engine: users, listings, the item status machine, the balance
//! ledger and favorites, persisted with sea-orm.
//!
//! Every public operation lives on [`Engine`] and runs inside a single store
//! transaction.

pub use categories::Category;
pub use commands::{NewItemCmd, UpdateItemCmd};
pub use credentials::{CredentialHasher, SaltedSha256, SessionToken};
pub use error::EngineError;
pub use favorite_folders::FavoriteFolder;
pub use items::{Item, ItemDetail, ItemStatus, ItemSummary};
pub use ops::{AuthenticatedUser, Engine, EngineBuilder};
pub use sales::Sale;
pub use users::User;

mod categories;
mod commands;
mod credentials;
mod error;
mod favorite_folders;
mod favorite_items;
mod items;
mod ops;
mod sales;
mod sessions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
