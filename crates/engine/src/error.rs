//! The module contains the error the engine can throw.
//!
//! Every failure of a marketplace operation is classified into exactly one
//! variant, so the boundary layer can map it to a stable response:
//!
//! - [`Unauthorized`] missing, expired or invalid credentials.
//! - [`Forbidden`] the caller is authenticated but does not own the resource.
//! - [`InvalidArgument`] malformed input (empty name, unknown category, ...).
//! - [`PreconditionFailed`] the request is valid but the current state does
//!   not allow it (wrong item status, self-purchase).
//! - [`InsufficientFunds`] the buyer cannot afford the item.
//! - [`NotFound`] a referenced entity does not exist.
//!
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InvalidArgument`]: EngineError::InvalidArgument
//!  [`PreconditionFailed`]: EngineError::PreconditionFailed
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`NotFound`]: EngineError::NotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::PreconditionFailed(a), Self::PreconditionFailed(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Credential(a), Self::Credential(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
