use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerOptions, app, run, run_with_listener, spawn_with_listener};

mod balance;
mod categories;
mod favorites;
mod items;
mod sales;
mod server;
mod user;

pub mod types {
    pub mod user {
        pub use api_types::user::{Login, Profile, Register, Registered, Session};
    }

    pub mod item {
        pub use api_types::ItemStatus;
        pub use api_types::item::{
            ItemCreated, ItemList, ItemSummary, ItemUpsert, ItemView, Search, Sell,
        };
    }

    pub mod balance {
        pub use api_types::balance::{AddBalance, Balance};
    }

    pub mod category {
        pub use api_types::category::{Category, CategoryList};
    }

    pub mod favorite {
        pub use api_types::favorite::{
            FavoriteAdd, Folder, FolderCreated, FolderList, FolderNew,
        };
    }

    pub mod sale {
        pub use api_types::sale::{Sale, SaleList};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        EngineError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        EngineError::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Credential(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Credential(msg) => {
            tracing::error!("credential error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    fn status_of(err: EngineError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn engine_unauthorized_maps_to_401() {
        assert_eq!(
            status_of(EngineError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn engine_forbidden_maps_to_403() {
        assert_eq!(
            status_of(EngineError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn engine_invalid_argument_maps_to_400() {
        assert_eq!(
            status_of(EngineError::InvalidArgument("x".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn engine_precondition_maps_to_412() {
        assert_eq!(
            status_of(EngineError::PreconditionFailed("x".to_string())),
            StatusCode::PRECONDITION_FAILED
        );
    }

    #[test]
    fn engine_insufficient_funds_maps_to_402() {
        assert_eq!(
            status_of(EngineError::InsufficientFunds("x".to_string())),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        assert_eq!(
            status_of(EngineError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_errors_map_to_500() {
        assert_eq!(
            status_of(EngineError::Database(DbErr::Custom("boom".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(EngineError::Credential("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_messages_are_masked() {
        let msg = message_for_engine_error(EngineError::Database(DbErr::Custom(
            "secret table".to_string(),
        )));
        assert_eq!(msg, "internal server error");
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
