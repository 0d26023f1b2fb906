//! Internal helpers for input validation and store error classification.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same rules.

use sea_orm::{DbErr, SqlErr};

use crate::{EngineError, ResultEngine};

/// Trim a required name, rejecting blank input.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_price(price: i64) -> ResultEngine<()> {
    if price <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "price must be > 0, got {price}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_image(image: &[u8], max_bytes: usize) -> ResultEngine<()> {
    if image.len() > max_bytes {
        return Err(EngineError::InvalidArgument(format!(
            "image is {} bytes, limit is {max_bytes}",
            image.len()
        )));
    }
    Ok(())
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
/// pattern.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_required_name("  lamp ", "item").unwrap(), "lamp");
        assert_eq!(
            normalize_required_name("   ", "item"),
            Err(EngineError::InvalidArgument(
                "item name must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn price_must_be_positive() {
        assert!(validate_price(1).is_ok());
        assert!(validate_price(0).is_err());
        assert!(validate_price(-5).is_err());
    }

    #[test]
    fn image_limit_is_inclusive() {
        assert!(validate_image(&[0; 4], 4).is_ok());
        assert!(validate_image(&[0; 5], 4).is_err());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("chair"), "chair");
    }
}
