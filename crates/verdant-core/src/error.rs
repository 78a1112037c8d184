//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Validation, conflict and authorization messages are user-facing and are
/// written in Spanish; infrastructure messages are operator-facing.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// Identifier used for the lookup.
        id: String,
    },

    /// A validation error in domain logic.
    #[error("{0}")]
    Validation(String),

    /// The caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// The request conflicts with existing state.
    #[error("{0}")]
    Conflict(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`DomainError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`DomainError::Infrastructure`].
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity_and_id() {
        let err = DomainError::not_found("module", "abc");
        assert_eq!(err.to_string(), "module not found: abc");
    }

    #[test]
    fn test_validation_message_is_passed_through_verbatim() {
        let err = DomainError::validation("El nombre es obligatorio");
        assert_eq!(err.to_string(), "El nombre es obligatorio");
    }
}
