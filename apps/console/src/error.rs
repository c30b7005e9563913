//! # Session Errors
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in a Session                              │
//! │                                                                         │
//! │  Vendor / customer action                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError (bad input, duplicate code, reserve reached)                │
//! │         └──► shown to the user, menu continues                          │
//! │                                                                         │
//! │  DbError (storage failed)                                              │
//! │         └──► machine reloaded from storage, logged, generic message    │
//! │                                                                         │
//! │  InputClosed                                                           │
//! │         └──► session ends quietly                                      │
//! │                                                                         │
//! │  The role loop never exits because of a session error.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use vendo_core::CoreError;
use vendo_db::DbError;

/// Shown when the cause is not the user's to fix.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

#[derive(Debug, Error)]
pub enum SessionError {
    /// A machine rule rejected the action.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failed; the in-memory machine has been reloaded.
    #[error("Storage failed: {0}")]
    Db(#[from] DbError),

    /// The user's input ended mid-session.
    #[error("Input closed")]
    InputClosed,
}

impl SessionError {
    /// Text for the person at the machine.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Core(e) => user_facing(e),
            SessionError::Db(DbError::Domain(e)) => user_facing(e),
            SessionError::Db(_) => UNEXPECTED_ERROR.to_string(),
            SessionError::InputClosed => String::new(),
        }
    }
}

/// Validation errors read better without the "Validation error:" prefix.
fn user_facing(err: &CoreError) -> String {
    match err {
        CoreError::Validation(v) => v.to_string(),
        CoreError::ProductNotFound(code) => format!("Product with code {} does not exist.", code),
        other => other.to_string(),
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vendo_core::ValidationError;

    #[test]
    fn test_user_messages() {
        let err = SessionError::from(CoreError::ProductNotFound("Z9".into()));
        assert_eq!(err.user_message(), "Product with code Z9 does not exist.");

        let err = SessionError::from(CoreError::from(ValidationError::Required {
            field: "coin".into(),
        }));
        assert_eq!(err.user_message(), "coin is required");

        let err = SessionError::from(DbError::PoolExhausted);
        assert_eq!(err.user_message(), UNEXPECTED_ERROR);
    }
}
