//! Error taxonomy shared by stores, actions and the HTTP layer.
//!
//! - validation problems are field-scoped and non-fatal (`ActionError::Invalid`)
//! - authorization denials never say whether the record exists
//! - lookups that miss degrade to `None`/`null` at the edges

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::auth::AuthError;

/// Errors raised by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate vote, duplicate
    /// endorsement, repeated access request).
    #[error("Record already exists: {0}")]
    Conflict(&'static str),

    #[error("Record not found: {0}")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Maps a unique-violation database error to `Conflict`, passing every
    /// other error through.
    pub fn from_unique(err: sqlx::Error, what: &'static str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(what);
            }
        }
        StoreError::Database(err)
    }
}

/// Field-scoped validation messages, reported back to the form that
/// submitted them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a single failing field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    pub fn on(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded, otherwise `ActionError::Invalid`.
    pub fn into_result(self) -> Result<(), ActionError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ActionError::Invalid(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{} {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Outcome of a failed citizen or admin action.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Invalid: {0}")]
    Invalid(ValidationErrors),

    /// Silent denial: callers must not reveal whether the subject exists.
    #[error("Not authorized")]
    NotAuthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ActionError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ActionError::Invalid(ValidationErrors::single(field, message))
    }
}

impl From<AuthError> for ActionError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthorized | AuthError::AuthenticationRequired => {
                ActionError::NotAuthorized
            }
            AuthError::InvalidToken => ActionError::NotAuthorized,
            AuthError::Internal(e) => ActionError::Internal(e),
        }
    }
}
