use thiserror::Error;

/// Authorization errors for the Fictions component
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Deliberately carries no detail about the subject.
    #[error("Not authorized")]
    NotAuthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
