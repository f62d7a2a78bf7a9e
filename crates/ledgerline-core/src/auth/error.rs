use thiserror::Error;

/// Failures of the durable session store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Credential lifecycle failures.
///
/// `Clone` so a single shared renewal operation can hand the same
/// settlement to every concurrent waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No refresh token stored - login required")]
    NoRefreshToken,

    #[error("Refresh token expired - login required")]
    RefreshExpired,

    #[error("Token could not be decoded: {0}")]
    MalformedToken(String),

    #[error("Token renewal failed: {0}")]
    RenewalFailed(String),

    #[error("Session store error: {0}")]
    Store(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}
