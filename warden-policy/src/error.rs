use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// The rule store could not be queried. Never treated as a deny.
    #[error("Policy store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid authorization request: {0}")]
    InvalidRequest(String),

    #[error("Invalid policy assignment: {0}")]
    InvalidAssignment(String),
}
