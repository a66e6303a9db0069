use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("JWT validation failed: {0}")]
    JwtValidationFailed(String),

    #[error("JWT issuance failed: {0}")]
    JwtIssueFailed(String),

    #[error("Token has no domain claim")]
    MissingDomain,
}
