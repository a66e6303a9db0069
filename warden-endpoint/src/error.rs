use thiserror::Error;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Unknown HTTP verb: {0}")]
    UnknownVerb(String),

    #[error("Invalid permission declaration: {0}")]
    InvalidPermission(String),

    #[error("Invalid route path fragment: {0}")]
    InvalidPath(String),

    #[error("Endpoint inventory delivery failed: {0}")]
    Delivery(String),

    #[error("Endpoint storage error: {0}")]
    Storage(String),
}
