pub mod error;
pub mod jwt;
pub mod models;

pub use error::IdentityError;
pub use models::*;
