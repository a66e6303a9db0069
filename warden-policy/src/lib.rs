pub mod error;
pub mod gate;
pub mod models;
pub mod store;

pub use error::PolicyError;
pub use gate::PolicyGate;
pub use models::*;
pub use store::{MemoryPolicyStore, PolicyAdmin, PolicyStore};
