pub mod collector;
pub mod error;
pub mod identity;
pub mod introspect;
pub mod models;
pub mod path;
pub mod publisher;

pub use collector::EndpointCollector;
pub use error::EndpointError;
pub use identity::compute_id;
pub use introspect::{HandlerSource, RouteIntrospector, RouteRegistry};
pub use models::*;
pub use publisher::{EndpointPublisher, EndpointSubscriber, PublishReport, PublisherPhase};
