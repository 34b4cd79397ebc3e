//! Tournament discovery: venue coordinate resolution and the discovery
//! coordinator with its request-supersession contract.

mod coordinator;
mod resolver;

pub use coordinator::{DiscoveryCoordinator, DiscoveryError, DiscoveryOutcome};
pub use resolver::resolve_venue;
