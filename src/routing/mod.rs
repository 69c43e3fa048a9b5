//! Pollution-aware routing: scoring routes and choosing the cleanest one

pub mod enrichment;
pub mod planner;

pub use enrichment::RouteEnricher;
pub use planner::{RoutePlanner, RouteRequest};
