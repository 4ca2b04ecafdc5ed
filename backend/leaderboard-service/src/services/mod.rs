mod coordinator;
mod query;

pub use coordinator::ConsistencyCoordinator;
pub use query::QueryEngine;
