pub mod reconcile;
pub mod session;
pub mod snapshot;
