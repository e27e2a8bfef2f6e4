pub mod metrics;
pub mod model;
pub mod pgstore;
pub mod store;
