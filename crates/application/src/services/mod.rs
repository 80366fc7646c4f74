pub mod key_store;
pub mod query_classifier;
pub mod route_table;

pub use key_store::KeyStore;
pub use query_classifier::QueryClassifier;
pub use route_table::{pick_backend, RouteTable};
