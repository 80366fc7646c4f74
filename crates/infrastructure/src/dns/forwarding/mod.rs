pub mod exchanger;
pub mod record_type_map;

pub use exchanger::BackendExchanger;
pub use record_type_map::RecordTypeMapper;
