pub mod relay;
pub mod tracker;

pub use relay::TcpTransferRelay;
pub use tracker::{TransferKind, TransferTracker};
