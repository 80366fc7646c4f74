pub mod forwarding;
pub mod server;
pub mod synthesis;
pub mod transfer;
pub mod transport;
pub mod wire;

pub use forwarding::BackendExchanger;
pub use server::DnsServerHandler;
pub use synthesis::MxSynthesizer;
pub use transfer::TcpTransferRelay;
