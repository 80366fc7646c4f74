mod answer_synthesizer;
mod transfer_relay;
mod upstream_exchange;

pub use answer_synthesizer::AnswerSynthesizer;
pub use transfer_relay::{TransferRelay, TransferSink};
pub use upstream_exchange::UpstreamExchange;
