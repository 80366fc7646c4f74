pub mod mx;
pub mod signer;

pub use mx::MxSynthesizer;
pub use signer::RrsetSigner;
