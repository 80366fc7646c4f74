use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// DNSSEC algorithm number for ECDSA P-384 with SHA-384.
pub const ECDSA_P384_SHA384: u8 = 14;

/// Length of a P-384 private scalar.
pub const P384_PRIVATE_KEY_LEN: usize = 48;

/// Length of a P-384 public key as carried in DNSKEY rdata (x || y).
pub const P384_PUBLIC_KEY_LEN: usize = 96;

/// A zone signing key loaded at startup. Immutable after load.
#[derive(Clone)]
pub struct SigningKey {
    pub zone_name: Arc<str>,
    pub key_tag: u16,
    pub algorithm: u8,
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
    pub created: DateTime<Utc>,
    pub publish: DateTime<Utc>,
    pub activation_time: DateTime<Utc>,
}

impl SigningKey {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.activation_time <= now
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self.algorithm {
            8 => "RSASHA256",
            13 => "ECDSAP256SHA256",
            ECDSA_P384_SHA384 => "ECDSAP384SHA384",
            15 => "ED25519",
            16 => "ED448",
            _ => "UNKNOWN",
        }
    }
}

// Private material never ends up in logs.
impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("zone_name", &self.zone_name)
            .field("key_tag", &self.key_tag)
            .field("algorithm", &self.algorithm)
            .field("activation_time", &self.activation_time)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tag={} alg={} ({})",
            self.zone_name,
            self.key_tag,
            self.algorithm,
            self.algorithm_name()
        )
    }
}
