use chrono::{DateTime, Duration, Utc};
use ferrous_rproxy_domain::{DomainError, SigningKey};
use hickory_proto::dnssec::rdata::sig::SigInput;
use hickory_proto::dnssec::tbs::TBS;
use hickory_proto::dnssec::Algorithm;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType, SerialNumber};
use hickory_proto::serialize::binary::{BinDecoder, BinEncodable, BinEncoder, Restrict};
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair};
use std::str::FromStr;
use std::sync::Arc;

/// Signatures are back-dated to absorb clock skew on validators.
pub const INCEPTION_OFFSET_HOURS: i64 = 7;
pub const VALIDITY_DAYS: i64 = 7;

/// Builds a ring key pair from a 48-byte P-384 scalar and the 96-byte
/// public point carried in DNSKEY rdata.
pub fn p384_key_pair(private_key: &[u8], public_key: &[u8]) -> Result<EcdsaKeyPair, String> {
    let mut uncompressed = Vec::with_capacity(1 + public_key.len());
    uncompressed.push(0x04);
    uncompressed.extend_from_slice(public_key);

    EcdsaKeyPair::from_private_key_and_public_key(
        &signature::ECDSA_P384_SHA384_FIXED_SIGNING,
        private_key,
        &uncompressed,
        &SystemRandom::new(),
    )
    .map_err(|e| format!("key pair rejected: {}", e))
}

/// Signs RRsets of one zone with its stored key. Key tag and signer name
/// are taken from the key as loaded.
pub struct RrsetSigner {
    key: Arc<SigningKey>,
    key_pair: EcdsaKeyPair,
    signer_name: Name,
    rng: SystemRandom,
}

impl RrsetSigner {
    pub fn new(key: Arc<SigningKey>) -> Result<Self, DomainError> {
        let key_pair = p384_key_pair(&key.private_key, &key.public_key)
            .map_err(DomainError::SigningFailed)?;
        let signer_name = Name::from_str(&key.zone_name)
            .map_err(|e| DomainError::SigningFailed(format!("signer name: {}", e)))?;

        Ok(Self {
            key,
            key_pair,
            signer_name,
            rng: SystemRandom::new(),
        })
    }

    pub fn key_tag(&self) -> u16 {
        self.key.key_tag
    }

    /// Produces the RRSIG record covering `rrset`, which must share owner
    /// name, class and type.
    pub fn sign(&self, rrset: &[Record], now: DateTime<Utc>) -> Result<Record, DomainError> {
        let first = rrset
            .first()
            .ok_or_else(|| DomainError::SigningFailed("empty RRset".to_string()))?;
        let name = first.name().clone();
        let ttl = first.ttl();

        let input = SigInput {
            type_covered: first.record_type(),
            algorithm: Algorithm::from_u8(self.key.algorithm),
            num_labels: name.num_labels(),
            original_ttl: ttl,
            sig_expiration: serial_time(now + Duration::days(VALIDITY_DAYS)),
            sig_inception: serial_time(now - Duration::hours(INCEPTION_OFFSET_HOURS)),
            key_tag: self.key.key_tag,
            signer_name: self.signer_name.clone(),
        };

        let tbs = TBS::from_input(&name, DNSClass::IN, &input, rrset.iter())
            .map_err(|e| DomainError::SigningFailed(format!("to-be-signed data: {}", e)))?;

        let sig = self
            .key_pair
            .sign(&self.rng, tbs.as_ref())
            .map_err(|_| DomainError::SigningFailed("ECDSA signing failed".to_string()))?;

        let rdata = rrsig_rdata(&input, sig.as_ref())?;
        Ok(Record::from_rdata(name, ttl, rdata))
    }
}

fn serial_time(at: DateTime<Utc>) -> SerialNumber {
    SerialNumber::from(at.timestamp() as u32)
}

/// RRSIG rdata is the signature input in canonical form followed by the
/// signature; decoding it back gives a typed record.
fn rrsig_rdata(input: &SigInput, sig: &[u8]) -> Result<RData, DomainError> {
    let mut bytes = Vec::with_capacity(128 + sig.len());
    {
        let mut encoder = BinEncoder::new(&mut bytes);
        input
            .emit(&mut encoder)
            .map_err(|e| DomainError::SigningFailed(format!("encode RRSIG: {}", e)))?;
    }
    bytes.extend_from_slice(sig);

    let mut decoder = BinDecoder::new(&bytes);
    RData::read(
        &mut decoder,
        RecordType::RRSIG,
        Restrict::new(bytes.len() as u16),
    )
    .map_err(|e| DomainError::SigningFailed(format!("decode RRSIG: {}", e)))
}
