#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P384_SHA384_FIXED_SIGNING};
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh P-384 material as (48-byte scalar, 96-byte x || y).
pub fn p384_material() -> (Vec<u8>, Vec<u8>) {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P384_SHA384_FIXED_SIGNING, &rng).unwrap();
    let doc = pkcs8.as_ref();
    (doc[35..83].to_vec(), doc[89..185].to_vec())
}

pub struct KeyFiles {
    pub zone: String,
    pub algorithm: u8,
    pub key_tag: u16,
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
    pub activate: String,
}

impl KeyFiles {
    pub fn p384(zone: &str, key_tag: u16) -> Self {
        let (private_key, public_key) = p384_material();
        Self {
            zone: zone.to_string(),
            algorithm: 14,
            key_tag,
            private_key,
            public_key,
            activate: "20240101000000".to_string(),
        }
    }

    pub fn activated(mut self, timestamp: &str) -> Self {
        self.activate = timestamp.to_string();
        self
    }

    pub fn stem(&self) -> String {
        format!("K{}+{:03}+{}", self.zone, self.algorithm, self.key_tag)
    }

    pub fn private_contents(&self) -> String {
        format!(
            "Private-key-format: v1.3\n\
             Algorithm: {} (ECDSAP384SHA384)\n\
             PrivateKey: {}\n\
             Created: 20240101000000\n\
             Publish: 20240101000000\n\
             Activate: {}\n",
            self.algorithm,
            STANDARD.encode(&self.private_key),
            self.activate
        )
    }

    pub fn public_contents(&self) -> String {
        format!(
            "; This is a zone-signing key, keyid {}, for {}\n{} 3600 IN DNSKEY 256 3 {} {}\n",
            self.key_tag,
            self.zone,
            self.zone,
            self.algorithm,
            STANDARD.encode(&self.public_key)
        )
    }

    /// Writes both files; returns the `.private` path.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let private_path = dir.join(format!("{}.private", self.stem()));
        fs::write(&private_path, self.private_contents()).unwrap();
        fs::write(
            dir.join(format!("{}.key", self.stem())),
            self.public_contents(),
        )
        .unwrap();
        private_path
    }
}
