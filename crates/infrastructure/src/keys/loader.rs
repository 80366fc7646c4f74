use super::bind_format::{DnskeyFile, KeyFileName, PrivateKeyFile};
use crate::dns::synthesis::signer::p384_key_pair;
use ferrous_rproxy_application::services::KeyStore;
use ferrous_rproxy_domain::signing_key::{
    ECDSA_P384_SHA384, P384_PRIVATE_KEY_LEN, P384_PUBLIC_KEY_LEN,
};
use ferrous_rproxy_domain::{DomainError, SigningKey};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PRIVATE_EXTENSION: &str = "private";

/// Reads every `K<zone>+<alg>+<tag>.private` file of a directory once at
/// startup. Any malformed usable key aborts the load.
pub struct BindKeyLoader;

impl BindKeyLoader {
    pub fn load(directory: &Path) -> Result<KeyStore, DomainError> {
        let entries = fs::read_dir(directory).map_err(|e| key_error(directory, e.to_string()))?;

        let paths = private_key_paths(directory, entries.map(|entry| entry.map(|e| e.path())))?;

        let mut keys = Vec::with_capacity(paths.len());
        for path in &paths {
            if let Some(key) = Self::load_key(path)? {
                info!(
                    zone = %key.zone_name,
                    key_tag = key.key_tag,
                    algorithm = key.algorithm_name(),
                    activation = %key.activation_time,
                    "Signing key loaded"
                );
                keys.push(key);
            }
        }

        let store = KeyStore::from_keys(keys);
        info!(
            directory = %directory.display(),
            files = paths.len(),
            zones = store.len(),
            "Key directory loaded"
        );
        Ok(store)
    }

    /// `Ok(None)` for keys of an algorithm that cannot be used for signing.
    fn load_key(path: &Path) -> Result<Option<SigningKey>, DomainError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| key_error(path, "file name is not valid UTF-8".to_string()))?;
        let name = KeyFileName::parse(stem).map_err(|reason| key_error(path, reason))?;

        if name.algorithm != ECDSA_P384_SHA384 {
            warn!(
                path = %path.display(),
                algorithm = name.algorithm,
                "Skipping key: only ECDSAP384SHA384 (14) can sign"
            );
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|e| key_error(path, e.to_string()))?;
        let private = PrivateKeyFile::parse(&contents).map_err(|reason| key_error(path, reason))?;

        if private.algorithm != name.algorithm {
            return Err(key_error(
                path,
                format!(
                    "file name says algorithm {} but the file says {}",
                    name.algorithm, private.algorithm
                ),
            ));
        }
        if private.private_key.len() != P384_PRIVATE_KEY_LEN {
            return Err(key_error(
                path,
                format!(
                    "private key is {} bytes, expected {}",
                    private.private_key.len(),
                    P384_PRIVATE_KEY_LEN
                ),
            ));
        }

        let public_path = path.with_extension("key");
        let public_contents =
            fs::read_to_string(&public_path).map_err(|e| key_error(&public_path, e.to_string()))?;
        let dnskey =
            DnskeyFile::parse(&public_contents).map_err(|reason| key_error(&public_path, reason))?;

        if dnskey.algorithm != name.algorithm {
            return Err(key_error(
                &public_path,
                format!(
                    "DNSKEY algorithm {} does not match {}",
                    dnskey.algorithm, name.algorithm
                ),
            ));
        }
        if dnskey.public_key.len() != P384_PUBLIC_KEY_LEN {
            return Err(key_error(
                &public_path,
                format!(
                    "public key is {} bytes, expected {}",
                    dnskey.public_key.len(),
                    P384_PUBLIC_KEY_LEN
                ),
            ));
        }

        p384_key_pair(&private.private_key, &dnskey.public_key)
            .map_err(|reason| key_error(path, reason))?;

        Ok(Some(SigningKey {
            zone_name: name.zone.into(),
            key_tag: name.key_tag,
            algorithm: name.algorithm,
            private_key: private.private_key,
            public_key: dnskey.public_key,
            created: private.created,
            publish: private.publish,
            activation_time: private.activate,
        }))
    }
}

/// Sorted `.private` paths of a directory listing. An unreadable entry fails
/// the whole listing rather than hiding a key.
fn private_key_paths(
    directory: &Path,
    entries: impl Iterator<Item = io::Result<PathBuf>>,
) -> Result<Vec<PathBuf>, DomainError> {
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| key_error(directory, e.to_string()))?;
        if path.extension().and_then(|ext| ext.to_str()) == Some(PRIVATE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn key_error(path: &Path, reason: String) -> DomainError {
    DomainError::KeyLoad {
        path: path.display().to_string(),
        reason,
    }
}
