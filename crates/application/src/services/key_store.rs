use chrono::{DateTime, Utc};
use compact_str::CompactString;
use ferrous_rproxy_domain::{normalize_fqdn, DomainError, SigningKey};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Per-zone signing keys, read-only after startup.
#[derive(Default)]
pub struct KeyStore {
    /// Keys of each zone, ordered by activation time.
    keys: FxHashMap<CompactString, Vec<Arc<SigningKey>>>,
}

impl KeyStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Indexes keys by zone. Every key is kept so a pre-published successor
    /// does not retire the key that is active today.
    pub fn from_keys(keys: impl IntoIterator<Item = SigningKey>) -> Self {
        let mut store = Self::default();
        for key in keys {
            let zone = CompactString::from(normalize_fqdn(&key.zone_name));
            store.keys.entry(zone).or_default().push(Arc::new(key));
        }
        for (zone, keys) in store.keys.iter_mut() {
            keys.sort_by_key(|key| (key.activation_time, key.key_tag));
            if keys.len() > 1 {
                debug!(zone = %zone, keys = keys.len(), "Several signing keys for zone");
            }
        }
        store
    }

    pub fn contains_zone(&self, zone: &str) -> bool {
        self.keys.contains_key(normalize_fqdn(zone).as_str())
    }

    /// Key usable for signing at `now`: the one activated most recently.
    pub fn active_key(
        &self,
        zone: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<SigningKey>, DomainError> {
        let keys = self
            .keys
            .get(normalize_fqdn(zone).as_str())
            .ok_or_else(|| DomainError::SigningUnavailable(zone.to_string()))?;

        if let Some(key) = keys.iter().rev().find(|key| key.is_active(now)) {
            return Ok(Arc::clone(key));
        }

        let next = keys.first().map(|key| (key.key_tag, key.activation_time));
        Err(DomainError::SigningUnavailable(match next {
            Some((tag, at)) => format!("{} (key {} activates at {})", zone, tag, at),
            None => zone.to_string(),
        }))
    }

    /// Number of zones with at least one key.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(zone: &str, tag: u16, activation_time: DateTime<Utc>) -> SigningKey {
        SigningKey {
            zone_name: zone.into(),
            key_tag: tag,
            algorithm: 14,
            private_key: vec![1; 48],
            public_key: vec![2; 96],
            created: activation_time,
            publish: activation_time,
            activation_time,
        }
    }

    #[test]
    fn test_latest_active_key_wins() {
        let now = Utc::now();
        let store = KeyStore::from_keys(vec![
            key("example.re.", 1, now - Duration::days(30)),
            key("Example.RE.", 2, now - Duration::days(1)),
            key("example.re.", 3, now - Duration::days(10)),
        ]);

        assert_eq!(store.len(), 1);
        assert!(store.contains_zone("EXAMPLE.re"));
        assert_eq!(store.active_key("EXAMPLE.re", now).unwrap().key_tag, 2);
    }

    #[test]
    fn test_prepublished_successor_keeps_current_key() {
        let now = Utc::now();
        let store = KeyStore::from_keys(vec![
            key("example.re.", 1111, now - Duration::days(30)),
            key("example.re.", 2222, now + Duration::days(1)),
        ]);

        assert_eq!(store.active_key("example.re.", now).unwrap().key_tag, 1111);
        assert_eq!(
            store
                .active_key("example.re.", now + Duration::days(2))
                .unwrap()
                .key_tag,
            2222
        );
    }

    #[test]
    fn test_active_key_checks_activation() {
        let now = Utc::now();
        let store = KeyStore::from_keys(vec![
            key("active.test.", 10, now - Duration::hours(1)),
            key("future.test.", 11, now + Duration::hours(1)),
        ]);

        assert_eq!(store.active_key("active.test.", now).unwrap().key_tag, 10);
        assert!(matches!(
            store.active_key("future.test.", now),
            Err(DomainError::SigningUnavailable(_))
        ));
        assert!(matches!(
            store.active_key("missing.test.", now),
            Err(DomainError::SigningUnavailable(_))
        ));
    }

    #[test]
    fn test_empty_store() {
        let store = KeyStore::empty();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }
}
