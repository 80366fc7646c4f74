use super::signer::RrsetSigner;
use chrono::Utc;
use compact_str::CompactString;
use ferrous_rproxy_application::ports::AnswerSynthesizer;
use ferrous_rproxy_application::services::KeyStore;
use ferrous_rproxy_domain::config::MailZoneConfig;
use ferrous_rproxy_domain::{normalize_fqdn, DomainError};
use hickory_proto::op::{Edns, Message};
use hickory_proto::rr::rdata::{A, AAAA, MX};
use hickory_proto::rr::{Name, RData, Record};
use rustc_hash::FxHashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

pub const MX_PREFERENCE: u16 = 10;
pub const EDNS_PAYLOAD: u16 = 1232;

struct MailZone {
    zone: Name,
    host: Name,
    ipv4: Option<std::net::Ipv4Addr>,
    ipv6: Option<std::net::Ipv6Addr>,
    ttl: u32,
}

/// Answers `<zone> MX` locally with `MX 10 mail.<zone>`, glue for the mail
/// host and an RRSIG per RRset.
pub struct MxSynthesizer {
    zones: FxHashMap<CompactString, MailZone>,
    keys: Arc<KeyStore>,
}

impl MxSynthesizer {
    pub fn new(zones: &[MailZoneConfig], keys: Arc<KeyStore>) -> Result<Self, DomainError> {
        let mut by_name = FxHashMap::default();
        for config in zones {
            let zone_name = config.zone_name();
            let zone = Name::from_str(&zone_name)
                .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", zone_name, e)))?;
            let host = Name::from_str(&config.mail_host())
                .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", zone_name, e)))?;

            by_name.insert(
                CompactString::from(zone_name),
                MailZone {
                    zone,
                    host,
                    ipv4: config.ipv4,
                    ipv6: config.ipv6,
                    ttl: config.ttl,
                },
            );
        }

        Ok(Self {
            zones: by_name,
            keys,
        })
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

impl AnswerSynthesizer for MxSynthesizer {
    fn synthesize(&self, zone_name: &str, request: &[u8]) -> Result<Vec<u8>, DomainError> {
        let zone_name = normalize_fqdn(zone_name);
        let zone = self
            .zones
            .get(zone_name.as_str())
            .ok_or_else(|| DomainError::SigningUnavailable(zone_name.clone()))?;

        let now = Utc::now();
        let key = self.keys.active_key(&zone_name, now)?;
        let signer = RrsetSigner::new(key)?;

        let request = Message::from_vec(request)
            .map_err(|e| DomainError::MalformedQuery(format!("undecodable message: {}", e)))?;

        let mx = vec![Record::from_rdata(
            zone.zone.clone(),
            zone.ttl,
            RData::MX(MX::new(MX_PREFERENCE, zone.host.clone())),
        )];
        let glue_v4: Vec<Record> = zone
            .ipv4
            .map(|ip| Record::from_rdata(zone.host.clone(), zone.ttl, RData::A(A(ip))))
            .into_iter()
            .collect();
        let glue_v6: Vec<Record> = zone
            .ipv6
            .map(|ip| Record::from_rdata(zone.host.clone(), zone.ttl, RData::AAAA(AAAA(ip))))
            .into_iter()
            .collect();

        let mut response = Message::response(request.id(), request.op_code());
        response.set_authoritative(true);
        response.set_recursion_desired(request.recursion_desired());
        response.add_queries(request.queries().iter().cloned());

        let mx_sig = signer.sign(&mx, now)?;
        response.add_answers(mx);
        response.add_answer(mx_sig);

        for glue in [glue_v4, glue_v6] {
            if glue.is_empty() {
                continue;
            }
            let sig = signer.sign(&glue, now)?;
            response.add_additionals(glue);
            response.add_additional(sig);
        }

        if let Some(edns) = request.edns() {
            let mut echoed = Edns::new();
            echoed.set_max_payload(EDNS_PAYLOAD);
            echoed.set_dnssec_ok(edns.flags().dnssec_ok);
            response.set_edns(echoed);
        }

        debug!(
            zone = %zone_name,
            key_tag = signer.key_tag(),
            answers = response.answers().len(),
            additionals = response.additionals().len(),
            "Synthesized signed MX answer"
        );

        response
            .to_vec()
            .map_err(|e| DomainError::SigningFailed(format!("encode response: {}", e)))
    }
}
