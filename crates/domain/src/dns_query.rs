use super::RecordType;
use std::sync::Arc;

/// One entry of a query's question section. `name` is kept lower-cased and
/// fully qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub name: Arc<str>,
    pub record_type: RecordType,
}

impl DnsQuestion {
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: normalize_fqdn(name).into(),
            record_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub id: u16,
    pub questions: Vec<DnsQuestion>,
}

impl DnsQuery {
    pub fn new(id: u16, questions: Vec<DnsQuestion>) -> Self {
        Self { id, questions }
    }

    pub fn first(&self) -> Option<&DnsQuestion> {
        self.questions.first()
    }

    pub fn has_type(&self, record_type: RecordType) -> bool {
        self.questions.iter().any(|q| q.record_type == record_type)
    }

    pub fn is_transfer(&self) -> bool {
        self.questions.iter().any(|q| q.record_type.is_transfer())
    }
}

/// Lower-cases `name`, drops a leading dot and guarantees a trailing one.
/// The root zone normalizes to `"."`.
pub fn normalize_fqdn(name: &str) -> String {
    let trimmed = name.trim().trim_start_matches('.');
    let mut out = trimmed.to_ascii_lowercase();
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

/// Checks label and total lengths of a normalized name.
pub fn is_valid_domain_name(name: &str) -> bool {
    if name == "." {
        return true;
    }
    let body = match name.strip_suffix('.') {
        Some(body) => body,
        None => name,
    };
    if body.is_empty() || body.len() > 253 {
        return false;
    }
    body.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'*')
    })
}
