use compact_str::CompactString;
use ferrous_rproxy_domain::{normalize_fqdn, DnsQuery, DomainError, QueryCategory, RecordType};
use rustc_hash::FxHashSet;

/// Decides which pipeline a query takes.
///
/// Priority across all questions: any IXFR/AXFR, then any DS, then a single
/// MX question for a configured mail zone. Everything else is proxied as is.
pub struct QueryClassifier {
    mail_zones: FxHashSet<CompactString>,
}

impl QueryClassifier {
    pub fn new<I, S>(mail_zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mail_zones: mail_zones
                .into_iter()
                .map(|zone| CompactString::from(normalize_fqdn(zone.as_ref())))
                .collect(),
        }
    }

    pub fn classify(&self, query: &DnsQuery) -> Result<QueryCategory, DomainError> {
        if query.questions.is_empty() {
            return Err(DomainError::MalformedQuery(
                "query carries no question".to_string(),
            ));
        }

        if query.is_transfer() {
            return Ok(QueryCategory::Transfer);
        }

        if query.has_type(RecordType::DS) {
            return Ok(QueryCategory::DelegationSigner);
        }

        if let [question] = query.questions.as_slice() {
            if question.record_type == RecordType::MX
                && self.mail_zones.contains(&*question.name)
            {
                return Ok(QueryCategory::MailExchange);
            }
        }

        Ok(QueryCategory::Normal)
    }
}
