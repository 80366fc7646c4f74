use std::fmt;

/// Outcome of classifying a query, in decreasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryCategory {
    /// Any AXFR or IXFR question.
    Transfer,
    /// Any DS question.
    DelegationSigner,
    /// Single MX question for a zone configured for answer synthesis.
    MailExchange,
    Normal,
}

impl QueryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::Transfer => "transfer",
            QueryCategory::DelegationSigner => "delegation_signer",
            QueryCategory::MailExchange => "mail_exchange",
            QueryCategory::Normal => "normal",
        }
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
