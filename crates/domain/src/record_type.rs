use std::fmt;
use std::str::FromStr;

/// Question types the proxy makes decisions on. Everything else is carried
/// through as `Other` and forwarded untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    DS,
    RRSIG,
    DNSKEY,
    IXFR,
    AXFR,
    ANY,
    Other(u16),
}

impl RecordType {
    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::DS => 43,
            RecordType::RRSIG => 46,
            RecordType::DNSKEY => 48,
            RecordType::IXFR => 251,
            RecordType::AXFR => 252,
            RecordType::ANY => 255,
            RecordType::Other(code) => *code,
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            43 => RecordType::DS,
            46 => RecordType::RRSIG,
            48 => RecordType::DNSKEY,
            251 => RecordType::IXFR,
            252 => RecordType::AXFR,
            255 => RecordType::ANY,
            other => RecordType::Other(other),
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, RecordType::AXFR | RecordType::IXFR)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::NS => f.write_str("NS"),
            RecordType::CNAME => f.write_str("CNAME"),
            RecordType::SOA => f.write_str("SOA"),
            RecordType::PTR => f.write_str("PTR"),
            RecordType::MX => f.write_str("MX"),
            RecordType::TXT => f.write_str("TXT"),
            RecordType::AAAA => f.write_str("AAAA"),
            RecordType::SRV => f.write_str("SRV"),
            RecordType::DS => f.write_str("DS"),
            RecordType::RRSIG => f.write_str("RRSIG"),
            RecordType::DNSKEY => f.write_str("DNSKEY"),
            RecordType::IXFR => f.write_str("IXFR"),
            RecordType::AXFR => f.write_str("AXFR"),
            RecordType::ANY => f.write_str("ANY"),
            RecordType::Other(code) => write!(f, "TYPE{}", code),
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let parsed = match upper.as_str() {
            "A" => RecordType::A,
            "NS" => RecordType::NS,
            "CNAME" => RecordType::CNAME,
            "SOA" => RecordType::SOA,
            "PTR" => RecordType::PTR,
            "MX" => RecordType::MX,
            "TXT" => RecordType::TXT,
            "AAAA" => RecordType::AAAA,
            "SRV" => RecordType::SRV,
            "DS" => RecordType::DS,
            "RRSIG" => RecordType::RRSIG,
            "DNSKEY" => RecordType::DNSKEY,
            "IXFR" => RecordType::IXFR,
            "AXFR" => RecordType::AXFR,
            "ANY" => RecordType::ANY,
            other => match other.strip_prefix("TYPE").map(str::parse::<u16>) {
                Some(Ok(code)) => RecordType::from_u16(code),
                _ => return Err(format!("Unknown record type: {}", s)),
            },
        };
        Ok(parsed)
    }
}
