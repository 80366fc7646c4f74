//! BIND key file formats: `K<zone>+<alg>+<tag>.private` (v1.2+) and the
//! companion `.key` DNSKEY record.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parts of a `K<zone>+<alg>+<tag>` file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFileName {
    pub zone: String,
    pub algorithm: u8,
    pub key_tag: u16,
}

impl KeyFileName {
    pub fn parse(stem: &str) -> Result<Self, String> {
        let body = stem
            .strip_prefix('K')
            .ok_or_else(|| format!("'{}' does not start with 'K'", stem))?;

        let mut parts = body.rsplitn(3, '+');
        let (Some(tag), Some(alg), Some(zone)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("'{}' is not K<zone>+<alg>+<tag>", stem));
        };

        if zone.is_empty() || !zone.ends_with('.') {
            return Err(format!("zone '{}' in '{}' is not fully qualified", zone, stem));
        }

        let algorithm = alg
            .parse::<u8>()
            .map_err(|_| format!("algorithm '{}' in '{}' is not a number", alg, stem))?;
        let key_tag = tag
            .parse::<u16>()
            .map_err(|_| format!("key tag '{}' in '{}' is not a number", tag, stem))?;

        Ok(Self {
            zone: zone.to_ascii_lowercase(),
            algorithm,
            key_tag,
        })
    }
}

#[derive(Debug)]
pub struct PrivateKeyFile {
    pub algorithm: u8,
    pub private_key: Vec<u8>,
    pub created: DateTime<Utc>,
    pub publish: DateTime<Utc>,
    pub activate: DateTime<Utc>,
}

impl PrivateKeyFile {
    pub fn parse(mut data: &str) -> Result<Self, String> {
        // The first line specifies the format.
        let (_, _, rest) = parse_bind_entry(data)?
            .filter(|&(k, v, _)| {
                k == "Private-key-format"
                    && v.strip_prefix("v1.")
                        .and_then(|minor| minor.parse::<u8>().ok())
                        .is_some_and(|minor| minor >= 2)
            })
            .ok_or("unsupported or missing Private-key-format (need v1.2 or later)")?;
        data = rest;

        let mut algorithm = None;
        let mut private_key = None;
        let mut created = None;
        let mut publish = None;
        let mut activate = None;

        while let Some((key, val, rest)) = parse_bind_entry(data)? {
            data = rest;
            match key {
                "Algorithm" => {
                    let code = val
                        .split_whitespace()
                        .next()
                        .and_then(|code| code.parse::<u8>().ok())
                        .ok_or_else(|| format!("bad Algorithm value '{}'", val))?;
                    algorithm = Some(code);
                }
                "PrivateKey" => {
                    let decoded = STANDARD
                        .decode(val)
                        .map_err(|e| format!("PrivateKey is not valid base64: {}", e))?;
                    private_key = Some(decoded);
                }
                "Created" => created = Some(parse_timestamp(val)?),
                "Publish" => publish = Some(parse_timestamp(val)?),
                "Activate" => activate = Some(parse_timestamp(val)?),
                _ => {}
            }
        }

        Ok(Self {
            algorithm: algorithm.ok_or("missing Algorithm")?,
            private_key: private_key.ok_or("missing PrivateKey")?,
            created: created.ok_or("missing Created")?,
            publish: publish.ok_or("missing Publish")?,
            activate: activate.ok_or("missing Activate")?,
        })
    }
}

/// The DNSKEY record of a `.key` file.
#[derive(Debug)]
pub struct DnskeyFile {
    pub flags: u16,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl DnskeyFile {
    /// Expects `<owner> [ttl] [class] DNSKEY <flags> <protocol> <alg> <base64...>`
    /// on one line; `;` comments are skipped.
    pub fn parse(data: &str) -> Result<Self, String> {
        let line = data
            .lines()
            .map(|line| line.split(';').next().unwrap_or("").trim())
            .find(|line| line.split_whitespace().any(|w| w.eq_ignore_ascii_case("DNSKEY")))
            .ok_or("no DNSKEY record")?;

        let mut words = line
            .split_whitespace()
            .skip_while(|w| !w.eq_ignore_ascii_case("DNSKEY"))
            .skip(1);

        let flags = words
            .next()
            .and_then(|w| w.parse::<u16>().ok())
            .ok_or("bad DNSKEY flags")?;
        let _protocol = words
            .next()
            .and_then(|w| w.parse::<u8>().ok())
            .ok_or("bad DNSKEY protocol")?;
        let algorithm = words
            .next()
            .and_then(|w| w.parse::<u8>().ok())
            .ok_or("bad DNSKEY algorithm")?;

        let encoded: String = words.collect();
        if encoded.is_empty() {
            return Err("DNSKEY has no public key".to_string());
        }
        let public_key = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| format!("DNSKEY public key is not valid base64: {}", e))?;

        Ok(Self {
            flags,
            algorithm,
            public_key,
        })
    }
}

/// `YYYYMMDDHHMMSS` in UTC, or integer seconds since the epoch.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if value.len() == 14 && value.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("bad timestamp '{}': {}", value, e));
    }

    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| format!("bad timestamp '{}'", value))
}

fn parse_bind_entry(data: &str) -> Result<Option<(&str, &str, &str)>, String> {
    let data = data.trim_start();
    if data.is_empty() {
        return Ok(None);
    }

    let (line, rest) = data.split_once('\n').unwrap_or((data, ""));
    let (key, val) = line
        .split_once(':')
        .ok_or_else(|| format!("line '{}' is not 'Key: value'", line.trim()))?;

    Ok(Some((key.trim(), val.trim(), rest)))
}
