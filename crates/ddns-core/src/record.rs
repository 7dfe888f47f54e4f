// # Record Model
//
// Generic records as handed over by a record-store client, and the closed
// set of typed variants they parse into.
//
// `RR` is the loosely typed wire-ish form (name, ttl, type tag, data string).
// `Record` is what the provider matches on. Adding a variant here is a
// compile error in every exhaustive match until it is handled.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Generic, unparsed resource record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RR {
    /// Record name, relative to the zone (`@` for the apex)
    pub name: String,
    /// Time-to-live in seconds (0 means unspecified)
    #[serde(default)]
    pub ttl: u32,
    /// Record type tag (e.g. "TXT", "A")
    #[serde(rename = "type")]
    pub rtype: String,
    /// Type-specific data in presentation format
    pub data: String,
}

impl RR {
    /// Create a generic record
    pub fn new(
        name: impl Into<String>,
        rtype: impl Into<String>,
        data: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            ttl,
            rtype: rtype.into(),
            data: data.into(),
        }
    }

    /// Parse into a typed record
    ///
    /// Unknown types are returned as [`Record::Rr`]; malformed data for a
    /// known type is a parse error.
    pub fn parse(&self) -> Result<Record> {
        let rtype = self.rtype.trim().to_ascii_uppercase();
        let name = self.name.clone();
        let ttl = self.ttl;

        match rtype.as_str() {
            "A" | "AAAA" => {
                let ip: IpAddr = self.data.trim().parse().map_err(|e| {
                    Error::parse(format!("invalid {} data {:?}: {}", rtype, self.data, e))
                })?;
                if (rtype == "A") != ip.is_ipv4() {
                    return Err(Error::parse(format!(
                        "address {} does not match record type {}",
                        ip, rtype
                    )));
                }
                Ok(Record::Address { name, ip, ttl })
            }
            "TXT" => Ok(Record::Txt {
                name,
                text: self.data.clone(),
                ttl,
            }),
            "CNAME" => {
                let target = self.data.trim();
                if target.is_empty() {
                    return Err(Error::parse("CNAME target cannot be empty"));
                }
                Ok(Record::Cname {
                    name,
                    target: target.to_string(),
                    ttl,
                })
            }
            "MX" => {
                let mut fields = self.data.split_whitespace();
                let (Some(pref), Some(target), None) = (fields.next(), fields.next(), fields.next())
                else {
                    return Err(Error::parse(format!(
                        "MX data must be \"<preference> <target>\", got {:?}",
                        self.data
                    )));
                };
                let preference = pref
                    .parse::<u16>()
                    .map_err(|e| Error::parse(format!("invalid MX preference {pref:?}: {e}")))?;
                Ok(Record::Mx {
                    name,
                    preference,
                    target: target.to_string(),
                    ttl,
                })
            }
            "" => Err(Error::parse("record type cannot be empty")),
            _ => Ok(Record::Rr(self.clone())),
        }
    }
}

/// Typed resource record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A or AAAA record, by address family
    Address {
        /// Record name
        name: String,
        /// Address payload
        ip: IpAddr,
        /// Time-to-live in seconds
        #[serde(default)]
        ttl: u32,
    },
    /// TXT record
    Txt {
        /// Record name
        name: String,
        /// Text payload
        text: String,
        /// Time-to-live in seconds
        #[serde(default)]
        ttl: u32,
    },
    /// CNAME record
    Cname {
        /// Record name
        name: String,
        /// Canonical target
        target: String,
        /// Time-to-live in seconds
        #[serde(default)]
        ttl: u32,
    },
    /// MX record
    Mx {
        /// Record name
        name: String,
        /// Preference
        preference: u16,
        /// Mail exchanger
        target: String,
        /// Time-to-live in seconds
        #[serde(default)]
        ttl: u32,
    },
    /// Record of a type without a typed variant
    Rr(RR),
}

impl Record {
    /// TXT record helper
    pub fn txt(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Txt {
            name: name.into(),
            text: text.into(),
            ttl: 0,
        }
    }

    /// Address record helper
    pub fn address(name: impl Into<String>, ip: IpAddr) -> Self {
        Self::Address {
            name: name.into(),
            ip,
            ttl: 0,
        }
    }

    /// Record name
    pub fn name(&self) -> &str {
        match self {
            Self::Address { name, .. }
            | Self::Txt { name, .. }
            | Self::Cname { name, .. }
            | Self::Mx { name, .. } => name,
            Self::Rr(rr) => &rr.name,
        }
    }

    /// Type tag as it appears on the wire
    pub fn type_name(&self) -> &str {
        match self {
            Self::Address { ip: IpAddr::V4(_), .. } => "A",
            Self::Address { ip: IpAddr::V6(_), .. } => "AAAA",
            Self::Txt { .. } => "TXT",
            Self::Cname { .. } => "CNAME",
            Self::Mx { .. } => "MX",
            Self::Rr(rr) => &rr.rtype,
        }
    }

    /// Convert back to the generic form
    pub fn rr(&self) -> RR {
        match self {
            Self::Address { name, ip, ttl } => RR::new(name, self.type_name(), ip.to_string(), *ttl),
            Self::Txt { name, text, ttl } => RR::new(name, "TXT", text, *ttl),
            Self::Cname { name, target, ttl } => RR::new(name, "CNAME", target, *ttl),
            Self::Mx {
                name,
                preference,
                target,
                ttl,
            } => RR::new(name, "MX", format!("{preference} {target}"), *ttl),
            Self::Rr(rr) => rr.clone(),
        }
    }

    /// Resolve a generic record into its typed variant
    ///
    /// Typed records are returned unchanged.
    pub fn parsed(&self) -> Result<Record> {
        match self {
            Self::Rr(rr) => rr.parse(),
            typed => Ok(typed.clone()),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rr = self.rr();
        write!(f, "{} {} {:?}", rr.name, rr.rtype, rr.data)
    }
}

impl From<RR> for Record {
    fn from(rr: RR) -> Self {
        Self::Rr(rr)
    }
}
