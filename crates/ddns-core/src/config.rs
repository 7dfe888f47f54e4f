//! Provider configuration
//!
//! A [`ProviderConfig`] is built (or deserialized) by the caller, validated
//! once, and never mutated afterwards.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default TTL applied to every record sent in an update
pub const DEFAULT_TTL_SECS: u32 = 300;

/// Default TSIG validity window (fudge)
pub const DEFAULT_FUDGE_SECS: u16 = 300;

/// Google's public DNS server, used for zone reads
pub const DEFAULT_RESOLVER: &str = "8.8.8.8:53";

/// Default bound for a recursive lookup
pub const DEFAULT_RESOLVER_TIMEOUT_SECS: u64 = 10;

/// Default bound for an update exchange
pub const DEFAULT_UPDATE_TIMEOUT_SECS: u64 = 10;

/// RFC 2136 provider configuration
///
/// The secret is the base64 string found in a BIND key file.
///
/// # Security
///
/// The Debug implementation does NOT expose the secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// TSIG key name (e.g. "k1" or "k1.")
    pub key_name: String,

    /// Base64 encoded shared secret
    /// ⚠️ NEVER log this value
    pub secret: String,

    /// TSIG signing algorithm
    #[serde(default)]
    pub algorithm: SigningAlgorithm,

    /// Authoritative server, `host` or `host:port` (port defaults to 53)
    pub server: String,

    /// TTL for inserted records
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// TSIG time window in seconds
    #[serde(default = "default_fudge")]
    pub fudge_secs: u16,

    /// Recursive resolver used by zone reads
    #[serde(default = "default_resolver")]
    pub resolver: String,

    /// Timeout for zone reads, in seconds
    #[serde(default = "default_resolver_timeout")]
    pub resolver_timeout_secs: u64,

    /// Timeout for update exchanges, in seconds
    #[serde(default = "default_update_timeout")]
    pub update_timeout_secs: u64,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("key_name", &self.key_name)
            .field("secret", &"<REDACTED>")
            .field("algorithm", &self.algorithm)
            .field("server", &self.server)
            .field("ttl", &self.ttl)
            .field("fudge_secs", &self.fudge_secs)
            .field("resolver", &self.resolver)
            .field("resolver_timeout_secs", &self.resolver_timeout_secs)
            .field("update_timeout_secs", &self.update_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a configuration with default TTL, fudge, resolver and timeouts
    pub fn new(
        key_name: impl Into<String>,
        secret: impl Into<String>,
        algorithm: SigningAlgorithm,
        server: impl Into<String>,
    ) -> Self {
        Self {
            key_name: key_name.into(),
            secret: secret.into(),
            algorithm,
            server: server.into(),
            ttl: default_ttl(),
            fudge_secs: default_fudge(),
            resolver: default_resolver(),
            resolver_timeout_secs: default_resolver_timeout(),
            update_timeout_secs: default_update_timeout(),
        }
    }

    /// Set the TTL used for inserted records
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the recursive resolver used by zone reads
    pub fn with_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.resolver = resolver.into();
        self
    }

    /// Set both exchange timeouts
    pub fn with_timeouts(mut self, resolver_secs: u64, update_secs: u64) -> Self {
        self.resolver_timeout_secs = resolver_secs;
        self.update_timeout_secs = update_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.key_name.trim_end_matches('.').is_empty() {
            return Err(crate::Error::config("TSIG key name cannot be empty"));
        }
        if self.secret.is_empty() {
            return Err(crate::Error::config("TSIG secret cannot be empty"));
        }
        self.secret_bytes()?;
        if self.server.is_empty() {
            return Err(crate::Error::config("DNS server cannot be empty"));
        }
        if self.resolver.is_empty() {
            return Err(crate::Error::config("Resolver address cannot be empty"));
        }
        if self.resolver_timeout_secs == 0 || self.update_timeout_secs == 0 {
            return Err(crate::Error::config("Timeouts must be > 0"));
        }
        Ok(())
    }

    /// Decode the shared secret
    pub fn secret_bytes(&self) -> Result<Vec<u8>, crate::Error> {
        BASE64
            .decode(self.secret.trim())
            .map_err(|e| crate::Error::config(format!("TSIG secret is not valid base64: {e}")))
    }

    /// Resolver timeout as a Duration
    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_secs(self.resolver_timeout_secs)
    }

    /// Update timeout as a Duration
    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }
}

/// TSIG HMAC algorithm
///
/// Every IANA name parses, but a provider only signs with hmac-sha256,
/// hmac-sha384 and hmac-sha512; the others fail provider construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// hmac-md5.sig-alg.reg.int
    HmacMd5,
    /// hmac-sha1
    HmacSha1,
    /// hmac-sha224
    HmacSha224,
    /// hmac-sha256
    #[default]
    HmacSha256,
    /// hmac-sha384
    HmacSha384,
    /// hmac-sha512
    HmacSha512,
}

impl SigningAlgorithm {
    /// Algorithm name without the trailing dot
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacMd5 => "hmac-md5.sig-alg.reg.int",
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha224 => "hmac-sha224",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha384 => "hmac-sha384",
            Self::HmacSha512 => "hmac-sha512",
        }
    }

    /// Dot-terminated algorithm name, as carried in the TSIG record
    pub fn fqdn(&self) -> String {
        format!("{}.", self.as_str())
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_end_matches('.').to_ascii_lowercase();
        match name.as_str() {
            "" | "hmac-sha256" => Ok(Self::HmacSha256),
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" => Ok(Self::HmacMd5),
            "hmac-sha1" => Ok(Self::HmacSha1),
            "hmac-sha224" => Ok(Self::HmacSha224),
            "hmac-sha384" => Ok(Self::HmacSha384),
            "hmac-sha512" => Ok(Self::HmacSha512),
            _ => Err(crate::Error::config(format!("Unknown TSIG algorithm: {s}"))),
        }
    }
}

impl Serialize for SigningAlgorithm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SigningAlgorithm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL_SECS
}

fn default_fudge() -> u16 {
    DEFAULT_FUDGE_SECS
}

fn default_resolver() -> String {
    DEFAULT_RESOLVER.to_string()
}

fn default_resolver_timeout() -> u64 {
    DEFAULT_RESOLVER_TIMEOUT_SECS
}

fn default_update_timeout() -> u64 {
    DEFAULT_UPDATE_TIMEOUT_SECS
}
