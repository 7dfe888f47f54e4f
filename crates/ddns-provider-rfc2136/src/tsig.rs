//! TSIG signer construction

use ddns_core::name::fqdn;
use ddns_core::{Error, ProviderConfig, Result, SigningAlgorithm};
use hickory_proto::rr::Name;
use hickory_proto::rr::dnssec::rdata::tsig::TsigAlgorithm;
use hickory_proto::rr::dnssec::tsig::TSigner;
use std::str::FromStr;

/// Map the configured algorithm onto hickory's
pub fn tsig_algorithm(algorithm: SigningAlgorithm) -> TsigAlgorithm {
    match algorithm {
        SigningAlgorithm::HmacMd5 => TsigAlgorithm::HmacMd5,
        SigningAlgorithm::HmacSha1 => TsigAlgorithm::HmacSha1,
        SigningAlgorithm::HmacSha224 => TsigAlgorithm::HmacSha224,
        SigningAlgorithm::HmacSha256 => TsigAlgorithm::HmacSha256,
        SigningAlgorithm::HmacSha384 => TsigAlgorithm::HmacSha384,
        SigningAlgorithm::HmacSha512 => TsigAlgorithm::HmacSha512,
    }
}

/// Build a signer from the provider configuration
///
/// The key name is made dot-terminated. Algorithms the crypto backend does
/// not implement are reported as configuration errors.
pub fn create_tsig_signer(config: &ProviderConfig) -> Result<TSigner> {
    let key = config.secret_bytes()?;
    let key_name = Name::from_str(&fqdn(config.key_name.trim()))
        .map_err(|e| Error::config(format!("Invalid TSIG key name {:?}: {e}", config.key_name)))?;

    TSigner::new(
        key,
        tsig_algorithm(config.algorithm),
        key_name,
        config.fudge_secs,
    )
    .map_err(|e| {
        Error::config(format!(
            "Cannot create TSIG signer for {}: {e}",
            config.algorithm
        ))
    })
}
