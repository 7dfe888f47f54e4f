// # RFC 2136 DNS Provider
//
// Applies and removes TXT and address records on an authoritative server
// with TSIG-signed dynamic updates, and reads a zone's current records back
// through a recursive resolver.
//
// ## Behavior
//
// - One signed UPDATE message per record, one exchange, no retries
// - Add and set are the same operation: the server decides insert vs. upsert
// - Records in a batch are applied in order; the first failure aborts the
//   batch and earlier records stay applied (no rollback)
// - Unsupported record types are rejected before anything is sent
// - One exchange in flight per provider instance, reads included
//
// ## Security
//
// - The TSIG secret NEVER appears in logs or Debug output
//
// ## Protocol Reference
//
// - RFC 2136: Dynamic Updates in the Domain Name System
// - RFC 8945: Secret Key Transaction Authentication for DNS (TSIG)

pub mod lookup;
pub mod transport;
pub mod tsig;
pub mod update;

use async_trait::async_trait;
use ddns_core::traits::{RecordAppender, RecordDeleter, RecordGetter, RecordSetter, RecordStore};
use ddns_core::{ProviderConfig, Record, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;

pub use transport::{DnsTransport, UdpTransport};

/// Which batch operation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    /// Add records
    Append,
    /// Create or update records
    Set,
    /// Remove records
    Delete,
}

impl BatchOp {
    /// Only deletes remove records; append and set both insert
    pub fn is_delete(self) -> bool {
        matches!(self, Self::Delete)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Set => "set",
            Self::Delete => "delete",
        }
    }
}

/// RFC 2136 provider
///
/// Cheap to share behind an `Arc`; all calls on one instance are serialized.
///
/// # Security
///
/// The Debug implementation does NOT expose the TSIG secret.
pub struct Rfc2136Provider {
    /// Validated, immutable configuration
    config: ProviderConfig,

    /// Held for the duration of every exchange
    lock: Mutex<()>,

    /// Injected transport; when absent a fresh UDP transport is built per call
    transport: Option<Arc<dyn DnsTransport>>,
}

impl std::fmt::Debug for Rfc2136Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rfc2136Provider")
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl Rfc2136Provider {
    /// Create a provider that talks UDP/TCP to the configured servers
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate or names
    /// a TSIG algorithm the signer cannot use.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        tsig::create_tsig_signer(&config)?;
        Ok(Self {
            config,
            lock: Mutex::new(()),
            transport: None,
        })
    }

    /// Create a provider that sends every message through `transport`
    pub fn with_transport(config: ProviderConfig, transport: Arc<dyn DnsTransport>) -> Result<Self> {
        let mut provider = Self::new(config)?;
        provider.transport = Some(transport);
        Ok(provider)
    }

    /// The provider's configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn transport(&self, timeout: std::time::Duration) -> Arc<dyn DnsTransport> {
        match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(UdpTransport::new(timeout)),
        }
    }

    /// Parse, validate and apply one record under the provider lock
    ///
    /// This is the single-record entry point the batch operations loop over.
    pub async fn update_record(&self, zone: &str, record: &Record, is_delete: bool) -> Result<()> {
        // Reject before taking the lock or touching the network
        let parsed = record.parsed()?;
        update::payload(&parsed)?;

        let _guard = self.lock.lock().await;
        let transport = self.transport(self.config.update_timeout());
        timeout(
            self.config.update_timeout(),
            update::apply(&self.config, transport.as_ref(), zone, &parsed, is_delete),
        )
        .await
        .map_err(|e| ddns_core::Error::transport(format!("update of {} in {}", parsed, zone), e))?
    }

    async fn process(&self, op: BatchOp, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        tracing::debug!("Starting {} of {} records in {}", op.as_str(), records.len(), zone);

        let mut processed = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if let Err(e) = self.update_record(zone, record, op.is_delete()).await {
                if index > 0 {
                    tracing::warn!(
                        "{} in {} failed at record {} of {}; {} earlier records remain applied",
                        op.as_str(),
                        zone,
                        index + 1,
                        records.len(),
                        index
                    );
                }
                return Err(e);
            }
            processed.push(record.clone());
        }
        Ok(processed)
    }
}

#[async_trait]
impl RecordGetter for Rfc2136Provider {
    async fn get_records(&self, zone: &str) -> Result<Vec<Record>> {
        let _guard = self.lock.lock().await;
        let transport = self.transport(self.config.resolver_timeout());
        lookup::resolve(&self.config, transport.as_ref(), zone).await
    }
}

#[async_trait]
impl RecordAppender for Rfc2136Provider {
    async fn append_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        self.process(BatchOp::Append, zone, records).await
    }
}

#[async_trait]
impl RecordSetter for Rfc2136Provider {
    async fn set_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        self.process(BatchOp::Set, zone, records).await
    }
}

#[async_trait]
impl RecordDeleter for Rfc2136Provider {
    async fn delete_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>> {
        self.process(BatchOp::Delete, zone, records).await
    }
}

impl RecordStore for Rfc2136Provider {
    fn provider_name(&self) -> &'static str {
        "rfc2136"
    }
}
