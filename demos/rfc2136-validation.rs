// # RFC 2136 Provider Real Environment Validation Tool
//
// Appends a TXT record to a zone, reads the zone back, then deletes the
// record again, against a real authoritative server.
//
// ## Usage
//
// ```bash
// DDNS_TSIG_KEY_NAME=k1 \
// DDNS_TSIG_SECRET=czNjcjN0 \
// DDNS_DNS_SERVER=ns1.example.com:53 \
// DDNS_ZONE=example.com. \
// DDNS_RECORD_NAME=_acme-challenge \
// DDNS_RECORD_TEXT=validation-token \
// cargo run --bin rfc2136_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `DDNS_TSIG_KEY_NAME`: TSIG key name
// - `DDNS_TSIG_SECRET`: Base64 TSIG secret (as in the BIND key file)
// - `DDNS_DNS_SERVER`: Authoritative server, `host` or `host:port`
// - `DDNS_ZONE`: Zone to update
//
// Optional:
// - `DDNS_TSIG_ALGORITHM`: TSIG algorithm (default: hmac-sha256)
// - `DDNS_RESOLVER`: Recursive resolver for the read (default: 8.8.8.8:53)
// - `DDNS_RECORD_NAME`: Record name relative to the zone (default: _ddns-validation)
// - `DDNS_RECORD_TEXT`: TXT value (default: ddns-validation)
// - `DDNS_KEEP_RECORD`: "true" to skip the final delete
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)

use anyhow::{Context, Result};
use ddns_core::{
    ProviderConfig, Record, RecordAppender, RecordDeleter, RecordGetter, SigningAlgorithm,
};
use ddns_provider_rfc2136::Rfc2136Provider;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Demo settings
struct Settings {
    config: ProviderConfig,
    zone: String,
    record: Record,
    keep_record: bool,
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} environment variable is required"))
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let algorithm = env::var("DDNS_TSIG_ALGORITHM")
            .unwrap_or_default()
            .parse::<SigningAlgorithm>()
            .context("DDNS_TSIG_ALGORITHM is not a known TSIG algorithm")?;

        let mut config = ProviderConfig::new(
            required("DDNS_TSIG_KEY_NAME")?,
            required("DDNS_TSIG_SECRET")?,
            algorithm,
            required("DDNS_DNS_SERVER")?,
        );
        if let Ok(resolver) = env::var("DDNS_RESOLVER") {
            config = config.with_resolver(resolver);
        }

        let name = env::var("DDNS_RECORD_NAME").unwrap_or_else(|_| "_ddns-validation".to_string());
        let text = env::var("DDNS_RECORD_TEXT").unwrap_or_else(|_| "ddns-validation".to_string());

        Ok(Self {
            config,
            zone: required("DDNS_ZONE")?,
            record: Record::txt(name, text),
            keep_record: env::var("DDNS_KEEP_RECORD").is_ok_and(|v| v == "true"),
        })
    }
}

async fn run(settings: Settings) -> Result<()> {
    let provider = Rfc2136Provider::new(settings.config)?;
    info!("Using {:?}", provider);

    let records = vec![settings.record];
    provider.append_records(&settings.zone, &records).await?;
    info!("Appended {}", records[0]);

    for record in provider.get_records(&settings.zone).await? {
        info!("  {}", record);
    }

    if settings.keep_record {
        info!("DDNS_KEEP_RECORD set, leaving {} in place", records[0]);
        return Ok(());
    }

    provider.delete_records(&settings.zone, &records).await?;
    info!("Deleted {}", records[0]);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let log_level = match env::var("DDNS_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Validation failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
