//! Update composer and transmitter
//!
//! Builds one RFC 2136 UPDATE for one record, hands it to the transport with
//! the TSIG signer, and turns the server's response code into a result.

use ddns_core::name::{absolute_name, update_zone};
use ddns_core::{Error, ProviderConfig, Record, Result};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use std::net::IpAddr;
use std::str::FromStr;
use tracing::{debug, error, info};

use crate::transport::{DnsTransport, server_endpoint};
use crate::tsig::create_tsig_signer;

/// Longest character-string a TXT record can carry
const MAX_TXT_STRING: usize = 255;

/// Whether the record is added to or removed from its RRset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// Add the record (class IN, configured TTL)
    Insert,
    /// Delete exactly this record from its RRset (class NONE, TTL 0)
    Remove,
}

impl UpdateOp {
    /// Pick the operation from a delete flag
    pub fn from_delete(is_delete: bool) -> Self {
        if is_delete { Self::Remove } else { Self::Insert }
    }
}

/// Record data for the variants an update can carry
///
/// Everything else is rejected before a message is built.
pub fn payload(record: &Record) -> Result<RData> {
    match record {
        Record::Txt { text, .. } => Ok(RData::TXT(TXT::new(split_txt(text)))),
        Record::Address {
            ip: IpAddr::V4(ip), ..
        } => Ok(RData::A(A::from(*ip))),
        Record::Address {
            ip: IpAddr::V6(ip), ..
        } => Ok(RData::AAAA(AAAA::from(*ip))),
        Record::Cname { .. } | Record::Mx { .. } | Record::Rr(_) => {
            Err(Error::unsupported(record.type_name()))
        }
    }
}

/// Split a text value into character-strings of at most 255 bytes
fn split_txt(text: &str) -> Vec<String> {
    if text.len() <= MAX_TXT_STRING {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if current.len() + c.len_utf8() > MAX_TXT_STRING {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn parse_name(name: &str) -> Result<Name> {
    Name::from_str(name).map_err(|e| Error::invalid_input(format!("invalid domain name {name:?}: {e}")))
}

/// Build the unsigned UPDATE message for one record
///
/// The zone section carries `zone IN SOA`; the single update-section entry
/// is an add or a delete-RR depending on `op`.
pub fn build_update(zone: &str, record: &Record, ttl: u32, op: UpdateOp) -> Result<Message> {
    let rdata = payload(record)?;
    let zone_name = parse_name(&update_zone(zone)?)?;
    let domain = parse_name(&absolute_name(record.name(), zone)?)?;

    let mut rr = hickory_proto::rr::Record::from_rdata(domain, ttl, rdata);
    match op {
        UpdateOp::Insert => {
            rr.set_dns_class(DNSClass::IN);
        }
        UpdateOp::Remove => {
            rr.set_dns_class(DNSClass::NONE);
            rr.set_ttl(0);
        }
    }

    let mut zone_query = Query::query(zone_name, RecordType::SOA);
    zone_query.set_query_class(DNSClass::IN);

    let mut message = Message::new();
    message
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Update)
        .set_recursion_desired(false);
    message.add_query(zone_query);
    message.add_name_server(rr);

    Ok(message)
}

/// Apply one record to `zone` on the configured server
///
/// # Errors
///
/// - [`Error::UnsupportedRecord`] for variants other than TXT and address
/// - [`Error::Config`] if no signer can be built from the configuration
/// - [`Error::Transport`] if signing, sending or receiving fails
/// - [`Error::Protocol`] if the server answers with anything but NOERROR
pub async fn apply(
    config: &ProviderConfig,
    transport: &dyn DnsTransport,
    zone: &str,
    record: &Record,
    is_delete: bool,
) -> Result<()> {
    let op = UpdateOp::from_delete(is_delete);
    let message = build_update(zone, record, config.ttl, op)?;
    let domain = absolute_name(record.name(), zone)?;
    let server = server_endpoint(&config.server);
    let signer = create_tsig_signer(config)?;

    debug!(
        "Sending {} {} update for {} to {}",
        config.algorithm.fqdn(),
        if is_delete { "delete" } else { "add" },
        domain,
        server
    );
    let response = transport.exchange(&server, message, Some(signer)).await?;

    match response.response_code() {
        ResponseCode::NoError => {
            info!(
                "{} {} record {} via {}",
                if is_delete { "Removed" } else { "Inserted" },
                record.type_name(),
                domain,
                server
            );
            Ok(())
        }
        code => {
            error!(
                "DNS UPDATE rejected by {} for {} ({}) with response code: {:?}",
                server,
                domain,
                record.type_name(),
                code
            );
            Err(Error::protocol(domain, format!("{code:?}")))
        }
    }
}
