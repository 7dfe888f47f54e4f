//! Zone reader
//!
//! Lists the address and text records at a zone's apex through a recursive
//! resolver. Nothing is cached; every call asks again.

use ddns_core::name::{APEX, fqdn, query_name};
use ddns_core::{Error, ProviderConfig, Record, Result};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use std::net::IpAddr;
use std::str::FromStr;
use tokio::time::timeout;
use tracing::debug;

use crate::transport::{DnsTransport, server_endpoint};

/// Build a recursive query for `name`
pub fn build_query(name: &Name, rtype: RecordType) -> Message {
    let mut query = Query::query(name.clone(), rtype);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new();
    message
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(query);
    message
}

/// Run one lookup and return the answers of the requested type
async fn lookup(
    config: &ProviderConfig,
    transport: &dyn DnsTransport,
    name: &Name,
    rtype: RecordType,
) -> Result<Vec<hickory_proto::rr::Record>> {
    let resolver = server_endpoint(&config.resolver);
    let request = build_query(name, rtype);

    let response = timeout(
        config.resolver_timeout(),
        transport.exchange(&resolver, request, None),
    )
    .await
    .map_err(|e| Error::resolution(name.to_string(), e))?
    .map_err(|e| Error::resolution(name.to_string(), e))?;

    match response.response_code() {
        ResponseCode::NoError => {}
        code => {
            return Err(Error::resolution(
                name.to_string(),
                format!("{rtype} lookup via {resolver} answered {code:?}"),
            ));
        }
    }

    let answers: Vec<_> = response
        .answers()
        .iter()
        .filter(|r| r.record_type() == rtype)
        .cloned()
        .collect();
    debug!("{} {} lookup returned {} answers", name, rtype, answers.len());
    Ok(answers)
}

/// List the A, AAAA and TXT records at the apex of `zone`
///
/// Address records come first (A before AAAA), then text records, each in
/// the order the resolver returned them. Empty text values are skipped.
pub async fn resolve(
    config: &ProviderConfig,
    transport: &dyn DnsTransport,
    zone: &str,
) -> Result<Vec<Record>> {
    let bare = query_name(zone)?;
    let name = Name::from_str(&fqdn(&bare))
        .map_err(|e| Error::invalid_input(format!("invalid zone name {bare:?}: {e}")))?;

    let mut records = Vec::new();

    for rtype in [RecordType::A, RecordType::AAAA] {
        for answer in lookup(config, transport, &name, rtype).await? {
            let ip: IpAddr = match answer.data() {
                Some(RData::A(a)) => a.0.into(),
                Some(RData::AAAA(aaaa)) => aaaa.0.into(),
                _ => continue,
            };
            records.push(Record::Address {
                name: APEX.to_string(),
                ip,
                ttl: answer.ttl(),
            });
        }
    }

    for answer in lookup(config, transport, &name, RecordType::TXT).await? {
        let Some(RData::TXT(txt)) = answer.data() else {
            continue;
        };
        let text: String = txt
            .txt_data()
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes))
            .collect();
        if text.is_empty() {
            continue;
        }
        records.push(Record::Txt {
            name: APEX.to_string(),
            text,
            ttl: answer.ttl(),
        });
    }

    Ok(records)
}
