//! Test doubles and common utilities for provider contract tests
//!
//! `MockDnsServer` plays both the authoritative server and the recursive
//! resolver behind the `DnsTransport` seam. It signs with the signer it is
//! handed the way the real transport does, then decodes the wire bytes,
//! verifies TSIG against its own key, keeps an in-memory zone and counts
//! everything.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::error::{Error, Result};
use ddns_core::{ProviderConfig, SigningAlgorithm};
use ddns_provider_rfc2136::transport::DnsTransport;
use ddns_provider_rfc2136::tsig::create_tsig_signer;
use ddns_provider_rfc2136::Rfc2136Provider;
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// base64("s3cr3t")
pub const SECRET: &str = "czNjcjN0";

/// Authoritative server used by the test configuration
pub const SERVER: &str = "ns.test:53";

/// Recursive resolver used by the test configuration
pub const RESOLVER: &str = "198.51.100.53:53";

/// Scripted failure for the n-th update
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Answer with this response code
    Rcode(ResponseCode),
    /// Fail the exchange as if the network were down
    Transport,
}

/// One request as the mock saw it
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// Endpoint the request was sent to
    pub server: String,
    /// Decoded request
    pub message: Message,
    /// Whether the TSIG signature verified
    pub signed: bool,
}

/// In-memory DNS server behind the transport seam
pub struct MockDnsServer {
    signer: TSigner,
    zone: Mutex<Vec<Record>>,
    requests: Mutex<Vec<SeenRequest>>,
    update_failures: Mutex<HashMap<usize, Failure>>,
    query_rcode: Mutex<Option<ResponseCode>>,
    calls: AtomicUsize,
    updates: AtomicUsize,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    delay: Mutex<Duration>,
}

impl MockDnsServer {
    /// Mock that verifies signatures with the test key
    pub fn new() -> Self {
        Self::with_signer(create_tsig_signer(&test_config()).expect("test signer"))
    }

    /// Mock that verifies signatures with another key
    pub fn with_signer(signer: TSigner) -> Self {
        Self {
            signer,
            zone: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            update_failures: Mutex::new(HashMap::new()),
            query_rcode: Mutex::new(None),
            calls: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Hold every exchange open for `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    /// Change the hold time for exchanges that start from now on
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Fail the `nth` update (1-based)
    pub fn fail_update(&self, nth: usize, failure: Failure) {
        self.update_failures.lock().unwrap().insert(nth, failure);
    }

    /// Answer every query with `rcode`
    pub fn fail_queries(&self, rcode: ResponseCode) {
        *self.query_rcode.lock().unwrap() = Some(rcode);
    }

    /// Put a record straight into the zone
    pub fn seed(&self, name: &str, ttl: u32, rdata: RData) {
        let record = Record::from_rdata(Name::from_str(name).unwrap(), ttl, rdata);
        self.zone.lock().unwrap().push(record);
    }

    /// Number of exchanges of any kind
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of update exchanges
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// True if two exchanges were ever in flight at once
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    /// Every request seen, in arrival order
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Update requests only
    pub fn update_requests(&self) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.message.op_code() == OpCode::Update)
            .collect()
    }

    /// Query requests only
    pub fn query_requests(&self) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.message.op_code() == OpCode::Query)
            .collect()
    }

    /// Current zone contents
    pub fn zone(&self) -> Vec<Record> {
        self.zone.lock().unwrap().clone()
    }

    fn respond(request: &Message, rcode: ResponseCode, answers: Vec<Record>) -> Message {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_response_code(rcode);
        response.add_queries(request.queries().to_vec());
        response.add_answers(answers);
        let bytes = response.to_vec().expect("encode response");
        Message::from_vec(&bytes).expect("decode response")
    }

    fn handle_update(&self, request: &Message, signed: bool) -> Result<Message> {
        let nth = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        match self.update_failures.lock().unwrap().get(&nth) {
            Some(Failure::Transport) => {
                return Err(Error::transport(
                    format!("mock exchange #{nth}"),
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
                ));
            }
            Some(Failure::Rcode(rcode)) => return Ok(Self::respond(request, *rcode, Vec::new())),
            None => {}
        }
        if !signed {
            return Ok(Self::respond(request, ResponseCode::NotAuth, Vec::new()));
        }

        let mut zone = self.zone.lock().unwrap();
        for rr in request.name_servers() {
            let same = |existing: &Record| {
                existing.name() == rr.name()
                    && existing.record_type() == rr.record_type()
                    && existing.data() == rr.data()
            };
            if rr.dns_class() == DNSClass::NONE {
                zone.retain(|existing| !same(existing));
            } else if !zone.iter().any(same) {
                zone.push(rr.clone());
            }
        }
        Ok(Self::respond(request, ResponseCode::NoError, Vec::new()))
    }

    fn handle_query(&self, request: &Message) -> Message {
        if let Some(rcode) = *self.query_rcode.lock().unwrap() {
            return Self::respond(request, rcode, Vec::new());
        }
        let query = &request.queries()[0];
        let answers = self
            .zone
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name() == query.name() && r.record_type() == query.query_type())
            .cloned()
            .collect();
        Self::respond(request, ResponseCode::NoError, answers)
    }
}

/// Clears the in-flight flag when an exchange ends, finished or cancelled
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsTransport for MockDnsServer {
    async fn exchange(
        &self,
        server: &str,
        mut request: Message,
        signer: Option<TSigner>,
    ) -> Result<Message> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let _in_flight = InFlight(&self.in_flight);

        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(signer) = &signer {
            let now = chrono::Utc::now().timestamp() as u32;
            request
                .finalize(signer, now)
                .map_err(|e| Error::transport("sign request", e))?;
        }
        let bytes = request.to_vec().expect("client sent an encodable message");
        let message = Message::from_vec(&bytes).expect("client sent a decodable message");
        let signed = self.signer.verify_message_byte(None, &bytes, true).is_ok();
        self.requests.lock().unwrap().push(SeenRequest {
            server: server.to_string(),
            message: message.clone(),
            signed,
        });

        if message.op_code() == OpCode::Update {
            self.handle_update(&message, signed)
        } else {
            Ok(self.handle_query(&message))
        }
    }
}

/// Configuration from the reference scenario
pub fn test_config() -> ProviderConfig {
    ProviderConfig::new("k1", SECRET, SigningAlgorithm::HmacSha256, SERVER).with_resolver(RESOLVER)
}

/// Provider wired to a fresh mock
pub fn provider_with_mock() -> (Rfc2136Provider, Arc<MockDnsServer>) {
    provider_with(MockDnsServer::new())
}

/// Provider wired to the given mock
pub fn provider_with(mock: MockDnsServer) -> (Rfc2136Provider, Arc<MockDnsServer>) {
    let mock = Arc::new(mock);
    let provider = Rfc2136Provider::with_transport(test_config(), mock.clone())
        .expect("test config is valid");
    (provider, mock)
}

/// Text strings of a TXT record
pub fn txt_strings(record: &Record) -> Vec<String> {
    match record.data() {
        Some(RData::TXT(txt)) => txt
            .txt_data()
            .iter()
            .map(|b| String::from_utf8_lossy(b).to_string())
            .collect(),
        other => panic!("expected TXT rdata, got {other:?}"),
    }
}
