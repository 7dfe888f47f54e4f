//! DNS transport
//!
//! One request, one response. UDP first; a truncated reply is repeated over
//! TCP. No retries. The wire work is hickory-client's synchronous client,
//! run on the blocking pool.

use async_trait::async_trait;
use ddns_core::{Error, Result};
use hickory_client::client::{Client, SyncClient};
use hickory_client::tcp::TcpClientConnection;
use hickory_client::udp::UdpClientConnection;
use hickory_proto::op::Message;
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::xfer::{DnsRequest, DnsRequestOptions, DnsResponse};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::timeout;

/// Standard DNS port
pub const DNS_PORT: u16 = 53;

/// Exchanges one DNS message with a server
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Send `request` to `server` (`host:port`) and wait for the reply
    ///
    /// With a `signer` the request is TSIG-signed at send time, after the
    /// transport has assigned its message id.
    async fn exchange(
        &self,
        server: &str,
        request: Message,
        signer: Option<TSigner>,
    ) -> Result<Message>;
}

/// Normalize a server address into `host:port`, defaulting the port to 53
pub fn server_endpoint(server: &str) -> String {
    let server = server.trim();
    if server.parse::<SocketAddr>().is_ok() {
        return server.to_string();
    }
    if let Ok(ip) = server.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        return SocketAddr::new(ip, DNS_PORT).to_string();
    }
    match server.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => server.to_string(),
        _ => format!("{server}:{DNS_PORT}"),
    }
}

/// UDP transport with TCP fallback on truncation
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    /// Create a transport whose every phase is bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn resolve(&self, server: &str) -> Result<SocketAddr> {
        let mut addrs = timeout(self.timeout, tokio::net::lookup_host(server))
            .await
            .map_err(|e| Error::transport(format!("resolve {server}"), e))?
            .map_err(|e| Error::transport(format!("resolve {server}"), e))?;
        addrs.next().ok_or_else(|| {
            Error::transport(
                format!("resolve {server}"),
                io::Error::new(io::ErrorKind::NotFound, "no addresses"),
            )
        })
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(ddns_core::config::DEFAULT_UPDATE_TIMEOUT_SECS))
    }
}

/// First response of an exchange, as a plain message
fn first_response<E>(
    responses: Vec<std::result::Result<DnsResponse, E>>,
    context: String,
) -> Result<Message>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match responses.into_iter().next() {
        Some(Ok(response)) => Ok(Message::clone(&response)),
        Some(Err(e)) => Err(Error::transport(context, e)),
        None => Err(Error::transport(
            context,
            io::Error::new(io::ErrorKind::UnexpectedEof, "no response"),
        )),
    }
}

fn request(message: Message) -> DnsRequest {
    DnsRequest::new(message, DnsRequestOptions::default())
}

fn exchange_udp(
    addr: SocketAddr,
    timeout: Duration,
    message: Message,
    signer: Option<TSigner>,
) -> Result<Message> {
    let conn = UdpClientConnection::with_timeout(addr, timeout)
        .map_err(|e| Error::transport(format!("UDP connection to {addr}"), e))?;
    let client = match signer {
        Some(signer) => SyncClient::with_tsigner(conn, signer),
        None => SyncClient::new(conn),
    };
    first_response(client.send(request(message)), format!("UDP exchange with {addr}"))
}

fn exchange_tcp(
    addr: SocketAddr,
    timeout: Duration,
    message: Message,
    signer: Option<TSigner>,
) -> Result<Message> {
    let conn = TcpClientConnection::with_timeout(addr, timeout)
        .map_err(|e| Error::transport(format!("TCP connection to {addr}"), e))?;
    let client = match signer {
        Some(signer) => SyncClient::with_tsigner(conn, signer),
        None => SyncClient::new(conn),
    };
    first_response(client.send(request(message)), format!("TCP exchange with {addr}"))
}

/// Blocking UDP exchange, repeated over TCP when the reply is truncated
fn exchange_blocking(
    addr: SocketAddr,
    timeout: Duration,
    message: Message,
    signer: Option<TSigner>,
) -> Result<Message> {
    let response = exchange_udp(addr, timeout, message.clone(), signer.clone())?;
    if !response.truncated() {
        return Ok(response);
    }

    tracing::debug!("Reply from {} truncated, retrying over TCP", addr);
    exchange_tcp(addr, timeout, message, signer)
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn exchange(
        &self,
        server: &str,
        request: Message,
        signer: Option<TSigner>,
    ) -> Result<Message> {
        let addr = self.resolve(server).await?;
        let limit = self.timeout;

        // hickory-client's client is synchronous
        tokio::task::spawn_blocking(move || exchange_blocking(addr, limit, request, signer))
            .await
            .map_err(|e| Error::transport(format!("exchange with {addr}"), e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::op::{MessageType, OpCode, Query, ResponseCode};
    use hickory_proto::rr::{Name, RData, Record, RecordType};
    use std::str::FromStr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, UdpSocket};

    fn query() -> Message {
        let mut message = Message::new();
        message
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        message.add_query(Query::query(
            Name::from_str("example.com.").unwrap(),
            RecordType::A,
        ));
        message
    }

    fn reply_to(request: &Message, truncated: bool) -> Vec<u8> {
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_response_code(ResponseCode::NoError)
            .set_truncated(truncated);
        response.add_queries(request.queries().to_vec());
        if !truncated {
            response.add_answer(Record::from_rdata(
                Name::from_str("example.com.").unwrap(),
                60,
                RData::A("192.0.2.1".parse::<std::net::Ipv4Addr>().unwrap().into()),
            ));
        }
        response.to_vec().unwrap()
    }

    #[test]
    fn test_server_endpoint() {
        assert_eq!(server_endpoint("ns.test"), "ns.test:53");
        assert_eq!(server_endpoint("ns.test:5353"), "ns.test:5353");
        assert_eq!(server_endpoint("192.0.2.1"), "192.0.2.1:53");
        assert_eq!(server_endpoint("192.0.2.1:53"), "192.0.2.1:53");
        assert_eq!(server_endpoint("2001:db8::1"), "[2001:db8::1]:53");
        assert_eq!(server_endpoint("[2001:db8::1]:5353"), "[2001:db8::1]:5353");
    }

    #[tokio::test]
    async fn test_truncated_udp_reply_is_repeated_over_tcp() {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = udp.local_addr().unwrap();
        let tcp = TcpListener::bind(addr).await.unwrap();

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = udp.recv_from(&mut buf).await.unwrap();
            let request = Message::from_vec(&buf[..len]).unwrap();
            udp.send_to(&reply_to(&request, true), peer).await.unwrap();

            let (mut stream, _) = tcp.accept().await.unwrap();
            let len = stream.read_u16().await.unwrap();
            let mut body = vec![0u8; usize::from(len)];
            stream.read_exact(&mut body).await.unwrap();
            let request = Message::from_vec(&body).unwrap();
            let reply = reply_to(&request, false);
            stream.write_u16(reply.len() as u16).await.unwrap();
            stream.write_all(&reply).await.unwrap();
            stream.flush().await.unwrap();
            request
        });

        let transport = UdpTransport::new(Duration::from_secs(5));
        let response = transport
            .exchange(&addr.to_string(), query(), None)
            .await
            .unwrap();

        assert!(!response.truncated());
        assert_eq!(response.answers().len(), 1);
        let over_tcp = server.await.unwrap();
        assert!(over_tcp.recursion_desired());
        assert_eq!(over_tcp.queries()[0].query_type(), RecordType::A);
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        // Bound but silent
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = udp.local_addr().unwrap();

        let transport = UdpTransport::new(Duration::from_millis(200));
        let err = transport
            .exchange(&addr.to_string(), query(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        drop(udp);
    }

    #[tokio::test]
    async fn test_unresolvable_server_is_transport_error() {
        let transport = UdpTransport::new(Duration::from_secs(2));
        let err = transport
            .exchange("not a host name:53", query(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
