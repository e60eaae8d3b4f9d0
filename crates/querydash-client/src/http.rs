//! Minimal HTTP/1.1 client transport over a plain TCP connection.

use crate::error::ClientError;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Upper bound on a status, header or chunk-size line.
const MAX_LINE_BYTES: u64 = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    /// Accepts `http://host[:port][/path]`; the port defaults to 80.
    pub fn parse(endpoint: &str) -> Result<Self, ClientError> {
        let rest = endpoint
            .strip_prefix("http://")
            .ok_or_else(|| ClientError::InvalidEndpoint(endpoint.to_string()))?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ClientError::InvalidEndpoint(endpoint.to_string()))?;
                (host, port)
            }
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Responses whose body would exceed `max_body_bytes` fail with
    /// [`ClientError::MalformedResponse`].
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        let endpoint = Endpoint::parse(&request.endpoint)?;
        let pending = exchange(&endpoint, &request, self.max_body_bytes);
        match timeout(self.request_timeout, pending).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.request_timeout)),
        }
    }
}

async fn exchange(
    endpoint: &Endpoint,
    request: &TransportRequest,
    max_body_bytes: usize,
) -> Result<TransportResponse, ClientError> {
    let authority = endpoint.authority();
    let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(|err| ClientError::Connect(format!("{authority}: {err}")))?;
    let mut stream = BufReader::new(stream);

    let payload = build_request(endpoint, request);
    stream.get_mut().write_all(&payload).await?;
    stream.get_mut().flush().await?;

    let status = read_status_line(&mut stream).await?;
    let headers = read_headers(&mut stream).await?;
    let body = read_body(&mut stream, &headers, max_body_bytes).await?;
    debug!(
        endpoint = %authority,
        status,
        bytes = body.len(),
        "http exchange complete"
    );
    Ok(TransportResponse::new(status, body))
}

pub fn build_request(endpoint: &Endpoint, request: &TransportRequest) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_slice(format!("{} {} HTTP/1.1\r\n", request.method, endpoint.path).as_bytes());
    buf.put_slice(format!("Host: {}\r\n", endpoint.authority()).as_bytes());
    for (name, value) in &request.headers {
        buf.put_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    buf.put_slice(format!("Content-Length: {}\r\n", request.body.len()).as_bytes());
    buf.put_slice(b"Connection: close\r\n\r\n");
    buf.put_slice(request.body.as_bytes());
    buf.to_vec()
}

async fn read_line<S: AsyncBufRead + Unpin>(stream: &mut S) -> Result<Option<String>, ClientError> {
    let mut line = String::new();
    let n = (&mut *stream).take(MAX_LINE_BYTES).read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') && n as u64 >= MAX_LINE_BYTES {
        return Err(ClientError::MalformedResponse(format!(
            "line exceeds {MAX_LINE_BYTES} bytes"
        )));
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

async fn read_status_line<S: AsyncBufRead + Unpin>(stream: &mut S) -> Result<u16, ClientError> {
    let line = read_line(stream)
        .await?
        .ok_or_else(|| ClientError::MalformedResponse("connection closed before status line".into()))?;
    parse_status_line(&line)
}

pub fn parse_status_line(line: &str) -> Result<u16, ClientError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse::<u16>()
            .map_err(|_| ClientError::MalformedResponse(format!("bad status line: {line}"))),
        _ => Err(ClientError::MalformedResponse(format!(
            "bad status line: {line}"
        ))),
    }
}

async fn read_headers<S: AsyncBufRead + Unpin>(
    stream: &mut S,
) -> Result<HashMap<String, String>, ClientError> {
    let mut headers = HashMap::new();
    loop {
        let line = read_line(stream)
            .await?
            .ok_or_else(|| ClientError::MalformedResponse("connection closed in headers".into()))?;
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }
    Ok(headers)
}

async fn read_body<S: AsyncBufRead + Unpin>(
    stream: &mut S,
    headers: &HashMap<String, String>,
    max_body_bytes: usize,
) -> Result<Bytes, ClientError> {
    let chunked = headers
        .get("transfer-encoding")
        .map(|v| v.to_lowercase().contains("chunked"))
        .unwrap_or(false);
    if chunked {
        return read_chunked_body(stream, max_body_bytes).await;
    }
    match headers.get("content-length") {
        Some(len) => {
            let len = len
                .parse::<usize>()
                .map_err(|_| ClientError::MalformedResponse(format!("bad content-length: {len}")))?;
            if len > max_body_bytes {
                return Err(ClientError::MalformedResponse(format!(
                    "content-length {len} exceeds limit of {max_body_bytes} bytes"
                )));
            }
            let mut buf = BytesMut::with_capacity(len);
            read_exactly(stream, &mut buf, len).await?;
            Ok(buf.freeze())
        }
        None => {
            let mut buf = Vec::new();
            (&mut *stream)
                .take((max_body_bytes as u64).saturating_add(1))
                .read_to_end(&mut buf)
                .await?;
            if buf.len() > max_body_bytes {
                return Err(ClientError::MalformedResponse(format!(
                    "body exceeds limit of {max_body_bytes} bytes"
                )));
            }
            Ok(Bytes::from(buf))
        }
    }
}

/// Appends exactly `len` bytes to `buf`, failing if the peer closes early.
async fn read_exactly<S: AsyncBufRead + Unpin>(
    stream: &mut S,
    buf: &mut BytesMut,
    len: usize,
) -> Result<(), ClientError> {
    let mut chunk = Vec::new();
    let read = (&mut *stream).take(len as u64).read_to_end(&mut chunk).await?;
    if read != len {
        return Err(ClientError::MalformedResponse(format!(
            "body truncated: expected {len} bytes, got {read}"
        )));
    }
    buf.put_slice(&chunk);
    Ok(())
}

async fn read_chunked_body<S: AsyncBufRead + Unpin>(
    stream: &mut S,
    max_body_bytes: usize,
) -> Result<Bytes, ClientError> {
    let mut body = BytesMut::new();
    loop {
        let size_line = read_line(stream)
            .await?
            .ok_or_else(|| ClientError::MalformedResponse("connection closed in chunk size".into()))?;
        let size = parse_chunk_size(&size_line)?;
        if size == 0 {
            // trailers
            while let Some(line) = read_line(stream).await? {
                if line.is_empty() {
                    break;
                }
            }
            return Ok(body.freeze());
        }
        match body.len().checked_add(size) {
            Some(total) if total <= max_body_bytes => {}
            _ => {
                return Err(ClientError::MalformedResponse(format!(
                    "chunked body exceeds limit of {max_body_bytes} bytes"
                )))
            }
        }
        read_exactly(stream, &mut body, size).await?;
        read_line(stream).await?;
    }
}

pub fn parse_chunk_size(size_line: &str) -> Result<usize, ClientError> {
    let size = size_line.split(';').next().unwrap_or(size_line).trim();
    usize::from_str_radix(size, 16)
        .map_err(|_| ClientError::MalformedResponse(format!("bad chunk size: {size_line}")))
}
