//! Purpose: Blocking HTTP transport for a wiki's `api.php` endpoint.
//! Exports: `HttpTransport`.
//! Role: Concrete `Transport`; encodes `Params` for the wire and splits replies.
//! Invariants: GET carries params in the query string; POST is form-encoded, or multipart when files are attached.
//! Invariants: Non-JSON bodies and HTTP failures without an `error` object are transport/decode faults.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, Method, Request};
use super::transport::{Format, Reply, Transport};
use crate::core::error::{Error, ErrorKind};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("wikiquery/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

struct HttpTransportInner {
    endpoint: Url,
    user_agent: String,
    timeout: Duration,
    tls: Option<Arc<rustls::ClientConfig>>,
    agent: ureq::Agent,
}

impl HttpTransport {
    /// `endpoint` is the full `api.php` URL.
    pub fn new(endpoint: impl Into<String>) -> ApiResult<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        let agent = build_agent(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT, None);
        Ok(Self {
            inner: Arc::new(HttpTransportInner {
                endpoint,
                user_agent: DEFAULT_USER_AGENT.to_string(),
                timeout: DEFAULT_TIMEOUT,
                tls: None,
                agent,
            }),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        let agent = build_agent(&user_agent, self.inner.timeout, self.inner.tls.clone());
        self.rebuild(|inner| HttpTransportInner {
            endpoint: inner.endpoint.clone(),
            user_agent,
            timeout: inner.timeout,
            tls: inner.tls.clone(),
            agent,
        })
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        let agent = build_agent(&self.inner.user_agent, timeout, self.inner.tls.clone());
        self.rebuild(|inner| HttpTransportInner {
            endpoint: inner.endpoint.clone(),
            user_agent: inner.user_agent.clone(),
            timeout,
            tls: inner.tls.clone(),
            agent,
        })
    }

    /// Trusts only the certificates in a PEM file.
    pub fn with_tls_ca_file(self, path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let cert_bytes = std::fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("failed to read TLS CA file {}", path.display()))
                .with_source(err)
        })?;
        let mut cert_reader = Cursor::new(cert_bytes);
        let certs = rustls_pemfile::certs(&mut cert_reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("failed to parse TLS CA file {}", path.display()))
                    .with_source(err)
            })?;
        if certs.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("TLS CA file {} contains no certificates", path.display())));
        }

        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let mut root_store = rustls::RootCertStore::empty();
        let (added, _) = root_store.add_parsable_certificates(certs);
        if added == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "TLS CA file {} contains no parsable certificates",
                path.display()
            )));
        }
        let tls_config = Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let agent = build_agent(
            &self.inner.user_agent,
            self.inner.timeout,
            Some(tls_config.clone()),
        );
        Ok(self.rebuild(|inner| HttpTransportInner {
            endpoint: inner.endpoint.clone(),
            user_agent: inner.user_agent.clone(),
            timeout: inner.timeout,
            tls: Some(tls_config),
            agent,
        }))
    }

    fn rebuild(mut self, build: impl FnOnce(&HttpTransportInner) -> HttpTransportInner) -> Self {
        let next = build(&self.inner);
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => *inner = next,
            None => self.inner = Arc::new(next),
        }
        self
    }

    fn dispatch(&self, request: &Request, format: Format) -> Result<ureq::Response, ureq::Error> {
        let endpoint = self.inner.endpoint.as_str();
        let agent = &self.inner.agent;
        let params = request.params();
        match request.method() {
            Method::Get => {
                let pairs = params.form_pairs();
                agent
                    .get(endpoint)
                    .set("Accept", "application/json")
                    .query_pairs(
                        pairs
                            .iter()
                            .map(|(key, value)| (key.as_str(), value.as_str()))
                            .chain(format.params()),
                    )
                    .call()
            }
            Method::Post if params.has_files() => {
                let body = MultipartBody::encode(request, format);
                agent
                    .post(endpoint)
                    .set("Accept", "application/json")
                    .set("Content-Type", &body.content_type())
                    .send_bytes(&body.bytes)
            }
            Method::Post => {
                let pairs = params.form_pairs();
                let form: Vec<(&str, &str)> = pairs
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str()))
                    .chain(format.params())
                    .collect();
                agent
                    .post(endpoint)
                    .set("Accept", "application/json")
                    .send_form(&form)
            }
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request, format: Format) -> ApiResult<Reply> {
        tracing::debug!(
            action = request.action(),
            method = ?request.method(),
            endpoint = %self.inner.endpoint,
            "dispatching api request"
        );
        match self.dispatch(request, format) {
            Ok(response) => read_reply(response),
            Err(ureq::Error::Status(status, response)) => read_error_reply(status, response),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn build_agent(
    user_agent: &str,
    timeout: Duration,
    tls: Option<Arc<rustls::ClientConfig>>,
) -> ureq::Agent {
    let builder = ureq::AgentBuilder::new()
        .user_agent(user_agent)
        .timeout(timeout);
    match tls {
        Some(config) => builder.tls_config(config).build(),
        None => builder.build(),
    }
}

fn normalize_endpoint(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid api endpoint url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("api endpoint url must use http or https scheme"));
    }
    if url.path().is_empty() || url.path() == "/" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("api endpoint url must include the api.php path")
            .with_hint("e.g. https://en.wikipedia.org/w/api.php"));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Streams the body into JSON; large revision pages exceed ureq's string cap.
fn read_reply(response: ureq::Response) -> ApiResult<Reply> {
    let payload = serde_json::from_reader(response.into_reader()).map_err(|err| {
        if err.is_io() {
            Error::new(ErrorKind::Transport)
                .with_message("failed to read response body")
                .with_source(err)
        } else {
            Error::new(ErrorKind::Decode)
                .with_message("response body is not json")
                .with_source(err)
        }
    })?;
    Reply::from_payload(payload)
}

/// Non-2xx replies that still carry an `error` object are API failures.
fn read_error_reply(status: u16, response: ureq::Response) -> ApiResult<Reply> {
    let body = response.into_string().unwrap_or_default();
    let failure = serde_json::from_str(&body)
        .ok()
        .and_then(|payload| Reply::from_payload(payload).ok())
        .filter(|reply| matches!(reply, Reply::Failure(_)));
    match failure {
        Some(reply) => {
            tracing::debug!(status, "api error delivered with non-success status");
            Ok(reply)
        }
        None => Err(Error::new(ErrorKind::Transport)
            .with_message(format!("api endpoint returned http status {status}"))
            .with_status(status)),
    }
}

struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    fn encode(request: &Request, format: Format) -> Self {
        let boundary = boundary_for(request);
        let mut bytes = Vec::new();
        let pairs = request.params().form_pairs();
        let fields = pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .chain(format.params());
        for (key, value) in fields {
            bytes.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{key}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (key, part) in request.params().files() {
            bytes.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{key}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    part.filename.replace('"', "%22")
                )
                .as_bytes(),
            );
            bytes.extend_from_slice(&part.contents);
            bytes.extend_from_slice(b"\r\n");
        }
        bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        Self { boundary, bytes }
    }

    fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Derived from the attached file contents so it cannot collide with them in practice.
fn boundary_for(request: &Request) -> String {
    let mut hasher = Sha256::new();
    for (key, part) in request.params().files() {
        hasher.update(key.as_bytes());
        hasher.update(&part.contents);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in digest.iter().take(16) {
        let _ = write!(hex, "{byte:02x}");
    }
    format!("wikiquery-{hex}")
}

#[cfg(test)]
mod tests {
    use super::{HttpTransport, MultipartBody, normalize_endpoint};
    use crate::api::request::Request;
    use crate::api::transport::Format;
    use crate::core::error::ErrorKind;
    use crate::core::params::FilePart;

    #[test]
    fn endpoint_requires_http_and_path() {
        let url = normalize_endpoint("https://wiki.example/w/api.php?x=1#frag".to_string())
            .expect("url");
        assert_eq!(url.as_str(), "https://wiki.example/w/api.php");

        let err = normalize_endpoint("ftp://wiki.example/api.php".to_string()).expect_err("scheme");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = normalize_endpoint("https://wiki.example".to_string()).expect_err("path");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn multipart_body_carries_fields_and_file() {
        let request = Request::post("upload")
            .param("filename", "A.txt")
            .param(
                "file",
                FilePart {
                    filename: "A.txt".to_string(),
                    contents: b"hello".to_vec(),
                },
            )
            .build()
            .expect("request");
        let body = MultipartBody::encode(&request, Format::JsonV2);
        let text = String::from_utf8(body.bytes.clone()).expect("utf8");
        assert!(body.content_type().starts_with("multipart/form-data; boundary=wikiquery-"));
        assert!(text.contains("name=\"filename\"\r\n\r\nA.txt\r\n"));
        assert!(text.contains("name=\"formatversion\"\r\n\r\n2\r\n"));
        assert!(text.contains("name=\"file\"; filename=\"A.txt\""));
        assert!(text.contains("\r\n\r\nhello\r\n"));
        assert!(text.ends_with(&format!("--{}--\r\n", body.boundary)));
    }

    #[test]
    fn connection_failure_is_transport_fault() {
        use crate::api::transport::Transport;
        let transport = HttpTransport::new("http://127.0.0.1:9/w/api.php")
            .expect("transport")
            .with_timeout(std::time::Duration::from_millis(200));
        let request = Request::get("query").param("meta", "siteinfo").build().expect("request");
        let err = transport
            .execute(&request, Format::JsonV2)
            .expect_err("unreachable");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
