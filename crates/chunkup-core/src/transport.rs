//! HTTP transport for the upload protocol.
//!
//! Uses the curl crate (libcurl). Every request carries the bearer credential
//! and `Accept: application/json`. Transfers are blocking; `execute` runs
//! them on `spawn_blocking` so async callers suspend instead of blocking.
//! Curl handles and header lists live only for the duration of one request.

use crate::config::ChunkupConfig;
use crate::error::{ResourceId, UploadError};
use crate::observer::Method;
use curl::easy::{Easy, Form, List};
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Request body shapes used by the protocol.
#[derive(Debug)]
pub(crate) enum Body {
    Empty,
    Json(Vec<u8>),
    File(FilePart),
}

/// A single-field multipart body carrying one file part.
#[derive(Debug)]
pub(crate) struct FilePart {
    pub field: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Extra part headers as `Name: value` lines.
    pub headers: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Request {
    pub method: Method,
    pub uri: String,
    pub body: Body,
}

/// Status, final address, header lines and raw body of one response.
#[derive(Debug, Clone)]
pub(crate) struct Response {
    pub status: u32,
    pub located_uri: String,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Value of the last header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter_map(|line| line.split_once(':'))
            .filter(|(n, _)| n.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .last()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection settings shared by every request made through one client.
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    bearer_token: Option<Arc<str>>,
    connect_timeout: Duration,
    timeout: Duration,
    abort: Arc<AtomicBool>,
}

impl Transport {
    /// Creates a transport for the service rooted at `base_url` (http or https).
    pub fn new(base_url: &str) -> Result<Self, UploadError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| UploadError::invalid(format!("base url {:?}: {}", base_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(UploadError::invalid(format!(
                "base url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
            abort: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn from_config(cfg: &ChunkupConfig) -> Result<Self, UploadError> {
        let mut transport = Self::new(&cfg.base_url)?.with_timeouts(
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.timeout_secs),
        );
        if let Some(token) = cfg.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            transport = transport.with_bearer_token(token);
        }
        Ok(transport)
    }

    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(Arc::from(token));
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = connect;
        self.timeout = total;
        self
    }

    /// Token that cancels in-flight and future requests when set to true.
    pub fn abort_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    pub fn reset_abort(&self) {
        self.abort.store(false, Ordering::Relaxed);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `B/Files(R)`
    pub fn file_uri(&self, id: ResourceId) -> String {
        format!("{}/Files({})", self.base_url, id)
    }

    /// `B/Files(R)/UploadSessions`
    pub fn sessions_uri(&self, id: ResourceId) -> String {
        format!("{}/UploadSessions", self.file_uri(id))
    }

    /// `B/Files(R)/UploadSessions?sessionId=S`
    pub fn session_uri(&self, id: ResourceId, session_id: &str) -> Result<String, UploadError> {
        let mut url = url::Url::parse(&self.sessions_uri(id))
            .map_err(|e| UploadError::invalid(format!("session url: {}", e)))?;
        url.query_pairs_mut().append_pair("sessionId", session_id);
        Ok(url.to_string())
    }

    /// Sends `request` on the blocking pool and awaits the response.
    pub(crate) async fn execute(&self, request: Request) -> Result<Response, UploadError> {
        let transport = self.clone();
        tokio::task::spawn_blocking(move || transport.send_blocking(request)).await?
    }

    /// Performs one request on the current thread.
    fn send_blocking(&self, request: Request) -> Result<Response, UploadError> {
        if self.abort.load(Ordering::Relaxed) {
            return Err(UploadError::Cancelled);
        }

        let mut easy = Easy::new();
        easy.url(&request.uri)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut list = List::new();
        list.append("Accept: application/json")?;
        if let Some(token) = &self.bearer_token {
            list.append(&format!("Authorization: Bearer {}", token))?;
        }

        match (request.method, request.body) {
            (Method::Head, _) => {
                easy.nobody(true)?;
                easy.follow_location(true)?;
            }
            (Method::Post, Body::Json(json)) => {
                easy.post(true)?;
                easy.post_fields_copy(&json)?;
                list.append("Content-Type: application/json")?;
            }
            (Method::Post, _) => {
                easy.post(true)?;
                easy.post_fields_copy(&[])?;
            }
            (Method::Put, Body::File(part)) => {
                easy.httppost(build_form(part)?)?;
                easy.custom_request("PUT")?;
                // No 100-continue round trip before the part bytes.
                list.append("Expect:")?;
            }
            (Method::Put, _) => {
                easy.custom_request("PUT")?;
            }
        }
        easy.http_headers(list)?;
        easy.progress(true)?;

        let abort = Arc::clone(&self.abort);
        let mut headers: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    // A new status line starts a new header block (redirects).
                    if line.starts_with("HTTP/") {
                        headers.clear();
                    }
                    if !line.is_empty() {
                        headers.push(line.to_string());
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(move |_, _, _, _| !abort.load(Ordering::Relaxed))?;
            if let Err(e) = transfer.perform() {
                if e.is_aborted_by_callback() {
                    return Err(UploadError::Cancelled);
                }
                return Err(UploadError::Transport(e));
            }
        }

        let status = easy.response_code()?;
        let located_uri = easy
            .effective_url()?
            .map(str::to_string)
            .unwrap_or(request.uri);

        Ok(Response {
            status,
            located_uri,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn build_form(part: FilePart) -> Result<Form, UploadError> {
    let mut part_headers = List::new();
    for line in &part.headers {
        part_headers.append(line)?;
    }
    let mut form = Form::new();
    form.part(part.field)
        .buffer(part.file_name.as_str(), part.bytes)
        .content_type("application/octet-stream")
        .content_header(part_headers)
        .add()
        .map_err(|e| UploadError::invalid(format!("multipart body: {}", e)))?;
    Ok(form)
}
