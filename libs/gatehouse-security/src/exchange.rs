use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use http::header::TRANSFER_ENCODING;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::context::SecurityContext;

/// The request/response exchange the security chain operates on.
///
/// This is the narrow interface the pipeline consumes from the
/// transport layer: the request line and headers, the client address,
/// a mutable [`SecurityContext`] slot, and the response status/headers
/// the stages may write before terminating the exchange early.
///
/// Status codes are first-writer-wins: once a stage (or interceptor)
/// has set an error status, later writers do not override it.
pub struct Exchange {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    client_addr: IpAddr,
    security: SecurityContext,
    response_status: Option<StatusCode>,
    response_headers: HeaderMap,
    complete: bool,
    request_channel_closed: bool,
}

impl Exchange {
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> ExchangeBuilder {
        ExchangeBuilder {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            client_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a request header, when present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn client_addr(&self) -> IpAddr {
        self.client_addr
    }

    #[must_use]
    pub fn security(&self) -> &SecurityContext {
        &self.security
    }

    pub fn security_mut(&mut self) -> &mut SecurityContext {
        &mut self.security
    }

    #[must_use]
    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_status
    }

    /// Set the response status unless one was already set.
    pub fn set_response_status(&mut self, status: StatusCode) {
        if self.response_status.is_none() {
            self.response_status = Some(status);
        }
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Append a response header, keeping any existing values.
    pub fn append_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.append(name, value);
    }

    /// Whether the request body uses chunked transfer-encoding.
    ///
    /// Chunked requests must not have their channel closed mid-stream,
    /// so [`end`](Self::end) leaves the channel open for them.
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.headers
            .get(TRANSFER_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    }

    /// Terminate the exchange. No further stage runs after this; the
    /// request channel is shut down early to bound resource use, except
    /// for chunked bodies.
    pub fn end(&mut self) {
        self.complete = true;
        if !self.is_chunked() {
            self.request_channel_closed = true;
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the request channel was shut down when the exchange ended.
    #[must_use]
    pub fn is_request_channel_closed(&self) -> bool {
        self.request_channel_closed
    }
}

pub struct ExchangeBuilder {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    client_addr: IpAddr,
}

impl ExchangeBuilder {
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the request headers wholesale, e.g. from a transport
    /// request.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn client_addr(mut self, addr: IpAddr) -> Self {
        self.client_addr = addr;
        self
    }

    /// Parse a raw query string (`a=1&b=2`) into query params.
    #[must_use]
    pub fn query_string(mut self, raw: &str) -> Self {
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((k, v)) => self.query.insert(k.to_owned(), v.to_owned()),
                None => self.query.insert(pair.to_owned(), String::new()),
            };
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Exchange {
        Exchange {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            client_addr: self.client_addr,
            security: SecurityContext::new(),
            response_status: None,
            response_headers: HeaderMap::new(),
            complete: false,
            request_channel_closed: false,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn status_is_first_writer_wins() {
        let mut ex = Exchange::builder(Method::GET, "/ping").build();

        ex.set_response_status(StatusCode::TOO_MANY_REQUESTS);
        ex.set_response_status(StatusCode::UNAUTHORIZED);

        assert_eq!(ex.response_status(), Some(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn end_closes_request_channel() {
        let mut ex = Exchange::builder(Method::GET, "/ping").build();
        ex.end();

        assert!(ex.is_complete());
        assert!(ex.is_request_channel_closed());
    }

    #[test]
    fn end_keeps_channel_open_for_chunked_requests() {
        let mut ex = Exchange::builder(Method::POST, "/data")
            .header(TRANSFER_ENCODING, HeaderValue::from_static("chunked"))
            .build();
        ex.end();

        assert!(ex.is_complete());
        assert!(!ex.is_request_channel_closed());
    }

    #[test]
    fn query_string_parsing() {
        let ex = Exchange::builder(Method::GET, "/coll")
            .query_string("noauthchallenge&page=2")
            .build();

        assert_eq!(ex.query_param("noauthchallenge"), Some(""));
        assert_eq!(ex.query_param("page"), Some("2"));
        assert_eq!(ex.query_param("missing"), None);
    }
}
