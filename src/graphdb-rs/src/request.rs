//! Outgoing request construction.
//!
//! A [`RequestConfig`] is a one-shot mutation of an [`OutgoingRequest`]. The
//! executor applies them in the order given, so a later config overrides the
//! effect of an earlier one. Configs only ever see a `&mut` borrow of the
//! request, which keeps them from holding on to it after they ran.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Method};
use serde::Serialize;
use url::Url;

use crate::{ClientError, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// A request that configs can still mutate before it is sent
#[derive(Debug)]
pub struct OutgoingRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
    timeout: Option<Duration>,
    error: Option<ClientError>,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            error: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as text, if present and printable
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Replace the header, recording an error if name or value is invalid
    pub fn set_header(&mut self, name: &str, value: &str) {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                return self.fail(ClientError::InvalidHeader {
                    name: name.to_string(),
                    message: e.to_string(),
                })
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.fail(ClientError::InvalidHeader {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Buffered body bytes; `None` for streaming bodies or no body
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_ref().and_then(Body::as_bytes)
    }

    /// Replace the body. The previous one, streaming or not, is dropped.
    pub fn set_body(&mut self, body: Option<Body>) {
        self.body = body;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Record a construction error. The executor aborts with the first one
    /// recorded before anything goes on the wire.
    pub fn fail(&mut self, err: ClientError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub(crate) fn into_request(self) -> Result<reqwest::Request> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        *request.body_mut() = self.body;
        *request.timeout_mut() = self.timeout;
        Ok(request)
    }
}

/// A single mutation applied to an outgoing request
pub struct RequestConfig(Box<dyn FnOnce(&mut OutgoingRequest) + Send>);

impl RequestConfig {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut OutgoingRequest) + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub fn apply(self, request: &mut OutgoingRequest) {
        (self.0)(request)
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestConfig")
    }
}

/// Set a header, replacing any existing value
pub fn header(name: impl Into<String>, value: impl Into<String>) -> RequestConfig {
    let (name, value) = (name.into(), value.into());
    RequestConfig::new(move |req| req.set_header(&name, &value))
}

/// Append a query parameter
pub fn query(key: impl Into<String>, value: impl Into<String>) -> RequestConfig {
    let (key, value) = (key.into(), value.into());
    RequestConfig::new(move |req| {
        req.url_mut().query_pairs_mut().append_pair(&key, &value);
    })
}

/// Serialize `value` as the JSON body and set the content type.
///
/// Serialization happens right away; a failure surfaces when the config is
/// applied, before the request is sent.
pub fn json_body<T: Serialize + ?Sized>(value: &T) -> RequestConfig {
    let encoded = serde_json::to_vec(value);
    RequestConfig::new(move |req| match encoded {
        Ok(data) => {
            req.set_header(CONTENT_TYPE.as_str(), CONTENT_TYPE_JSON);
            req.set_body(Some(Body::from(data)));
        }
        Err(e) => req.fail(ClientError::Serialization(e)),
    })
}

/// Use raw bytes as the body with the given content type
pub fn body(content_type: impl Into<String>, data: impl Into<Bytes>) -> RequestConfig {
    let (content_type, data) = (content_type.into(), data.into());
    RequestConfig::new(move |req| {
        req.set_header(CONTENT_TYPE.as_str(), &content_type);
        req.set_body(Some(Body::from(data)));
    })
}

/// Per-request timeout covering connect through the end of the body
pub fn timeout(duration: Duration) -> RequestConfig {
    RequestConfig::new(move |req| req.set_timeout(duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> OutgoingRequest {
        OutgoingRequest::new(
            Method::POST,
            Url::parse("http://localhost:7200/rest/repositories").unwrap(),
        )
    }

    fn apply_all(req: &mut OutgoingRequest, configs: Vec<RequestConfig>) {
        for config in configs {
            config.apply(req);
        }
    }

    #[test]
    fn test_configs_apply_in_order() {
        let mut req = request();
        apply_all(
            &mut req,
            vec![
                header("x-graphdb-repository", "first"),
                query("location", "a"),
                header("x-graphdb-repository", "second"),
                query("location", "b"),
            ],
        );

        assert_eq!(req.header("x-graphdb-repository"), Some("second"));
        assert_eq!(req.url().query(), Some("location=a&location=b"));
        assert!(req.error().is_none());
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let mut req = request();
        json_body(&json!({"id": "movies"})).apply(&mut req);

        assert_eq!(req.header("content-type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(req.body_bytes(), Some(br#"{"id":"movies"}"#.as_slice()));
    }

    #[test]
    fn test_later_body_overrides_earlier() {
        let mut req = request();
        apply_all(
            &mut req,
            vec![
                json_body(&json!({"a": 1})),
                body("text/plain", "SELECT * WHERE { ?s ?p ?o }"),
            ],
        );

        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(
            req.body_bytes(),
            Some(b"SELECT * WHERE { ?s ?p ?o }".as_slice())
        );
    }

    #[test]
    fn test_query_escapes_values() {
        let mut req = request();
        query("query", "a b&c").apply(&mut req);
        assert_eq!(req.url().query(), Some("query=a+b%26c"));
    }

    #[test]
    fn test_invalid_header_is_deferred() {
        let mut req = request();
        apply_all(
            &mut req,
            vec![
                header("bad header", "x"),
                header("x-ok", "bad\nvalue"),
                timeout(Duration::from_secs(3)),
            ],
        );

        assert!(matches!(
            req.error(),
            Some(ClientError::InvalidHeader { name, .. }) if name == "bad header"
        ));
        assert_eq!(req.timeout(), Some(Duration::from_secs(3)));
        assert!(req.into_request().is_err());
    }

    #[test]
    fn test_into_request_carries_state() {
        let mut req = request();
        apply_all(
            &mut req,
            vec![header("accept", "application/json"), timeout(Duration::from_millis(250))],
        );

        let built = req.into_request().unwrap();
        assert_eq!(built.method(), &Method::POST);
        assert_eq!(built.headers()["accept"], "application/json");
        assert_eq!(built.timeout(), Some(&Duration::from_millis(250)));
    }
}
