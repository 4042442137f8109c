//! Response handling.
//!
//! A [`ResponseHandler`] gets exclusive access to the response for the time
//! it runs. Handlers are built from small pieces and chained with
//! [`ResponseHandlerExt::and`]: the chain stops at the first handler that
//! fails and returns that error. The executor drains whatever body is left
//! once the handler returns.

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{ClientError, Result};

pub use crate::disposition::filename_from_disposition;

/// A received response whose body is read on demand
pub struct IncomingResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl IncomingResponse {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        Self {
            status,
            headers,
            body: response.bytes_stream().boxed(),
        }
    }

    /// Build a response from parts, for exercising handlers without a server
    pub fn from_parts<S>(status: StatusCode, headers: HeaderMap, body: S) -> Self
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    {
        Self {
            status,
            headers,
            body: body.boxed(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Filename suggested by the `Content-Disposition` header
    pub fn filename(&self) -> Option<String> {
        self.headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
    }

    /// Next chunk of the body, `None` once it is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.body.next().await.transpose()?)
    }

    /// The rest of the body
    pub async fn bytes(&mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// The rest of the body as text, invalid UTF-8 replaced
    pub async fn text(&mut self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decode the rest of the body as JSON
    pub async fn json<T: DeserializeOwned>(&mut self, context: &str) -> Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            context: context.to_string(),
            source,
        })
    }

    /// Stream the rest of the body into `sink`, returning the byte count
    pub async fn copy_to<W>(&mut self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }

    /// Read and discard the rest of the body. Errors are ignored since the
    /// outcome of the call is already decided.
    pub(crate) async fn drain(&mut self) -> u64 {
        let mut discarded = 0u64;
        while let Some(Ok(chunk)) = self.body.next().await {
            discarded += chunk.len() as u64;
        }
        discarded
    }
}

impl std::fmt::Debug for IncomingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Interprets a response: checks status, decodes, or streams the body
#[async_trait::async_trait]
pub trait ResponseHandler: Send {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()>;
}

#[async_trait::async_trait]
impl<H: ResponseHandler + ?Sized> ResponseHandler for Box<H> {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        (**self).handle(resp).await
    }
}

/// Runs handlers in order, stopping at the first failure
#[derive(Default)]
pub struct Combined<'a> {
    handlers: Vec<Box<dyn ResponseHandler + 'a>>,
}

impl<'a> Combined<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the chain
    pub fn and<H: ResponseHandler + 'a>(mut self, handler: H) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait::async_trait]
impl<'a> ResponseHandler for Combined<'a> {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        for handler in &mut self.handlers {
            handler.handle(resp).await?;
        }
        Ok(())
    }
}

pub fn combined<'a>(handlers: Vec<Box<dyn ResponseHandler + 'a>>) -> Combined<'a> {
    Combined { handlers }
}

pub trait ResponseHandlerExt: ResponseHandler + Sized {
    /// Run `next` after this handler succeeds
    fn and<'a, H: ResponseHandler + 'a>(self, next: H) -> Combined<'a>
    where
        Self: 'a,
    {
        Combined::new().and(self).and(next)
    }
}

impl<T: ResponseHandler + Sized> ResponseHandlerExt for T {}

/// Fails unless the status is one of the expected codes. The body is left
/// untouched.
#[derive(Debug, Clone)]
pub struct ExpectStatus {
    expected: Vec<StatusCode>,
}

pub fn expect_status(code: StatusCode) -> ExpectStatus {
    ExpectStatus {
        expected: vec![code],
    }
}

pub fn expect_one_of_status(codes: &[StatusCode]) -> ExpectStatus {
    ExpectStatus {
        expected: codes.to_vec(),
    }
}

#[async_trait::async_trait]
impl ResponseHandler for ExpectStatus {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        if self.expected.contains(&resp.status()) {
            return Ok(());
        }
        Err(ClientError::UnexpectedStatus {
            context: None,
            expected: self.expected.iter().map(StatusCode::as_u16).collect(),
            actual: resp.status().as_u16(),
            body: String::new(),
        })
    }
}

/// Like [`ExpectStatus`], but a mismatch reads the body into the error and
/// names the operation
#[derive(Debug, Clone)]
pub struct RequireStatus {
    expected: Vec<StatusCode>,
    context: String,
}

pub fn require_status(code: StatusCode, context: impl Into<String>) -> RequireStatus {
    RequireStatus {
        expected: vec![code],
        context: context.into(),
    }
}

pub fn require_one_of_status(codes: &[StatusCode], context: impl Into<String>) -> RequireStatus {
    RequireStatus {
        expected: codes.to_vec(),
        context: context.into(),
    }
}

#[async_trait::async_trait]
impl ResponseHandler for RequireStatus {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        if self.expected.contains(&resp.status()) {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::UnexpectedStatus {
            context: Some(self.context.clone()),
            expected: self.expected.iter().map(StatusCode::as_u16).collect(),
            actual: resp.status().as_u16(),
            body,
        })
    }
}

/// Decodes the body as JSON into the caller's value
pub struct DecodeJson<'a, T> {
    target: &'a mut T,
    context: &'static str,
}

pub fn decode_json<T: DeserializeOwned + Send>(target: &mut T) -> DecodeJson<'_, T> {
    DecodeJson {
        target,
        context: "json",
    }
}

impl<T> DecodeJson<'_, T> {
    /// Name the payload in decode errors
    pub fn context(mut self, context: &'static str) -> Self {
        self.context = context;
        self
    }
}

#[async_trait::async_trait]
impl<'a, T: DeserializeOwned + Send> ResponseHandler for DecodeJson<'a, T> {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        *self.target = resp.json(self.context).await?;
        Ok(())
    }
}

/// Reads the body as text into the caller's string
pub struct ReadText<'a> {
    target: &'a mut String,
}

pub fn read_text(target: &mut String) -> ReadText<'_> {
    ReadText { target }
}

#[async_trait::async_trait]
impl<'a> ResponseHandler for ReadText<'a> {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        *self.target = resp.text().await?;
        Ok(())
    }
}

/// Streams the body into a writer, chunk by chunk
pub struct WriteBody<'a, W: ?Sized> {
    sink: &'a mut W,
    filename: Option<&'a mut Option<String>>,
}

pub fn write_body_to<W>(sink: &mut W) -> WriteBody<'_, W>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    WriteBody {
        sink,
        filename: None,
    }
}

/// Streams the body into a writer and records the suggested filename
pub fn download_to<'a, W>(sink: &'a mut W, filename: &'a mut Option<String>) -> WriteBody<'a, W>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    WriteBody {
        sink,
        filename: Some(filename),
    }
}

#[async_trait::async_trait]
impl<'a, W> ResponseHandler for WriteBody<'a, W>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        if let Some(filename) = self.filename.as_deref_mut() {
            *filename = resp.filename();
        }
        let written = resp.copy_to(&mut *self.sink).await?;
        tracing::debug!(bytes = written, "response body streamed");
        Ok(())
    }
}

/// Runs a synchronous check against status and headers
pub struct Inspect<F> {
    f: F,
}

pub fn inspect<F>(f: F) -> Inspect<F>
where
    F: FnMut(&IncomingResponse) -> Result<()> + Send,
{
    Inspect { f }
}

#[async_trait::async_trait]
impl<F> ResponseHandler for Inspect<F>
where
    F: FnMut(&IncomingResponse) -> Result<()> + Send,
{
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        (self.f)(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde::Deserialize;

    fn response(status: StatusCode, body: &'static str) -> IncomingResponse {
        let chunks: Vec<reqwest::Result<Bytes>> = body
            .as_bytes()
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        IncomingResponse::from_parts(status, HeaderMap::new(), futures::stream::iter(chunks))
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Size {
        total: i64,
    }

    #[tokio::test]
    async fn test_chain_decodes_on_expected_status() {
        let mut resp = response(StatusCode::OK, r#"{"total": 42}"#);
        let mut size = Size::default();

        expect_status(StatusCode::OK)
            .and(decode_json(&mut size))
            .handle(&mut resp)
            .await
            .unwrap();

        assert_eq!(size, Size { total: 42 });
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_failure() {
        let mut resp = response(StatusCode::OK, "body");
        let mut ran = false;

        let err = expect_status(StatusCode::CREATED)
            .and(inspect(|_| {
                ran = true;
                Ok(())
            }))
            .handle(&mut resp)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::UnexpectedStatus { ref expected, actual: 200, .. } if expected == &[201]
        ));
        assert!(!ran);
        // ExpectStatus leaves the body for the executor to drain
        assert_eq!(resp.text().await.unwrap(), "body");
    }

    #[tokio::test]
    async fn test_require_status_reads_body() {
        let mut resp = response(StatusCode::BAD_REQUEST, "repository exists");
        let err = require_one_of_status(&[StatusCode::OK, StatusCode::CREATED], "repo")
            .handle(&mut resp)
            .await
            .unwrap_err();

        match err {
            ClientError::UnexpectedStatus {
                context,
                expected,
                actual,
                body,
            } => {
                assert_eq!(context.as_deref(), Some("repo"));
                assert_eq!(expected, vec![200, 201]);
                assert_eq!(actual, 400);
                assert_eq!(body, "repository exists");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported() {
        let mut resp = response(StatusCode::OK, "not json");
        let mut size = Size::default();

        let err = decode_json(&mut size)
            .context("size")
            .handle(&mut resp)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref context, .. } if context == "size"));
    }

    #[tokio::test]
    async fn test_combined_runs_all_in_order() {
        let mut resp = response(StatusCode::OK, "READY|1|");
        let mut order = Vec::new();
        let mut text = String::new();

        let mut handler = combined(vec![
            Box::new(inspect(|_| {
                order.push("inspect");
                Ok(())
            })),
            Box::new(read_text(&mut text)),
        ]);
        assert_eq!(handler.len(), 2);
        handler.handle(&mut resp).await.unwrap();
        drop(handler);

        assert_eq!(order, vec!["inspect"]);
        assert_eq!(text, "READY|1|");
    }

    #[tokio::test]
    async fn test_download_records_filename() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"backup.tar\""),
        );
        let mut resp = IncomingResponse::from_parts(
            StatusCode::OK,
            headers,
            futures::stream::iter(vec![
                Ok(Bytes::from_static(b"abc")),
                Ok(Bytes::from_static(b"def")),
            ]),
        );

        let mut sink = Vec::new();
        let mut filename = None;
        download_to(&mut sink, &mut filename)
            .handle(&mut resp)
            .await
            .unwrap();

        assert_eq!(sink, b"abcdef");
        assert_eq!(filename.as_deref(), Some("backup.tar"));
    }

    #[tokio::test]
    async fn test_drain_discards_rest() {
        let mut resp = response(StatusCode::OK, "0123456789");
        assert_eq!(resp.chunk().await.unwrap().as_deref(), Some(b"0123".as_slice()));
        assert_eq!(resp.drain().await, 6);
        assert!(resp.chunk().await.unwrap().is_none());
    }
}
