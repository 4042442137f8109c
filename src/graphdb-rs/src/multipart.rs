//! Streaming `multipart/form-data` bodies.
//!
//! Parts are written by a producer task into a channel with room for a single
//! chunk, and the request body reads from the other end. Neither side holds
//! more than one chunk, so arbitrarily large part sources are uploaded in
//! bounded memory. If a part source fails, the error is handed to the body
//! reader and the request fails; if the request is dropped, the producer
//! stops at its next send.
//!
//! The producer is started on the first poll of the body, so building and
//! applying a [`multipart_form_data`] config needs no runtime.

use std::fmt;
use std::io;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{FutureExt, Stream};
use percent_encoding::{utf8_percent_encode, AsciiSet};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Body;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::request::{RequestConfig, CONTENT_TYPE_JSON};
use crate::Result;

pub const DEFAULT_PART_CONTENT_TYPE: &str = "application/octet-stream";

const CHUNK_SIZE: usize = 32 * 1024;

/// Characters that would end a quoted header parameter or the header line
const PARAM_ESCAPE: &AsciiSet = &AsciiSet::EMPTY.add(b'"').add(b'\r').add(b'\n');

/// One field of a multipart form
pub struct Part {
    key: String,
    filename: Option<String>,
    content_type: Option<String>,
    value: Box<dyn AsyncRead + Send + Unpin>,
}

impl Part {
    pub fn new<R>(key: impl Into<String>, value: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            key: key.into(),
            filename: None,
            content_type: None,
            value: Box::new(value),
        }
    }

    /// A part backed by an in-memory buffer
    pub fn bytes(key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(key, io::Cursor::new(data.into()))
    }

    /// A part holding `value` encoded as JSON
    pub fn json<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Result<Self> {
        let data = serde_json::to_vec(value)?;
        Ok(Self::bytes(key, data).content_type(CONTENT_TYPE_JSON))
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn file_name(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn mime(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or(DEFAULT_PART_CONTENT_TYPE)
    }

    fn head(&self, boundary: &str, first: bool) -> io::Result<String> {
        let mime = self.mime();
        if HeaderValue::from_str(mime).is_err() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("multipart part {:?}: invalid content type {:?}", self.key, mime),
            ));
        }

        let mut head = String::new();
        if !first {
            head.push_str("\r\n");
        }
        head.push_str(&format!("--{}\r\n", boundary));
        head.push_str(&format!(
            "content-disposition: form-data; name=\"{}\"",
            escape_param(&self.key)
        ));
        if let Some(filename) = &self.filename {
            head.push_str(&format!("; filename=\"{}\"", escape_param(filename)));
        }
        head.push_str(&format!("\r\ncontent-type: {}\r\n\r\n", mime));
        Ok(head)
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("key", &self.key)
            .field("filename", &self.filename)
            .field("content_type", &self.mime())
            .finish_non_exhaustive()
    }
}

fn escape_param(s: &str) -> String {
    utf8_percent_encode(s, PARAM_ESCAPE).to_string()
}

/// The encoded form as a stream of chunks
pub struct MultipartBody {
    boundary: String,
    rx: mpsc::Receiver<io::Result<Bytes>>,
    pending: Mutex<Option<(Vec<Part>, mpsc::Sender<io::Result<Bytes>>)>>,
}

impl MultipartBody {
    /// Encode `parts` with a fresh random boundary
    pub fn new(parts: Vec<Part>) -> Self {
        Self::with_boundary(parts, uuid::Uuid::new_v4().simple().to_string())
    }

    /// Encode `parts` with the given boundary.
    ///
    /// Nothing runs until the body is first polled, which must happen inside
    /// a tokio runtime.
    pub fn with_boundary(parts: Vec<Part>, boundary: String) -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            boundary,
            rx,
            pending: Mutex::new(Some((parts, tx))),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

impl Stream for MultipartBody {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let pending = this
            .pending
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some((parts, tx)) = pending {
            tokio::spawn(produce(parts, this.boundary.clone(), tx));
        }
        this.rx.poll_recv(cx)
    }
}

impl fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("boundary", &self.boundary)
            .finish_non_exhaustive()
    }
}

/// Send `parts` as a streaming `multipart/form-data` body.
///
/// The producer starts when the transport first reads the body, so the config
/// can be built and applied anywhere.
pub fn multipart_form_data(parts: Vec<Part>) -> RequestConfig {
    RequestConfig::new(move |req| {
        let body = MultipartBody::new(parts);
        req.set_header(CONTENT_TYPE.as_str(), &body.content_type());
        req.set_body(Some(Body::wrap_stream(body)));
    })
}

enum Abort {
    /// The body reader went away
    Closed,
    Io(io::Error),
}

async fn produce(parts: Vec<Part>, boundary: String, tx: mpsc::Sender<io::Result<Bytes>>) {
    let outcome = AssertUnwindSafe(write_parts(parts, &boundary, &tx))
        .catch_unwind()
        .await;

    let err = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(Abort::Closed)) => {
            tracing::debug!("multipart body dropped before it was fully written");
            return;
        }
        Ok(Err(Abort::Io(e))) => e,
        Err(_) => io::Error::other("multipart producer panicked"),
    };

    tracing::warn!(error = %err, "aborting multipart body");
    let _ = tx.send(Err(err)).await;
}

async fn write_parts(
    parts: Vec<Part>,
    boundary: &str,
    tx: &mpsc::Sender<io::Result<Bytes>>,
) -> std::result::Result<(), Abort> {
    let empty = parts.is_empty();
    let mut buf = vec![0u8; CHUNK_SIZE];

    for (i, mut part) in parts.into_iter().enumerate() {
        let head = part.head(boundary, i == 0).map_err(Abort::Io)?;
        send(tx, Bytes::from(head)).await?;

        let mut written = 0u64;
        loop {
            let n = part.value.read(&mut buf).await.map_err(|e| {
                Abort::Io(io::Error::new(
                    e.kind(),
                    format!("multipart part {:?}: {}", part.key, e),
                ))
            })?;
            if n == 0 {
                break;
            }
            written += n as u64;
            send(tx, Bytes::copy_from_slice(&buf[..n])).await?;
        }
        tracing::trace!(key = %part.key, bytes = written, "multipart part written");
    }

    let tail = if empty {
        format!("--{}--\r\n", boundary)
    } else {
        format!("\r\n--{}--\r\n", boundary)
    };
    send(tx, Bytes::from(tail)).await
}

async fn send(
    tx: &mpsc::Sender<io::Result<Bytes>>,
    chunk: Bytes,
) -> std::result::Result<(), Abort> {
    tx.send(Ok(chunk)).await.map_err(|_| Abort::Closed)
}
