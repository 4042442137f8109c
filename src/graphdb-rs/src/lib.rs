//! GraphDB Client Library
//!
//! HTTP client for the GraphDB REST API. Every endpoint goes through a single
//! executor ([`Client::execute`]) and is assembled from small composable
//! pieces:
//! - [`RequestConfig`] values that mutate the outgoing request in order
//! - [`ResponseHandler`] values that check, decode, or stream the response
//! - a streaming multipart encoder for uploads
//! - a uniform error classification ([`ClientError`])

mod client;
pub mod cluster;
mod disposition;
pub mod multipart;
pub mod request;
pub mod response;

pub mod acl;
pub mod backup;
pub mod info;
pub mod locations;
pub mod monitoring;
pub mod rdf4j;
pub mod report;
pub mod repository;
pub mod saved_queries;
pub mod security;

pub use client::{Auth, Client, ClientBuilder};
pub use cluster::{ClusterError, ClusterOp};
pub use multipart::Part;
pub use request::{OutgoingRequest, RequestConfig};
pub use response::{IncomingResponse, ResponseHandler, ResponseHandlerExt};

pub use graphdb_core::*;
pub use reqwest::{Method, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{}", describe_status(.context, .expected, .actual, .body))]
    UnexpectedStatus {
        context: Option<String>,
        expected: Vec<u16>,
        actual: u16,
        body: String,
    },

    #[error("Failed to decode {context} response: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The HTTP status the server answered with, when the error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::NotFound => Some(404),
            ClientError::Unauthorized => Some(401),
            ClientError::Forbidden => Some(403),
            ClientError::UnexpectedStatus { actual, .. } => Some(*actual),
            ClientError::Cluster(e) => Some(e.status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// The structured cluster failure, if this is one
    pub fn as_cluster(&self) -> Option<&ClusterError> {
        match self {
            ClientError::Cluster(e) => Some(e),
            _ => None,
        }
    }
}

fn describe_status(context: &Option<String>, expected: &[u16], actual: &u16, body: &str) -> String {
    let expectation = match expected {
        [single] => format!("expected status code {} but got {}", single, actual),
        many => format!("expected one of {:?} status codes but got {}", many, actual),
    };
    match (context, body.trim()) {
        (Some(context), "") => format!("{}: {}", context, expectation),
        (Some(context), body) => format!("{}: {}: {}", context, expectation, body),
        (None, "") => expectation,
        (None, body) => format!("{}: {}", expectation, body),
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
