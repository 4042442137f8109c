//! The RDF4J protocol endpoints GraphDB serves next to its REST API.

use reqwest::header::LOCATION;
use reqwest::StatusCode;

use crate::client::segment;
use crate::request::{query, RequestConfig};
use crate::response::{inspect, read_text, require_status, ResponseHandlerExt};
use crate::{Client, ClientError, Result};

pub const PATH_PROTOCOL: &str = "/protocol";

fn transactions_path(repo: &str) -> String {
    format!("/repositories/{}/transactions", segment(repo))
}

fn transaction_path(repo: &str, txid: &str) -> String {
    format!("{}/{}", transactions_path(repo), segment(txid))
}

pub struct Rdf4jClient<'a> {
    client: &'a Client,
}

impl<'a> Rdf4jClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Protocol version supported by the server
    pub async fn protocol(&self, conf: Vec<RequestConfig>) -> Result<String> {
        let mut version = String::new();
        let handler = require_status(StatusCode::OK, "rdf4j").and(read_text(&mut version));
        self.client.get(PATH_PROTOCOL, handler, conf).await?;
        Ok(version.trim().to_string())
    }

    /// Start a transaction, returning its id
    pub async fn begin_transaction(&self, repo: &str, conf: Vec<RequestConfig>) -> Result<String> {
        let mut location = String::new();
        let handler = require_status(StatusCode::CREATED, "rdf4j").and(inspect(|resp| {
            location = resp.header(LOCATION.as_str()).unwrap_or_default().to_string();
            Ok(())
        }));
        self.client
            .post(&transactions_path(repo), None, handler, conf)
            .await?;

        transaction_id(&location).ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "transaction location {:?} does not name a transaction",
                location
            ))
        })
    }

    pub async fn commit_transaction(&self, repo: &str, txid: &str, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(query("action", "COMMIT"));
        let handler = require_status(StatusCode::OK, "rdf4j");
        self.client
            .put(&transaction_path(repo, txid), None, handler, conf)
            .await
    }

    pub async fn rollback_transaction(&self, repo: &str, txid: &str, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = require_status(StatusCode::NO_CONTENT, "rdf4j");
        self.client
            .delete(&transaction_path(repo, txid), None, handler, conf)
            .await
    }
}

/// Last path segment of a transaction URL
fn transaction_id(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    let (rest, id) = path.trim_end_matches('/').rsplit_once('/')?;
    if id.is_empty() || !rest.ends_with("/transactions") {
        return None;
    }
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_from_location() {
        assert_eq!(
            transaction_id("http://localhost:7200/repositories/movies/transactions/64a5-9f"),
            Some("64a5-9f".to_string())
        );
        assert_eq!(
            transaction_id("/repositories/movies/transactions/abc/?x=1"),
            Some("abc".to_string())
        );
        assert_eq!(transaction_id(""), None);
        assert_eq!(transaction_id("http://localhost:7200/repositories/movies"), None);
    }
}
