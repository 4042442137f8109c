use graphdb_core::SavedQuery;
use reqwest::StatusCode;

use crate::request::{json_body, query, RequestConfig};
use crate::response::{decode_json, require_status, ResponseHandlerExt};
use crate::{Client, Result};

pub const PATH_SAVED_QUERIES: &str = "/rest/sparql/saved-queries";

/// SPARQL queries saved in the workbench
pub struct SavedQueryClient<'a> {
    client: &'a Client,
}

impl<'a> SavedQueryClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, conf: Vec<RequestConfig>) -> Result<Vec<SavedQuery>> {
        let mut queries = Vec::new();
        let handler = require_status(StatusCode::OK, "saved_queries")
            .and(decode_json(&mut queries).context("saved_queries"));
        self.client.get(PATH_SAVED_QUERIES, handler, conf).await?;
        Ok(queries)
    }

    pub async fn create(&self, saved: &SavedQuery, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(saved));
        let handler = require_status(StatusCode::CREATED, "saved_queries");
        self.client.post(PATH_SAVED_QUERIES, None, handler, conf).await
    }

    /// Replace the query saved as `old_name`; renaming is allowed
    pub async fn update(&self, old_name: &str, saved: &SavedQuery, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(query("oldQueryName", old_name));
        conf.push(json_body(saved));
        let handler = require_status(StatusCode::OK, "saved_queries");
        self.client.put(PATH_SAVED_QUERIES, None, handler, conf).await
    }

    pub async fn delete(&self, name: &str, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(query("name", name));
        let handler = require_status(StatusCode::OK, "saved_queries");
        self.client.delete(PATH_SAVED_QUERIES, None, handler, conf).await
    }
}
