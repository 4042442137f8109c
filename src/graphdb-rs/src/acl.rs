use graphdb_core::AclRule;
use reqwest::StatusCode;

use crate::client::segment;
use crate::request::{json_body, RequestConfig};
use crate::response::{decode_json, require_status, ResponseHandlerExt};
use crate::{Client, Result};

fn acl_path(repo: &str) -> String {
    format!("/rest/repositories/{}/acl", segment(repo))
}

/// Fine-grained access control rules of a repository
pub struct AclClient<'a> {
    client: &'a Client,
}

impl<'a> AclClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, repo: &str, conf: Vec<RequestConfig>) -> Result<Vec<AclRule>> {
        let mut rules = Vec::new();
        let handler = require_status(StatusCode::OK, "acl").and(decode_json(&mut rules).context("acl"));
        self.client.get(&acl_path(repo), handler, conf).await?;
        Ok(rules)
    }

    /// Append rules to the repository's list
    pub async fn add(&self, repo: &str, rules: &[AclRule], mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(rules));
        let handler = require_status(StatusCode::CREATED, "acl");
        self.client.post(&acl_path(repo), None, handler, conf).await
    }

    /// Replace the whole list
    pub async fn replace(&self, repo: &str, rules: &[AclRule], mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(rules));
        let handler = require_status(StatusCode::OK, "acl");
        self.client.put(&acl_path(repo), None, handler, conf).await
    }

    pub async fn delete(&self, repo: &str, rules: &[AclRule], mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(rules));
        let handler = require_status(StatusCode::NO_CONTENT, "acl");
        self.client.delete(&acl_path(repo), None, handler, conf).await
    }
}
