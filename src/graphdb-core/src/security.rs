use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User is a workbench account with its granted authorities
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub granted_authorities: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub app_settings: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "is_zero")]
    pub date_created: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gpt_threads: Vec<serde_json::Value>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// UserDetails is what the login endpoint returns about the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserDetails {
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub authorities: Vec<String>,
    pub app_settings: BTreeMap<String, bool>,
    pub external: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// FreeAccess controls what anonymous users may do when security is on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FreeAccess {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub app_settings: BTreeMap<String, bool>,
}

impl FreeAccess {
    /// Grant write access to the given repositories
    pub fn write_repos<I, S>(&mut self, repos: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for repo in repos {
            self.authorities
                .push(format!("WRITE_REPO_{}", repo.as_ref().to_lowercase()));
        }
    }

    /// Grant read access to the given repositories
    pub fn read_repos<I, S>(&mut self, repos: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for repo in repos {
            self.authorities
                .push(format!("READ_REPO_{}", repo.as_ref().to_lowercase()));
        }
    }
}

/// AclScope selects which kind of operation an ACL rule governs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AclScope {
    #[default]
    Statement,
    ClearGraph,
    Plugin,
    System,
}

/// AclRule is one fine-grained access control entry of a repository.
///
/// Only the fields relevant to the rule's scope are serialized: statement
/// rules use subject/predicate/object/context, clear-graph rules use context,
/// plugin rules use plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AclRule {
    pub scope: AclScope,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
}

impl AclRule {
    pub fn system(policy: &str, role: &str, operation: &str) -> Self {
        Self {
            scope: AclScope::System,
            policy: policy.to_string(),
            role: role.to_string(),
            operation: operation.to_string(),
            ..Default::default()
        }
    }

    pub fn statement(policy: &str, role: &str, operation: &str) -> Self {
        Self {
            scope: AclScope::Statement,
            policy: policy.to_string(),
            role: role.to_string(),
            operation: operation.to_string(),
            subject: Some("*".to_string()),
            predicate: Some("*".to_string()),
            object: Some("*".to_string()),
            context: Some("*".to_string()),
            ..Default::default()
        }
    }

    pub fn plugin(policy: &str, role: &str, operation: &str, plugin: &str) -> Self {
        Self {
            scope: AclScope::Plugin,
            policy: policy.to_string(),
            role: role.to_string(),
            operation: operation.to_string(),
            plugin: Some(plugin.to_string()),
            ..Default::default()
        }
    }

    pub fn clear_graph(policy: &str, role: &str, context: &str) -> Self {
        Self {
            scope: AclScope::ClearGraph,
            policy: policy.to_string(),
            role: role.to_string(),
            context: Some(context.to_string()),
            ..Default::default()
        }
    }
}
