use std::collections::BTreeMap;

use graphdb_core::security::LoginRequest;
use graphdb_core::{FreeAccess, StringList, User, UserDetails};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;

use crate::client::segment;
use crate::request::{json_body, RequestConfig};
use crate::response::{decode_json, inspect, require_status, ResponseHandlerExt};
use crate::{Client, Result};

pub const PATH_LOGIN: &str = "/rest/login";
pub const PATH_SECURITY: &str = "/rest/security";
pub const PATH_FREE_ACCESS: &str = "/rest/security/free-access";
pub const PATH_USERS: &str = "/rest/security/users";
pub const PATH_CUSTOM_ROLES: &str = "/rest/security/custom-roles";

fn user_path(username: &str) -> String {
    format!("{}/{}", PATH_USERS, segment(username))
}

fn custom_role_path(role: &str) -> String {
    format!("{}/{}", PATH_CUSTOM_ROLES, segment(role))
}

/// Token part of an `authorization: GDB <token>` header
fn gdb_token(header: &str) -> Option<&str> {
    match header.split_once(' ') {
        Some((scheme, token)) if scheme == "GDB" && !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Security toggle, free access, users and custom roles
pub struct SecurityClient<'a> {
    client: &'a Client,
}

impl<'a> SecurityClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn enabled(&self, conf: Vec<RequestConfig>) -> Result<bool> {
        let mut enabled = false;
        let handler = require_status(StatusCode::OK, "security").and(decode_json(&mut enabled).context("security"));
        self.client.get(PATH_SECURITY, handler, conf).await?;
        Ok(enabled)
    }

    pub async fn set_enabled(&self, enabled: bool, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(&enabled));
        let handler = require_status(StatusCode::OK, "security");
        self.client.post(PATH_SECURITY, None, handler, conf).await
    }

    pub async fn free_access(&self, conf: Vec<RequestConfig>) -> Result<FreeAccess> {
        let mut access = FreeAccess::default();
        let handler = require_status(StatusCode::OK, "security/free-access")
            .and(decode_json(&mut access).context("free access"));
        self.client.get(PATH_FREE_ACCESS, handler, conf).await?;
        Ok(access)
    }

    pub async fn configure_free_access(&self, access: &FreeAccess, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(access));
        let handler = require_status(StatusCode::OK, "security/free-access");
        self.client.post(PATH_FREE_ACCESS, None, handler, conf).await
    }

    pub async fn users(&self, conf: Vec<RequestConfig>) -> Result<Vec<User>> {
        let mut users = Vec::new();
        let handler = require_status(StatusCode::OK, "users").and(decode_json(&mut users).context("users"));
        self.client.get(PATH_USERS, handler, conf).await?;
        Ok(users)
    }

    pub async fn user(&self, username: &str, conf: Vec<RequestConfig>) -> Result<User> {
        let mut user = User::default();
        let handler = require_status(StatusCode::OK, "users").and(decode_json(&mut user).context("user"));
        self.client.get(&user_path(username), handler, conf).await?;
        Ok(user)
    }

    pub async fn create_user(&self, user: &User, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(user));
        let handler = require_status(StatusCode::CREATED, "user");
        self.client
            .post(&user_path(&user.username), None, handler, conf)
            .await
    }

    pub async fn update_user(&self, user: &User, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(user));
        let handler = require_status(StatusCode::OK, "user");
        self.client
            .put(&user_path(&user.username), None, handler, conf)
            .await
    }

    /// Update only the workbench settings of a user
    pub async fn update_user_settings(&self, user: &User, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(&user.app_settings));
        let handler = require_status(StatusCode::OK, "users");
        self.client
            .patch(&user_path(&user.username), None, handler, conf)
            .await
    }

    pub async fn delete_user(&self, username: &str, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = require_status(StatusCode::NO_CONTENT, "users");
        self.client
            .delete(&user_path(username), None, handler, conf)
            .await
    }

    /// Log in and obtain a GDB token for [`crate::Auth::Token`].
    ///
    /// The token is empty if the server answered without one.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        mut conf: Vec<RequestConfig>,
    ) -> Result<(String, UserDetails)> {
        conf.push(json_body(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }));

        let mut token = String::new();
        let mut details = UserDetails::default();
        let handler = require_status(StatusCode::OK, "users_login")
            .and(inspect(|resp| {
                if let Some(found) = resp.header(AUTHORIZATION.as_str()).and_then(gdb_token) {
                    token = found.to_string();
                }
                Ok(())
            }))
            .and(decode_json(&mut details).context("user details"));
        self.client.post(PATH_LOGIN, None, handler, conf).await?;

        if token.is_empty() {
            tracing::warn!(username, "login succeeded without a GDB token");
        }
        Ok((token, details))
    }

    /// Custom roles and the users holding each
    pub async fn custom_roles(&self, conf: Vec<RequestConfig>) -> Result<BTreeMap<String, StringList>> {
        let mut roles = BTreeMap::new();
        let handler = require_status(StatusCode::OK, "custom_roles")
            .and(decode_json(&mut roles).context("custom_roles"));
        self.client.get(PATH_CUSTOM_ROLES, handler, conf).await?;
        Ok(roles)
    }

    pub async fn replace_custom_roles(
        &self,
        roles: &BTreeMap<String, Vec<String>>,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(roles));
        let handler = require_status(StatusCode::OK, "custom_roles");
        self.client.put(PATH_CUSTOM_ROLES, None, handler, conf).await
    }

    pub async fn custom_role_users(&self, role: &str, conf: Vec<RequestConfig>) -> Result<Vec<String>> {
        let mut users = Vec::new();
        let handler = require_status(StatusCode::OK, "custom_roles")
            .and(decode_json(&mut users).context("custom_roles"));
        self.client.get(&custom_role_path(role), handler, conf).await?;
        Ok(users)
    }

    pub async fn replace_custom_role_users(
        &self,
        role: &str,
        users: &[String],
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(users));
        let handler = require_status(StatusCode::OK, "custom_roles");
        self.client
            .put(&custom_role_path(role), None, handler, conf)
            .await
    }

    pub async fn add_custom_role_users(
        &self,
        role: &str,
        users: &[String],
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(users));
        let handler = require_status(StatusCode::OK, "custom_roles");
        self.client
            .post(&custom_role_path(role), None, handler, conf)
            .await
    }

    pub async fn remove_custom_role_users(
        &self,
        role: &str,
        users: &[String],
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(users));
        let handler = require_status(StatusCode::OK, "custom_roles");
        self.client
            .delete(&custom_role_path(role), None, handler, conf)
            .await
    }
}
