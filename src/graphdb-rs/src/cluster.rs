use std::collections::BTreeMap;
use std::fmt;

use graphdb_core::cluster::{
    ClusterConfig, ClusterProperties, NodeStatus, NodesRequest, ReplaceNodesRequest,
    SecondaryModeRequest, TagRequest,
};
use graphdb_core::Messages;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::request::{json_body, RequestConfig};
use crate::response::{IncomingResponse, ResponseHandler};
use crate::{Client, Result};

pub const PATH_CLUSTER_CONFIG: &str = "/rest/cluster/config";
pub const PATH_CLUSTER_CONFIG_NODES: &str = "/rest/cluster/config/node";
pub const PATH_CLUSTER_NODE_STATUS: &str = "/rest/cluster/node/status";
pub const PATH_CLUSTER_GROUP_STATUS: &str = "/rest/cluster/group/status";
pub const PATH_CLUSTER_TRUNCATE_LOG: &str = "/rest/cluster/truncate-log";
pub const PATH_CLUSTER_TAG: &str = "/rest/cluster/config/tag";
pub const PATH_CLUSTER_SECONDARY_MODE: &str = "/rest/cluster/config/secondary-mode";

/// Cluster operation a [`ClusterError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterOp {
    AddNodes,
    DeleteNodes,
    ReplaceNodes,
    CreateConfig,
    UpdateConfig,
    DeleteConfig,
    GetConfig,
    NodeStatus,
    GroupStatus,
    TruncateLog,
    AddTag,
    RemoveTag,
    EnableSecondary,
    DisableSecondary,
}

impl ClusterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterOp::AddNodes => "cluster_add_node",
            ClusterOp::DeleteNodes => "cluster_delete_node",
            ClusterOp::ReplaceNodes => "cluster_replace_node",
            ClusterOp::CreateConfig => "cluster_create_config",
            ClusterOp::UpdateConfig => "cluster_update_config",
            ClusterOp::DeleteConfig => "cluster_delete_config",
            ClusterOp::GetConfig => "cluster_get_config",
            ClusterOp::NodeStatus => "cluster_node_status",
            ClusterOp::GroupStatus => "cluster_group_status",
            ClusterOp::TruncateLog => "cluster_truncate_log",
            ClusterOp::AddTag => "cluster_add_tag",
            ClusterOp::RemoveTag => "cluster_remove_tag",
            ClusterOp::EnableSecondary => "cluster_enable_secondary",
            ClusterOp::DisableSecondary => "cluster_disable_secondary",
        }
    }
}

impl fmt::Display for ClusterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster operation the server refused, or whose answer could not be read.
///
/// `messages` holds what the server said; it is a list for some operations
/// and a node-to-message mapping for others. When the payload could not be
/// decoded, `source` holds the decode error and `messages` is empty.
#[derive(Debug, thiserror::Error)]
#[error("{}", describe(.op, .status, .messages, .source))]
pub struct ClusterError {
    pub op: ClusterOp,
    pub status: u16,
    pub messages: Messages,
    #[source]
    pub source: Option<serde_json::Error>,
}

fn describe(
    op: &ClusterOp,
    status: &u16,
    messages: &Messages,
    source: &Option<serde_json::Error>,
) -> String {
    match source {
        Some(source) => format!("{}: {}", op, source),
        None if messages.is_empty() => format!("{}: status {}", op, status),
        None => format!("{}: status {}: {}", op, status, messages),
    }
}

/// Messages of a cluster error payload.
///
/// The payload is either `{"messages": ...}` or the messages value itself;
/// either way the value is decoded as a list first, then as a mapping.
pub fn decode_messages(body: &[u8]) -> std::result::Result<Messages, serde_json::Error> {
    let value: Value = serde_json::from_slice(body)?;
    let value = match value {
        Value::Object(mut envelope) => match envelope.remove("messages") {
            Some(inner @ (Value::Array(_) | Value::Object(_))) => inner,
            Some(other) => {
                envelope.insert("messages".to_string(), other);
                Value::Object(envelope)
            }
            None => Value::Object(envelope),
        },
        other => other,
    };
    Messages::from_value(value)
}

/// Decodes the payload on the success status, a [`ClusterError`] otherwise
pub struct ClusterHandler<'a, T> {
    op: ClusterOp,
    ok: StatusCode,
    target: Option<&'a mut T>,
}

pub fn cluster_response<T>(op: ClusterOp, ok: StatusCode, target: &mut T) -> ClusterHandler<'_, T>
where
    T: DeserializeOwned + Send,
{
    ClusterHandler {
        op,
        ok,
        target: Some(target),
    }
}

/// Only checks the status; the success body is ignored
pub fn cluster_status(op: ClusterOp, ok: StatusCode) -> ClusterHandler<'static, ()> {
    ClusterHandler {
        op,
        ok,
        target: None,
    }
}

#[async_trait::async_trait]
impl<'a, T: DeserializeOwned + Send> ResponseHandler for ClusterHandler<'a, T> {
    async fn handle(&mut self, resp: &mut IncomingResponse) -> Result<()> {
        let status = resp.status();

        if status == self.ok {
            if let Some(target) = self.target.as_deref_mut() {
                let body = resp.bytes().await?;
                *target = serde_json::from_slice(&body).map_err(|e| ClusterError {
                    op: self.op,
                    status: status.as_u16(),
                    messages: Messages::default(),
                    source: Some(e),
                })?;
            }
            return Ok(());
        }

        let body = resp.bytes().await?;
        let mut err = ClusterError {
            op: self.op,
            status: status.as_u16(),
            messages: Messages::default(),
            source: None,
        };
        match decode_messages(&body) {
            Ok(messages) => err.messages = messages,
            Err(e) => err.source = Some(e),
        }
        tracing::debug!(op = %self.op, status = status.as_u16(), "cluster operation failed");
        Err(err.into())
    }
}

/// Cluster group management
pub struct ClusterClient<'a> {
    client: &'a Client,
}

impl<'a> ClusterClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn config(&self, conf: Vec<RequestConfig>) -> Result<ClusterConfig> {
        let mut config = ClusterConfig::default();
        let handler = cluster_response(ClusterOp::GetConfig, StatusCode::OK, &mut config);
        self.client.get(PATH_CLUSTER_CONFIG, handler, conf).await?;
        Ok(config)
    }

    /// Create the cluster group. Returns the per-node outcome messages.
    pub async fn create(
        &self,
        config: &ClusterConfig,
        mut conf: Vec<RequestConfig>,
    ) -> Result<BTreeMap<String, String>> {
        conf.push(json_body(config));
        let mut messages = BTreeMap::new();
        let handler = cluster_response(ClusterOp::CreateConfig, StatusCode::CREATED, &mut messages);
        self.client.post(PATH_CLUSTER_CONFIG, None, handler, conf).await?;
        Ok(messages)
    }

    pub async fn update(
        &self,
        properties: &ClusterProperties,
        mut conf: Vec<RequestConfig>,
    ) -> Result<ClusterConfig> {
        conf.push(json_body(properties));
        let mut config = ClusterConfig::default();
        let handler = cluster_response(ClusterOp::UpdateConfig, StatusCode::OK, &mut config);
        self.client.patch(PATH_CLUSTER_CONFIG, None, handler, conf).await?;
        Ok(config)
    }

    pub async fn delete(&self, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = cluster_status(ClusterOp::DeleteConfig, StatusCode::OK);
        self.client.delete(PATH_CLUSTER_CONFIG, None, handler, conf).await
    }

    pub async fn add_nodes(
        &self,
        nodes: &[String],
        mut conf: Vec<RequestConfig>,
    ) -> Result<BTreeMap<String, String>> {
        conf.push(json_body(&NodesRequest {
            nodes: nodes.to_vec(),
        }));
        let mut messages = BTreeMap::new();
        let handler = cluster_response(ClusterOp::AddNodes, StatusCode::OK, &mut messages);
        self.client.post(PATH_CLUSTER_CONFIG_NODES, None, handler, conf).await?;
        Ok(messages)
    }

    pub async fn delete_nodes(
        &self,
        nodes: &[String],
        mut conf: Vec<RequestConfig>,
    ) -> Result<BTreeMap<String, String>> {
        conf.push(json_body(&NodesRequest {
            nodes: nodes.to_vec(),
        }));
        let mut messages = BTreeMap::new();
        let handler = cluster_response(ClusterOp::DeleteNodes, StatusCode::OK, &mut messages);
        self.client.delete(PATH_CLUSTER_CONFIG_NODES, None, handler, conf).await?;
        Ok(messages)
    }

    pub async fn replace_nodes(
        &self,
        add: &[String],
        remove: &[String],
        mut conf: Vec<RequestConfig>,
    ) -> Result<BTreeMap<String, String>> {
        conf.push(json_body(&ReplaceNodesRequest {
            add_nodes: add.to_vec(),
            remove_nodes: remove.to_vec(),
        }));
        let mut messages = BTreeMap::new();
        let handler = cluster_response(ClusterOp::ReplaceNodes, StatusCode::OK, &mut messages);
        self.client.patch(PATH_CLUSTER_CONFIG_NODES, None, handler, conf).await?;
        Ok(messages)
    }

    /// Status of the node the client is connected to
    pub async fn node_status(&self, conf: Vec<RequestConfig>) -> Result<NodeStatus> {
        let mut status = NodeStatus::default();
        let handler = cluster_response(ClusterOp::NodeStatus, StatusCode::OK, &mut status);
        self.client.get(PATH_CLUSTER_NODE_STATUS, handler, conf).await?;
        Ok(status)
    }

    /// Status of every node in the group
    pub async fn status(&self, conf: Vec<RequestConfig>) -> Result<Vec<NodeStatus>> {
        let mut status = Vec::new();
        let handler = cluster_response(ClusterOp::GroupStatus, StatusCode::OK, &mut status);
        self.client.get(PATH_CLUSTER_GROUP_STATUS, handler, conf).await?;
        Ok(status)
    }

    pub async fn truncate_log(&self, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = cluster_status(ClusterOp::TruncateLog, StatusCode::OK);
        self.client.post(PATH_CLUSTER_TRUNCATE_LOG, None, handler, conf).await
    }

    pub async fn add_tag(&self, tag: &str, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(&TagRequest {
            tag: tag.to_string(),
        }));
        let handler = cluster_status(ClusterOp::AddTag, StatusCode::OK);
        self.client.post(PATH_CLUSTER_TAG, None, handler, conf).await
    }

    pub async fn remove_tag(&self, tag: &str, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(&TagRequest {
            tag: tag.to_string(),
        }));
        let handler = cluster_status(ClusterOp::RemoveTag, StatusCode::OK);
        self.client.delete(PATH_CLUSTER_TAG, None, handler, conf).await
    }

    /// Turn this group into a secondary replicating from `primary`
    pub async fn enable_secondary_mode(
        &self,
        primary: &str,
        tag: &str,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(&SecondaryModeRequest {
            primary_node: primary.to_string(),
            tag: tag.to_string(),
        }));
        let handler = cluster_status(ClusterOp::EnableSecondary, StatusCode::OK);
        self.client.post(PATH_CLUSTER_SECONDARY_MODE, None, handler, conf).await
    }

    pub async fn disable_secondary_mode(&self, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = cluster_status(ClusterOp::DisableSecondary, StatusCode::OK);
        self.client.delete(PATH_CLUSTER_SECONDARY_MODE, None, handler, conf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;

    fn response(status: StatusCode, body: &'static str) -> IncomingResponse {
        IncomingResponse::from_parts(
            status,
            HeaderMap::new(),
            futures::stream::iter(vec![Ok(Bytes::from_static(body.as_bytes()))]),
        )
    }

    async fn fail(op: ClusterOp, body: &'static str) -> ClusterError {
        let mut resp = response(StatusCode::BAD_REQUEST, body);
        let err = cluster_status(op, StatusCode::OK)
            .handle(&mut resp)
            .await
            .unwrap_err();
        match err {
            ClientError::Cluster(e) => e,
            other => panic!("expected a cluster error, got {other}"),
        }
    }

    #[test]
    fn test_decode_messages_shapes() {
        let list = decode_messages(br#"{"messages": ["a", "b"]}"#).unwrap();
        assert_eq!(list.list(), ["a".to_string(), "b".to_string()]);
        assert!(list.map().is_empty());

        let map = decode_messages(br#"{"messages": {"k": "v"}}"#).unwrap();
        assert!(map.list().is_empty());
        assert_eq!(map.map().get("k").map(String::as_str), Some("v"));

        let bare = decode_messages(br#"{"node-1:7300": "unreachable"}"#).unwrap();
        assert_eq!(bare.map().len(), 1);

        let single = decode_messages(br#""only one""#).unwrap();
        assert_eq!(single.list(), ["only one".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_carries_op_and_messages() {
        let err = fail(ClusterOp::AddNodes, r#"{"messages": ["node-3 is unreachable"]}"#).await;
        assert_eq!(err.op, ClusterOp::AddNodes);
        assert_eq!(err.status, 400);
        assert!(err.messages.is_list());
        assert!(err.source.is_none());
        assert_eq!(
            err.to_string(),
            "cluster_add_node: status 400: node-3 is unreachable"
        );
    }

    #[tokio::test]
    async fn test_failure_with_mapping_messages() {
        let err = fail(ClusterOp::CreateConfig, r#"{"messages": {"node-2:7300": "busy"}}"#).await;
        assert!(err.messages.is_map());
        assert_eq!(err.messages.map()["node-2:7300"], "busy");
    }

    #[tokio::test]
    async fn test_unparsable_failure_keeps_decode_error() {
        let err = fail(ClusterOp::TruncateLog, "<html>gateway timeout</html>").await;
        assert!(err.messages.is_empty());
        assert!(err.source.is_some());
        assert!(err.to_string().starts_with("cluster_truncate_log: "));

        let wrong_shape = fail(ClusterOp::AddTag, r#"{"messages": {"k": 1}}"#).await;
        assert!(wrong_shape.source.is_some());
    }

    #[tokio::test]
    async fn test_success_decodes_target() {
        let mut resp = response(StatusCode::OK, r#"[{"address": "node-1:7300", "nodeState": "LEADER"}]"#);
        let mut nodes: Vec<NodeStatus> = Vec::new();
        cluster_response(ClusterOp::GroupStatus, StatusCode::OK, &mut nodes)
            .handle(&mut resp)
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_leader());

        let mut resp = response(StatusCode::OK, "not json");
        let mut config = ClusterConfig::default();
        let err = cluster_response(ClusterOp::GetConfig, StatusCode::OK, &mut config)
            .handle(&mut resp)
            .await
            .unwrap_err();
        assert!(err.as_cluster().is_some_and(|e| e.source.is_some()));
    }
}
