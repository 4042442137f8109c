use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunable properties of a cluster group
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub election_min_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub election_range_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<u32>,
    #[serde(rename = "messageSizeKB", skip_serializing_if = "Option::is_none")]
    pub message_size_kb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_timeout: Option<u32>,
    #[serde(rename = "transactionLogMaximumSizeGB", skip_serializing_if = "Option::is_none")]
    pub transaction_log_maximum_size_gb: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_update_interval: Option<u32>,
}

/// ClusterConfig is the group configuration: properties plus member nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    #[serde(flatten)]
    pub properties: ClusterProperties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
}

impl ClusterConfig {
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: ClusterProperties::default(),
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RecoveryStatus {
    pub state: RecoveryState,
    pub affected_nodes: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecoveryState {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TopologyStatus {
    pub state: String,
    pub primary_tags: BTreeMap<String, i64>,
    pub primary_index: i64,
    pub primary_leader: String,
}

/// NodeStatus is the view one node has of itself and the group
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStatus {
    pub cluster_enabled: bool,
    pub address: String,
    pub node_state: String,
    pub term: i64,
    pub sync_status: BTreeMap<String, String>,
    pub last_log_term: i64,
    pub last_log_index: i64,
    pub endpoint: String,
    pub recovery_status: RecoveryStatus,
    pub topology_status: TopologyStatus,
}

impl NodeStatus {
    pub fn is_leader(&self) -> bool {
        self.node_state.eq_ignore_ascii_case("LEADER")
    }
}

/// Node membership change request
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceNodesRequest {
    pub add_nodes: Vec<String>,
    pub remove_nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRequest {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryModeRequest {
    pub primary_node: String,
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cluster_config_flattens_properties() {
        let mut config = ClusterConfig::with_nodes(["node-1:7300", "node-2:7300"]);
        config.properties.heartbeat_interval = Some(2000);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({"heartbeatInterval": 2000, "nodes": ["node-1:7300", "node-2:7300"]})
        );

        let back: ClusterConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_node_status_leader() {
        let status: NodeStatus = serde_json::from_value(json!({
            "address": "node-1:7300",
            "nodeState": "LEADER",
            "term": 3,
            "syncStatus": {"node-2:7300": "IN_SYNC"}
        }))
        .unwrap();
        assert!(status.is_leader());
        assert_eq!(status.term, 3);
        assert_eq!(status.sync_status.len(), 1);
    }
}
