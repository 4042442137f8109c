use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageCacheStats {
    #[serde(rename = "cacheHit")]
    pub hits: i64,
    #[serde(rename = "cacheMiss")]
    pub misses: i64,
}

impl PageCacheStats {
    /// Fraction of page lookups served from the cache, 0.0 when idle
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryStats {
    pub queries: QueryStats,
    pub entity_pool: EntityPoolStats,
    pub active_transactions: i64,
    pub open_connections: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryStats {
    pub slow: i64,
    pub suboptimal: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntityPoolStats {
    #[serde(rename = "epoolReads")]
    pub reads: i64,
    #[serde(rename = "epoolWrites")]
    pub writes: i64,
    #[serde(rename = "epoolSize")]
    pub size: i64,
}

/// InfraStats is the JVM and host view of a node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InfraStats {
    #[serde(rename = "heapMemoryUsage")]
    pub heap: MemoryStats,
    #[serde(rename = "nonHeapMemoryUsage")]
    pub off_heap: MemoryStats,
    #[serde(rename = "storageMemory")]
    pub disk: DiskStats,
    pub thread_count: i64,
    pub cpu_load: f64,
    pub class_count: i64,
    pub gc_count: i64,
    pub open_file_descriptors: i64,
    pub max_file_descriptors: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryStats {
    pub max: i64,
    pub committed: i64,
    pub init: i64,
    pub used: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DiskStats {
    pub data_dir_used: i64,
    pub work_dir_used: i64,
    pub logs_dir_used: i64,
    pub data_dir_free: i64,
    pub work_dir_free: i64,
    pub logs_dir_free: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterStats {
    pub term: i64,
    #[serde(rename = "failureRecoveriesCount")]
    pub failed_recoveries: i64,
    #[serde(rename = "failedTransactionsCount")]
    pub failed_transactions: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeStats {
    #[serde(rename = "nodesInCluster")]
    pub total: i64,
    #[serde(rename = "nodesInSync")]
    pub in_sync: i64,
    #[serde(rename = "nodesOutOfSync")]
    pub out_of_sync: i64,
    #[serde(rename = "nodesDisconnected")]
    pub disconnected: i64,
    #[serde(rename = "nodesSyncing")]
    pub syncing: i64,
}

/// RecoveryStats describes the backup or restore currently running, if any
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RecoveryStats {
    pub id: String,
    pub username: String,
    pub operation: String,
    pub affected_repositories: Vec<String>,
    #[serde(rename = "msSinceCreated")]
    pub running_for_ms: i64,
    #[serde(rename = "nodePerformingClusterBackup")]
    pub node: String,
    #[serde(rename = "snapshotOptions")]
    pub options: RecoveryConfigStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RecoveryConfigStats {
    pub with_repository_data: bool,
    pub with_system_data: bool,
    pub clean_data_dir: bool,
    pub repositories: Vec<String>,
}
