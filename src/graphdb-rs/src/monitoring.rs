use graphdb_core::monitoring::{
    ClusterStats, InfraStats, PageCacheStats, RecoveryStats, RepositoryStats,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::client::segment;
use crate::request::RequestConfig;
use crate::response::{decode_json, require_status, ResponseHandlerExt};
use crate::{Client, Result};

pub const PATH_MONITOR_STRUCTURES: &str = "/rest/monitor/structures";
pub const PATH_MONITOR_INFRASTRUCTURE: &str = "/rest/monitor/infrastructure";
pub const PATH_MONITOR_CLUSTER: &str = "/rest/monitor/cluster";
pub const PATH_MONITOR_RECOVERY: &str = "/rest/monitor/backup";
pub const PATH_MONITOR_REPOSITORY: &str = "/rest/monitor/repository";

/// Runtime statistics of the server
pub struct MonitoringClient<'a> {
    client: &'a Client,
}

impl<'a> MonitoringClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    async fn stats<T>(&self, path: &str, conf: Vec<RequestConfig>) -> Result<T>
    where
        T: DeserializeOwned + Default + Send,
    {
        let mut stats = T::default();
        let handler = require_status(StatusCode::OK, "stats").and(decode_json(&mut stats).context("stats"));
        self.client.get(path, handler, conf).await?;
        Ok(stats)
    }

    pub async fn page_cache(&self, conf: Vec<RequestConfig>) -> Result<PageCacheStats> {
        self.stats(PATH_MONITOR_STRUCTURES, conf).await
    }

    pub async fn repository(&self, id: &str, conf: Vec<RequestConfig>) -> Result<RepositoryStats> {
        let path = format!("{}/{}", PATH_MONITOR_REPOSITORY, segment(id));
        self.stats(&path, conf).await
    }

    pub async fn infrastructure(&self, conf: Vec<RequestConfig>) -> Result<InfraStats> {
        self.stats(PATH_MONITOR_INFRASTRUCTURE, conf).await
    }

    pub async fn cluster(&self, conf: Vec<RequestConfig>) -> Result<ClusterStats> {
        self.stats(PATH_MONITOR_CLUSTER, conf).await
    }

    /// The backup or restore in progress, `None` when idle
    pub async fn recovery(&self, conf: Vec<RequestConfig>) -> Result<Option<RecoveryStats>> {
        self.stats(PATH_MONITOR_RECOVERY, conf).await
    }
}
