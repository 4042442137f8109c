use graphdb_core::{LicenseInfo, VersionInfo};
use reqwest::StatusCode;

use crate::request::RequestConfig;
use crate::response::{decode_json, require_status, ResponseHandlerExt};
use crate::{Client, Result};

pub const PATH_VERSION: &str = "/rest/info/version";
pub const PATH_LICENSE: &str = "/rest/graphdb-settings/license";

pub struct InfoClient<'a> {
    client: &'a Client,
}

impl<'a> InfoClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn version(&self, conf: Vec<RequestConfig>) -> Result<VersionInfo> {
        let mut version = VersionInfo::default();
        let handler = require_status(StatusCode::OK, "info")
            .and(decode_json(&mut version).context("version info"));
        self.client.get(PATH_VERSION, handler, conf).await?;
        Ok(version)
    }

    pub async fn license(&self, conf: Vec<RequestConfig>) -> Result<LicenseInfo> {
        let mut license = LicenseInfo::default();
        let handler = require_status(StatusCode::OK, "info")
            .and(decode_json(&mut license).context("license info"));
        self.client.get(PATH_LICENSE, handler, conf).await?;
        Ok(license)
    }
}
