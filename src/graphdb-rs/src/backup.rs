//! Backup and restore.
//!
//! Local backups are streamed from the server straight into a caller-supplied
//! writer, and restores stream the archive from a caller-supplied reader as a
//! multipart upload, so neither is ever held in memory.

use graphdb_core::{BackupOptions, RestoreOptions};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::multipart::{multipart_form_data, Part};
use crate::request::{header, RequestConfig, CONTENT_TYPE_JSON};
use crate::response::{download_to, expect_status, ResponseHandlerExt};
use crate::{Client, ClientError, Result};

pub const PATH_BACKUP: &str = "/rest/recovery/backup";
pub const PATH_BACKUP_CLOUD: &str = "/rest/recovery/cloud-backup";
pub const PATH_RESTORE: &str = "/rest/recovery/restore";
pub const PATH_RESTORE_CLOUD: &str = "/rest/recovery/cloud-restore";

/// Name used when the server does not suggest one
pub const DEFAULT_BACKUP_FILENAME: &str = "backup.tar";

pub struct BackupClient<'a> {
    client: &'a Client,
}

impl<'a> BackupClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a backup and stream the archive into `sink`.
    ///
    /// Returns the archive's filename as suggested by the server.
    pub async fn create<W>(
        &self,
        opts: &BackupOptions,
        sink: &mut W,
        mut conf: Vec<RequestConfig>,
    ) -> Result<String>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        if !opts.bucket_uri.is_empty() {
            return Err(ClientError::InvalidRequest(
                "backup with a bucket URI goes to cloud storage, use create_cloud".to_string(),
            ));
        }

        let body = serde_json::to_vec(opts)?;
        conf.push(header(ACCEPT.as_str(), CONTENT_TYPE_JSON));
        conf.push(header(CONTENT_TYPE.as_str(), CONTENT_TYPE_JSON));

        let mut filename = None;
        let handler = expect_status(StatusCode::OK).and(download_to(sink, &mut filename));
        self.client
            .post(PATH_BACKUP, Some(body.into()), handler, conf)
            .await?;

        Ok(filename.unwrap_or_else(|| DEFAULT_BACKUP_FILENAME.to_string()))
    }

    /// Create a backup and have the server upload it to `opts.bucket_uri`
    pub async fn create_cloud(&self, opts: &BackupOptions, mut conf: Vec<RequestConfig>) -> Result<()> {
        if opts.bucket_uri.is_empty() {
            return Err(ClientError::InvalidRequest(
                "cloud backup requires a bucket URI".to_string(),
            ));
        }

        conf.push(header(ACCEPT.as_str(), CONTENT_TYPE_JSON));
        conf.push(multipart_form_data(vec![Part::json("params", opts)?]));
        self.client
            .post(PATH_BACKUP_CLOUD, None, expect_status(StatusCode::OK), conf)
            .await
    }

    /// Restore from a backup archive read from `archive`
    pub async fn restore<R>(&self, opts: &RestoreOptions, archive: R, mut conf: Vec<RequestConfig>) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        if !opts.bucket_uri.is_empty() {
            return Err(ClientError::InvalidRequest(
                "restore with a bucket URI reads from cloud storage, use restore_cloud".to_string(),
            ));
        }

        conf.push(multipart_form_data(vec![
            Part::json("params", opts)?,
            Part::new("file", archive).filename(DEFAULT_BACKUP_FILENAME),
        ]));
        self.client
            .post(PATH_RESTORE, None, expect_status(StatusCode::OK), conf)
            .await
    }

    /// Restore from the archive at `opts.bucket_uri`
    pub async fn restore_cloud(&self, opts: &RestoreOptions, mut conf: Vec<RequestConfig>) -> Result<()> {
        if opts.bucket_uri.is_empty() {
            return Err(ClientError::InvalidRequest(
                "cloud restore requires a bucket URI".to_string(),
            ));
        }

        conf.push(multipart_form_data(vec![Part::json("params", opts)?]));
        self.client
            .post(PATH_RESTORE_CLOUD, None, expect_status(StatusCode::OK), conf)
            .await
    }
}
