use graphdb_core::ReportStatus;
use reqwest::StatusCode;
use tokio::io::AsyncWrite;

use crate::request::RequestConfig;
use crate::response::{download_to, inspect, read_text, require_status, ResponseHandlerExt};
use crate::{Client, ClientError, Result};

pub const PATH_REPORT: &str = "/rest/report";
pub const PATH_REPORT_STATUS: &str = "/rest/report/status";

pub const DEFAULT_REPORT_FILENAME: &str = "report.zip";

/// The server's diagnostic system report
pub struct ReportClient<'a> {
    client: &'a Client,
}

impl<'a> ReportClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Ask the server to start generating a report. Poll [`Self::status`]
    /// until it is ready.
    pub async fn generate(&self, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = inspect(|resp| {
            if resp.status() == StatusCode::INTERNAL_SERVER_ERROR {
                return Err(ClientError::UnexpectedStatus {
                    context: Some("report".to_string()),
                    expected: vec![StatusCode::OK.as_u16(), StatusCode::ACCEPTED.as_u16()],
                    actual: resp.status().as_u16(),
                    body: String::new(),
                });
            }
            Ok(())
        });
        self.client.post(PATH_REPORT, None, handler, conf).await
    }

    pub async fn status(&self, conf: Vec<RequestConfig>) -> Result<ReportStatus> {
        let mut line = String::new();
        let handler = require_status(StatusCode::OK, "report").and(read_text(&mut line));
        self.client.get(PATH_REPORT_STATUS, handler, conf).await?;
        Ok(ReportStatus::parse(&line))
    }

    /// Stream the generated report into `sink`, returning its filename
    pub async fn download<W>(&self, sink: &mut W, conf: Vec<RequestConfig>) -> Result<String>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut filename = None;
        let handler = require_status(StatusCode::OK, "report").and(download_to(sink, &mut filename));
        self.client.get(PATH_REPORT, handler, conf).await?;
        Ok(filename.unwrap_or_else(|| DEFAULT_REPORT_FILENAME.to_string()))
    }
}
