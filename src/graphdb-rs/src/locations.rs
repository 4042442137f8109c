use graphdb_core::Location;
use reqwest::StatusCode;

use crate::request::{json_body, query, RequestConfig};
use crate::response::{decode_json, require_status, ResponseHandlerExt};
use crate::{Client, Result};

pub const PATH_LOCATIONS: &str = "/rest/locations";

pub struct LocationClient<'a> {
    client: &'a Client,
}

impl<'a> LocationClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, conf: Vec<RequestConfig>) -> Result<Vec<Location>> {
        let mut locations = Vec::new();
        let handler = require_status(StatusCode::OK, "locations")
            .and(decode_json(&mut locations).context("locations"));
        self.client.get(PATH_LOCATIONS, handler, conf).await?;
        Ok(locations)
    }

    pub async fn add(&self, location: &Location, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(location));
        let handler = require_status(StatusCode::OK, "locations");
        self.client.post(PATH_LOCATIONS, None, handler, conf).await
    }

    pub async fn update(&self, location: &Location, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(json_body(location));
        let handler = require_status(StatusCode::OK, "locations");
        self.client.put(PATH_LOCATIONS, None, handler, conf).await
    }

    pub async fn delete(&self, uri: &str, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(query("uri", uri));
        let handler = require_status(StatusCode::OK, "locations");
        self.client.delete(PATH_LOCATIONS, None, handler, conf).await
    }
}
