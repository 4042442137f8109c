use std::collections::BTreeMap;

use graphdb_core::{
    ImportSettings, RepositoryConfig, RepositoryInfo, RepositorySize, ServerImportRequest,
    SparqlTemplate, SqlView,
};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::io::AsyncWrite;

use crate::client::segment;
use crate::request::{body, header, json_body, query, RequestConfig, CONTENT_TYPE_TEXT};
use crate::response::{
    decode_json, expect_one_of_status, expect_status, require_one_of_status, require_status,
    write_body_to, ResponseHandlerExt,
};
use crate::{Client, Result};

pub const PATH_REPOSITORIES: &str = "/rest/repositories";
pub const PATH_SQL_VIEWS: &str = "/rest/sql-views/tables";

/// Header selecting the repository for SQL view endpoints
pub const HEADER_REPOSITORY: &str = "x-graphdb-repository";

fn repository_path(id: &str, rest: &str) -> String {
    format!("{}/{}{}", PATH_REPOSITORIES, segment(id), rest)
}

fn sql_view_path(name: &str) -> String {
    format!("{}/{}", PATH_SQL_VIEWS, segment(name))
}

/// Repository management, server-side imports, SPARQL templates and SQL views
pub struct RepositoryClient<'a> {
    client: &'a Client,
}

impl<'a> RepositoryClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn infos(&self, conf: Vec<RequestConfig>) -> Result<Vec<RepositoryInfo>> {
        let mut infos = Vec::new();
        let handler = expect_status(StatusCode::OK).and(decode_json(&mut infos).context("repositories"));
        self.client.get(PATH_REPOSITORIES, handler, conf).await?;
        Ok(infos)
    }

    pub async fn size(&self, id: &str, conf: Vec<RequestConfig>) -> Result<RepositorySize> {
        let mut size = RepositorySize::default();
        let handler = expect_status(StatusCode::OK).and(decode_json(&mut size).context("repository size"));
        self.client
            .get(&repository_path(id, "/size"), handler, conf)
            .await?;
        Ok(size)
    }

    /// Create a repository from a body config, either a multipart config
    /// file or JSON. The body config runs before `conf`.
    pub async fn create(&self, body: RequestConfig, conf: Vec<RequestConfig>) -> Result<()> {
        let mut all = Vec::with_capacity(conf.len() + 1);
        all.push(body);
        all.extend(conf);
        let handler = require_status(StatusCode::CREATED, "repo");
        self.client.post(PATH_REPOSITORIES, None, handler, all).await
    }

    pub async fn create_from_config(
        &self,
        config: &RepositoryConfig,
        conf: Vec<RequestConfig>,
    ) -> Result<()> {
        self.create(json_body(config), conf).await
    }

    pub async fn edit(
        &self,
        id: &str,
        config: &RepositoryConfig,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(config));
        let handler = require_one_of_status(&[StatusCode::OK, StatusCode::CREATED], "repo");
        self.client
            .put(&repository_path(id, ""), None, handler, conf)
            .await
    }

    pub async fn delete(&self, id: &str, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = expect_status(StatusCode::OK);
        self.client
            .delete(&repository_path(id, ""), None, handler, conf)
            .await
    }

    pub async fn restart(&self, id: &str, conf: Vec<RequestConfig>) -> Result<()> {
        let handler = expect_one_of_status(&[StatusCode::OK, StatusCode::ACCEPTED]);
        self.client
            .post(&repository_path(id, "/restart"), None, handler, conf)
            .await
    }

    /// Files in the server's import directory, with their import state
    pub async fn server_files(&self, id: &str, conf: Vec<RequestConfig>) -> Result<Vec<ImportSettings>> {
        let mut files = Vec::new();
        let handler = require_status(StatusCode::OK, "import server")
            .and(decode_json(&mut files).context("import server"));
        self.client
            .get(&repository_path(id, "/import/server"), handler, conf)
            .await?;
        Ok(files)
    }

    pub async fn import_server_files(
        &self,
        id: &str,
        files: &[String],
        settings: &ImportSettings,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(&ServerImportRequest {
            file_names: files.to_vec(),
            import_settings: settings.clone(),
        }));
        let handler = require_status(StatusCode::ACCEPTED, "import server");
        self.client
            .post(&repository_path(id, "/import/server"), None, handler, conf)
            .await
    }

    pub async fn cancel_server_file(
        &self,
        id: &str,
        file: &str,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(query("name", file));
        let handler = require_status(StatusCode::ACCEPTED, "import server");
        self.client
            .delete(&repository_path(id, "/import/server"), None, handler, conf)
            .await
    }

    /// Template ids of the repository
    pub async fn sparql_templates(&self, repo: &str, conf: Vec<RequestConfig>) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let handler = require_status(StatusCode::OK, "sparql_templates")
            .and(decode_json(&mut ids).context("sparql_templates"));
        self.client
            .get(&repository_path(repo, "/sparql-templates"), handler, conf)
            .await?;
        Ok(ids)
    }

    pub async fn create_sparql_template(
        &self,
        repo: &str,
        template: &SparqlTemplate,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(json_body(template));
        let handler = require_status(StatusCode::CREATED, "sparql_templates");
        self.client
            .post(&repository_path(repo, "/sparql-templates"), None, handler, conf)
            .await
    }

    /// Replace the query of an existing template
    pub async fn update_sparql_template(
        &self,
        repo: &str,
        template: &SparqlTemplate,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(query("templateID", &template.id));
        conf.push(body(CONTENT_TYPE_TEXT, template.query.clone()));
        let handler = require_status(StatusCode::OK, "sparql_templates");
        self.client
            .put(&repository_path(repo, "/sparql-templates"), None, handler, conf)
            .await
    }

    pub async fn delete_sparql_template(
        &self,
        repo: &str,
        template_id: &str,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()> {
        conf.push(query("templateID", template_id));
        let handler = require_status(StatusCode::NO_CONTENT, "sparql_templates");
        self.client
            .delete(&repository_path(repo, "/sparql-templates"), None, handler, conf)
            .await
    }

    /// Execute a template with bindings, streaming the query result into `sink`
    pub async fn run_sparql_template<W>(
        &self,
        repo: &str,
        params: &BTreeMap<String, Value>,
        sink: &mut W,
        mut conf: Vec<RequestConfig>,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        conf.push(json_body(params));
        let handler = require_status(StatusCode::OK, "sparql_templates").and(write_body_to(sink));
        self.client
            .post(
                &repository_path(repo, "/sparql-templates/execute"),
                None,
                handler,
                conf,
            )
            .await
    }

    pub async fn sparql_template(
        &self,
        repo: &str,
        template_id: &str,
        mut conf: Vec<RequestConfig>,
    ) -> Result<SparqlTemplate> {
        conf.push(query("templateID", template_id));
        let mut template = SparqlTemplate::default();
        let handler = require_status(StatusCode::OK, "sparql_templates")
            .and(decode_json(&mut template).context("sparql_templates"));
        self.client
            .get(
                &repository_path(repo, "/sparql-templates/configuration"),
                handler,
                conf,
            )
            .await?;
        Ok(template)
    }

    /// Names of the SQL views defined on the repository
    pub async fn sql_views(&self, repo: &str, mut conf: Vec<RequestConfig>) -> Result<Vec<String>> {
        conf.push(header(HEADER_REPOSITORY, repo));
        let mut names = Vec::new();
        let handler = require_status(StatusCode::OK, "sql_views")
            .and(decode_json(&mut names).context("sql_views"));
        self.client.get(PATH_SQL_VIEWS, handler, conf).await?;
        Ok(names)
    }

    pub async fn sql_view(&self, repo: &str, name: &str, mut conf: Vec<RequestConfig>) -> Result<SqlView> {
        conf.push(header(HEADER_REPOSITORY, repo));
        let mut view = SqlView::default();
        let handler = require_status(StatusCode::OK, "sql_views")
            .and(decode_json(&mut view).context("sql_views"));
        self.client.get(&sql_view_path(name), handler, conf).await?;
        Ok(view)
    }

    pub async fn create_sql_view(&self, repo: &str, view: &SqlView, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(header(HEADER_REPOSITORY, repo));
        conf.push(json_body(view));
        let handler = require_status(StatusCode::CREATED, "sql_views");
        self.client.post(PATH_SQL_VIEWS, None, handler, conf).await
    }

    pub async fn update_sql_view(&self, repo: &str, view: &SqlView, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(header(HEADER_REPOSITORY, repo));
        conf.push(json_body(view));
        let handler = require_status(StatusCode::OK, "sql_views");
        self.client
            .put(&sql_view_path(&view.name), None, handler, conf)
            .await
    }

    pub async fn delete_sql_view(&self, repo: &str, name: &str, mut conf: Vec<RequestConfig>) -> Result<()> {
        conf.push(header(HEADER_REPOSITORY, repo));
        let handler = require_status(StatusCode::NO_CONTENT, "sql_views");
        self.client.delete(&sql_view_path(name), None, handler, conf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_paths() {
        assert_eq!(repository_path("movies", ""), "/rest/repositories/movies");
        assert_eq!(
            repository_path("movies", "/sparql-templates/execute"),
            "/rest/repositories/movies/sparql-templates/execute"
        );
        assert_eq!(sql_view_path("my view"), "/rest/sql-views/tables/my%20view");
    }
}
