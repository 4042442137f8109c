use std::fmt;
use std::time::Duration;

use graphdb_core::ClientConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::AUTHORIZATION;
use reqwest::{Body, Client as HttpClient, Method, RequestBuilder, StatusCode};
use url::Url;

use crate::acl::AclClient;
use crate::backup::BackupClient;
use crate::cluster::ClusterClient;
use crate::info::InfoClient;
use crate::locations::LocationClient;
use crate::monitoring::MonitoringClient;
use crate::rdf4j::Rdf4jClient;
use crate::report::ReportClient;
use crate::repository::RepositoryClient;
use crate::request::{OutgoingRequest, RequestConfig};
use crate::response::{IncomingResponse, ResponseHandler};
use crate::saved_queries::SavedQueryClient;
use crate::security::SecurityClient;
use crate::{ClientError, Result};

/// Characters escaped when an identifier is placed in a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub(crate) fn segment(id: &str) -> String {
    utf8_percent_encode(id, PATH_SEGMENT).to_string()
}

/// Credentials attached to every request, after all request configs ran
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Basic { username: String, password: String },
    /// Token issued by the login endpoint, sent as `GDB <token>`
    Token(String),
}

impl Auth {
    fn decorate(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Token(token) => builder.header(AUTHORIZATION, format!("GDB {}", token)),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Auth::Token(_) => f.debug_tuple("Token").field(&"***").finish(),
        }
    }
}

/// GraphDB REST API Client
#[derive(Clone)]
pub struct Client {
    base_url: String,
    http: HttpClient,
    auth: Option<Auth>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client connected to the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            http: HttpClient::new(),
            auth: None,
        }
    }

    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Build a client from file-based configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new(&config.url)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .danger_accept_invalid_certs(config.insecure_skip_verify);

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        if !config.user_agent.is_empty() {
            builder = builder.user_agent(&config.user_agent);
        }
        if !config.ca_cert_path.is_empty() {
            let pem = std::fs::read(&config.ca_cert_path)?;
            builder = builder.add_root_certificate_pem(&pem)?;
        }
        if config.has_basic_auth() {
            builder = builder.basic_auth(&config.username, &config.password);
        } else if config.has_token() {
            builder = builder.token_auth(&config.token);
        }

        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Same connection pool, different credentials
    pub fn with_auth(&self, auth: Auth) -> Self {
        Self {
            auth: Some(auth),
            ..self.clone()
        }
    }

    pub fn repositories(&self) -> RepositoryClient<'_> {
        RepositoryClient::new(self)
    }

    pub fn acl(&self) -> AclClient<'_> {
        AclClient::new(self)
    }

    pub fn backups(&self) -> BackupClient<'_> {
        BackupClient::new(self)
    }

    pub fn cluster(&self) -> ClusterClient<'_> {
        ClusterClient::new(self)
    }

    pub fn security(&self) -> SecurityClient<'_> {
        SecurityClient::new(self)
    }

    pub fn report(&self) -> ReportClient<'_> {
        ReportClient::new(self)
    }

    pub fn locations(&self) -> LocationClient<'_> {
        LocationClient::new(self)
    }

    pub fn monitoring(&self) -> MonitoringClient<'_> {
        MonitoringClient::new(self)
    }

    pub fn saved_queries(&self) -> SavedQueryClient<'_> {
        SavedQueryClient::new(self)
    }

    pub fn info(&self) -> InfoClient<'_> {
        InfoClient::new(self)
    }

    pub fn rdf4j(&self) -> Rdf4jClient<'_> {
        Rdf4jClient::new(self)
    }

    /// Perform one HTTP exchange.
    ///
    /// The request is built from `method`, the base URL joined with `path`,
    /// and `body`, then every config is applied in order and credentials are
    /// attached last. 404, 401 and 403 are reported as [`ClientError::NotFound`],
    /// [`ClientError::Unauthorized`] and [`ClientError::Forbidden`] without
    /// consulting the handler. Any other status goes to `handler`, whose
    /// result is returned. The response body is drained and closed in every
    /// case before this returns.
    ///
    /// Dropping the returned future cancels the exchange.
    pub async fn execute<H>(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        mut handler: H,
        conf: Vec<RequestConfig>,
    ) -> Result<()>
    where
        H: ResponseHandler,
    {
        let url = Url::parse(&format!("{}{}", self.base_url, path))?;
        let mut request = OutgoingRequest::new(method, url);
        request.set_body(body);
        for config in conf {
            config.apply(&mut request);
        }

        let request = self.authorize(request)?;
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!(error = %e, path, "request failed");
            ClientError::Transport(e)
        })?;

        let mut response = IncomingResponse::new(response);
        let status = response.status();
        tracing::debug!(status = status.as_u16(), path, "response received");

        let rejected = match status {
            StatusCode::NOT_FOUND => Some(ClientError::NotFound),
            StatusCode::UNAUTHORIZED => Some(ClientError::Unauthorized),
            StatusCode::FORBIDDEN => Some(ClientError::Forbidden),
            _ => None,
        };
        let result = match rejected {
            Some(err) => {
                tracing::debug!(status = status.as_u16(), path, "request rejected");
                Err(err)
            }
            None => handler.handle(&mut response).await,
        };

        let drained = response.drain().await;
        tracing::trace!(drained, "response body drained");
        result
    }

    fn authorize(&self, request: OutgoingRequest) -> Result<reqwest::Request> {
        let mut request = request.into_request()?;
        let Some(auth) = &self.auth else {
            return Ok(request);
        };

        request.headers_mut().remove(AUTHORIZATION);
        let builder = RequestBuilder::from_parts(self.http.clone(), request);
        Ok(auth.decorate(builder).build()?)
    }

    pub(crate) async fn get<H: ResponseHandler>(
        &self,
        path: &str,
        handler: H,
        conf: Vec<RequestConfig>,
    ) -> Result<()> {
        self.execute(Method::GET, path, None, handler, conf).await
    }

    pub(crate) async fn post<H: ResponseHandler>(
        &self,
        path: &str,
        body: Option<Body>,
        handler: H,
        conf: Vec<RequestConfig>,
    ) -> Result<()> {
        self.execute(Method::POST, path, body, handler, conf).await
    }

    pub(crate) async fn put<H: ResponseHandler>(
        &self,
        path: &str,
        body: Option<Body>,
        handler: H,
        conf: Vec<RequestConfig>,
    ) -> Result<()> {
        self.execute(Method::PUT, path, body, handler, conf).await
    }

    pub(crate) async fn patch<H: ResponseHandler>(
        &self,
        path: &str,
        body: Option<Body>,
        handler: H,
        conf: Vec<RequestConfig>,
    ) -> Result<()> {
        self.execute(Method::PATCH, path, body, handler, conf).await
    }

    pub(crate) async fn delete<H: ResponseHandler>(
        &self,
        path: &str,
        body: Option<Body>,
        handler: H,
        conf: Vec<RequestConfig>,
    ) -> Result<()> {
        self.execute(Method::DELETE, path, body, handler, conf).await
    }
}

fn trim_base(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

/// Builder for [`Client`].
///
/// Timeouts and TLS settings only apply to the HTTP client the builder
/// creates; an injected client is used as-is.
pub struct ClientBuilder {
    base_url: String,
    http: Option<HttpClient>,
    auth: Option<Auth>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    accept_invalid_certs: bool,
    root_certificates: Vec<reqwest::Certificate>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("root_certificates", &self.root_certificates.len())
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: None,
            auth: None,
            timeout: None,
            connect_timeout: None,
            user_agent: None,
            accept_invalid_certs: false,
            root_certificates: Vec::new(),
        }
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Auth::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn token_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::Token(token.into()));
        self
    }

    /// Send requests through this HTTP client instead of a new one
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Deadline for a whole exchange, including reading the body
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn add_root_certificate_pem(mut self, pem: &[u8]) -> Result<Self> {
        let cert = reqwest::Certificate::from_pem(pem)
            .map_err(|e| ClientError::Configuration(format!("invalid CA certificate: {}", e)))?;
        self.root_certificates.push(cert);
        Ok(self)
    }

    pub fn build(self) -> Result<Client> {
        Url::parse(&self.base_url)?;

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = HttpClient::builder()
                    .danger_accept_invalid_certs(self.accept_invalid_certs);
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                if let Some(user_agent) = self.user_agent {
                    builder = builder.user_agent(user_agent);
                }
                for cert in self.root_certificates {
                    builder = builder.add_root_certificate(cert);
                }
                builder
                    .build()
                    .map_err(|e| ClientError::Configuration(e.to_string()))?
            }
        };

        Ok(Client {
            base_url: trim_base(self.base_url),
            http,
            auth: self.auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Client::new("http://localhost:7200/");
        assert_eq!(client.base_url(), "http://localhost:7200");
        assert!(client.auth().is_none());
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = Client::builder("not a url").build().unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_auth_debug_hides_secrets() {
        let auth = Auth::Basic {
            username: "admin".to_string(),
            password: "root".to_string(),
        };
        let shown = format!("{:?}", auth);
        assert!(shown.contains("admin"));
        assert!(!shown.contains("root"));
        assert!(!format!("{:?}", Auth::Token("secret".into())).contains("secret"));
    }

    #[test]
    fn test_from_config_picks_auth() {
        let mut config = ClientConfig {
            url: "http://graphdb:7200".to_string(),
            token: "abc".to_string(),
            ..Default::default()
        };
        let client = Client::from_config(&config).unwrap();
        assert_eq!(client.auth(), Some(&Auth::Token("abc".to_string())));

        config.username = "admin".to_string();
        config.password = "root".to_string();
        let client = Client::from_config(&config).unwrap();
        assert!(matches!(client.auth(), Some(Auth::Basic { username, .. }) if username == "admin"));
    }

    #[test]
    fn test_from_config_missing_ca_file() {
        let config = ClientConfig {
            ca_cert_path: "/nonexistent/ca.pem".to_string(),
            ..Default::default()
        };
        assert!(matches!(Client::from_config(&config), Err(ClientError::Io(_))));
    }

    #[test]
    fn test_segment_escaping() {
        assert_eq!(segment("movies"), "movies");
        assert_eq!(segment("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(segment("user@example.com"), "user@example.com");
    }

    #[tokio::test]
    async fn test_deferred_config_error_skips_network() {
        // Nothing listens on port 9; reaching the network would be a transport error
        let client = Client::new("http://127.0.0.1:9");
        let err = client
            .execute(
                Method::GET,
                "/rest/repositories",
                None,
                crate::response::expect_status(StatusCode::OK),
                vec![crate::request::header("bad header", "x")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader { .. }));
    }
}
