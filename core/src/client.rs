//! The Posterous API facade.
//!
//! # Design
//! Every API method is an entry in the `method` table, and all of them run
//! through one engine, `ApiClient::call`:
//!
//! 1. refuse posting methods when no credentials are set (no I/O happens),
//! 2. drop any argument the method does not whitelist,
//! 3. form-encode the rest into a POST body,
//! 4. hand the request to the `Transport`,
//! 5. interpret the `<rsp stat="...">` envelope.
//!
//! Steps 1–3 are `build_request` and step 5 is `parse_response`; both are
//! public so a caller can run the HTTP round-trip itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::config::{ClientConfig, Credentials};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::method::{self, MethodSpec};
use crate::params::{self, Params};
use crate::response;
use crate::transport::{Transport, UreqTransport};
use crate::xml::Document;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Blocking client for the Posterous API.
///
/// Credentials can be replaced at any time through the setters. A call
/// borrows the client immutably, so the credentials it sends cannot change
/// underneath it.
#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    config: ClientConfig,
    credentials: Credentials,
    transport: T,
}

impl ApiClient<UreqTransport> {
    /// Anonymous client against the public Posterous endpoint.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::builder().credentials(username, password).build()
    }

    /// Configuration and credentials taken from `POSTEROUS_*` environment
    /// variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let config = ClientConfig::from_env()?;
        let transport = UreqTransport::new(&config);
        Ok(Self::with_transport(config, Credentials::from_env(), transport))
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }
}

impl Default for ApiClient<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, credentials: Credentials, transport: T) -> Self {
        Self {
            config,
            credentials,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.username()
    }

    pub fn password(&self) -> Option<&str> {
        self.credentials.password()
    }

    /// Replace the username; an empty value leaves the current one in place.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.credentials.set_username(username);
    }

    /// Replace the password; an empty value leaves the current one in place.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.credentials.set_password(password);
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Build the POST for `spec` without sending it.
    ///
    /// Fails with `AuthenticationRequired` for posting methods when the
    /// client has no credentials. Arguments outside the method's whitelist
    /// are dropped.
    pub fn build_request(&self, spec: &MethodSpec, args: &Params) -> Result<HttpRequest, ApiError> {
        let authenticated = self.credentials.is_authenticated();
        if spec.requires_auth && !authenticated {
            return Err(ApiError::AuthenticationRequired { method: spec.name });
        }

        let params = params::validate(args, spec.params);
        let body = params::encode(&params);
        debug!(
            method = spec.name,
            sent = params.len(),
            dropped = args.len() - params.len(),
            authenticated,
            "building request"
        );

        let mut headers = vec![("User-Agent".to_string(), self.config.user_agent.clone())];
        if let (true, Some(user), Some(pass)) = (
            authenticated,
            self.credentials.username(),
            self.credentials.password(),
        ) {
            let token = STANDARD.encode(format!("{user}:{pass}"));
            headers.push(("Authorization".to_string(), format!("Basic {token}")));
        }
        let body = if body.is_empty() {
            None
        } else {
            headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            Some(body)
        };

        Ok(HttpRequest {
            url: self.config.method_url(spec.name)?,
            headers,
            body,
        })
    }

    /// Interpret a response body. The HTTP status is ignored; only the
    /// envelope decides the outcome.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Document, ApiError> {
        debug!(status = response.status, "parsing response");
        response::parse(&response.body)
    }

    /// Run `spec` with `args`: build, send, parse.
    pub fn call(&self, spec: &MethodSpec, args: &Params) -> Result<Document, ApiError> {
        let request = self.build_request(spec, args)?;
        let response = self.transport.execute(&request)?;
        self.parse_response(response)
    }

    /// Sites the authenticated user can post to.
    pub fn get_sites(&self) -> Result<Document, ApiError> {
        self.call(&method::GET_SITES, &Params::new())
    }

    pub fn read_posts(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::READ_POSTS, args)
    }

    pub fn get_tags(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::GET_TAGS, args)
    }

    /// Requires credentials.
    pub fn new_post(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::NEW_POST, args)
    }

    /// Requires credentials.
    pub fn update_post(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::UPDATE_POST, args)
    }

    pub fn new_comment(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::NEW_COMMENT, args)
    }

    /// Look up a post by its Post.ly short code.
    pub fn get_post(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::GET_POST, args)
    }

    /// Twitter-style media upload; the account is passed as `username` and
    /// `password` arguments rather than Basic auth.
    pub fn upload(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::UPLOAD, args)
    }

    pub fn upload_and_post(&self, args: &Params) -> Result<Document, ApiError> {
        self.call(&method::UPLOAD_AND_POST, args)
    }
}

/// Builder for `ApiClient`.
#[derive(Debug, Clone, Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    credentials: Credentials,
}

impl ApiClientBuilder {
    /// Point the client at another endpoint, e.g. a local mock server.
    pub fn base_url(mut self, url: &str) -> Result<Self, ApiError> {
        self.config.set_base_url(url)?;
        Ok(self)
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ApiClient<UreqTransport> {
        let transport = UreqTransport::new(&self.config);
        ApiClient::with_transport(self.config, self.credentials, transport)
    }

    pub fn build_with_transport<T: Transport>(self, transport: T) -> ApiClient<T> {
        ApiClient::with_transport(self.config, self.credentials, transport)
    }
}
