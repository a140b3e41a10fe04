//! Client configuration and account credentials.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

/// Base endpoint every method name is appended to.
pub const DEFAULT_BASE_URL: &str = "http://posterous.com/api/";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_USER_AGENT: &str = concat!("posterous-core/", env!("CARGO_PKG_VERSION"));

/// Posterous account credentials used for HTTP Basic authentication.
///
/// Either half may be unset. They are never checked against the service;
/// `is_authenticated` only reports whether both are present.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut creds = Self::default();
        creds.set_username(username);
        creds.set_password(password);
        creds
    }

    /// Read `POSTEROUS_USERNAME` and `POSTEROUS_PASSWORD`; missing variables
    /// leave the corresponding half unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut creds = Self::default();
        if let Some(user) = lookup("POSTEROUS_USERNAME") {
            creds.set_username(user);
        }
        if let Some(pass) = lookup("POSTEROUS_PASSWORD") {
            creds.set_password(pass);
        }
        creds
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Replace the username. Empty values are ignored.
    pub fn set_username(&mut self, username: impl Into<String>) {
        let username = username.into();
        if !username.is_empty() {
            self.username = Some(username);
        }
    }

    /// Replace the password. Empty values are ignored.
    pub fn set_password(&mut self, password: impl Into<String>) {
        let password = password.into();
        if !password.is_empty() {
            self.password = Some(password);
        }
    }

    /// Both username and password are set and non-empty.
    pub fn is_authenticated(&self) -> bool {
        matches!((&self.username, &self.password), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Endpoint and transport settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Always ends with `/`; only settable through `set_base_url`.
    base_url: Url,
    pub connect_timeout: Duration,
    /// Upper bound on the whole request, including reading the body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `POSTEROUS_API_URL`,
    /// `POSTEROUS_CONNECT_TIMEOUT_SECS` and `POSTEROUS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(url) = lookup("POSTEROUS_API_URL") {
            config.set_base_url(&url)?;
        }
        if let Some(secs) = lookup("POSTEROUS_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("POSTEROUS_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("POSTEROUS_TIMEOUT_SECS") {
            config.timeout = parse_secs("POSTEROUS_TIMEOUT_SECS", &secs)?;
        }
        Ok(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn set_base_url(&mut self, raw: &str) -> Result<(), ApiError> {
        self.base_url = parse_base_url(raw)?;
        Ok(())
    }

    /// Full URL for `method`.
    pub fn method_url(&self, method: &str) -> Result<String, ApiError> {
        self.base_url
            .join(method)
            .map(String::from)
            .map_err(|e| ApiError::Config(format!("cannot join method {method:?}: {e}")))
    }
}

/// Parse a base endpoint, making sure it ends with `/` so method names land
/// beneath it rather than replacing its last segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw).map_err(|e| ApiError::Config(format!("invalid base URL {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::Config(format!("base URL {raw:?} cannot have paths")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_secs(var: &str, raw: &str) -> Result<Duration, ApiError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ApiError::Config(format!("{var}={raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_both_halves() {
        assert!(!Credentials::default().is_authenticated());
        let mut creds = Credentials::default();
        creds.set_username("alice");
        assert!(!creds.is_authenticated());
        creds.set_password("s3cret");
        assert!(creds.is_authenticated());
    }

    #[test]
    fn empty_values_do_not_replace_credentials() {
        let mut creds = Credentials::new("alice", "s3cret");
        creds.set_username("");
        creds.set_password("");
        assert_eq!(creds.username(), Some("alice"));
        assert_eq!(creds.password(), Some("s3cret"));
        creds.set_username("bob");
        assert_eq!(creds.username(), Some("bob"));
    }

    #[test]
    fn empty_constructor_values_stay_unset() {
        let creds = Credentials::new("", "");
        assert_eq!(creds.username(), None);
        assert!(!creds.is_authenticated());
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "s3cret"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn default_config_targets_posterous() {
        let config = ClientConfig::default();
        assert_eq!(config.method_url("getsites").unwrap(), "http://posterous.com/api/getsites");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.user_agent.starts_with("posterous-core/"));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = parse_base_url("http://127.0.0.1:3000/api").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/");
    }

    #[test]
    fn directly_configured_base_url_keeps_its_last_segment() {
        let mut config = ClientConfig::default();
        config.set_base_url("http://127.0.0.1:1/api").unwrap();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:1/api/");
        assert_eq!(config.method_url("getsites").unwrap(), "http://127.0.0.1:1/api/getsites");
        assert_eq!(
            config.method_url("uploadAndPost").unwrap(),
            "http://127.0.0.1:1/api/uploadAndPost"
        );
    }

    #[test]
    fn rejected_base_url_leaves_config_unchanged() {
        let mut config = ClientConfig::default();
        assert!(config.set_base_url("not a url").is_err());
        assert_eq!(config.base_url().as_str(), DEFAULT_BASE_URL);
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn env_overlay_without_variables_is_default() {
        let config = ClientConfig::from_lookup(vars(&[])).unwrap();
        assert_eq!(config.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn env_overlay_applies_and_normalizes() {
        let config = ClientConfig::from_lookup(vars(&[
            ("POSTEROUS_API_URL", "http://localhost:3000/api"),
            ("POSTEROUS_CONNECT_TIMEOUT_SECS", "2"),
            ("POSTEROUS_TIMEOUT_SECS", " 9 "),
        ]))
        .unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:3000/api/");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(9));
    }

    #[test]
    fn env_overlay_rejects_bad_values() {
        let err = ClientConfig::from_lookup(vars(&[("POSTEROUS_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("POSTEROUS_TIMEOUT_SECS")));
        let err = ClientConfig::from_lookup(vars(&[("POSTEROUS_API_URL", "nope")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn env_credentials_skip_empty_values() {
        let creds = Credentials::from_lookup(vars(&[("POSTEROUS_USERNAME", ""), ("POSTEROUS_PASSWORD", "")]));
        assert_eq!(creds.username(), None);
        assert_eq!(creds.password(), None);

        let creds = Credentials::from_lookup(vars(&[("POSTEROUS_USERNAME", "alice")]));
        assert_eq!(creds.username(), Some("alice"));
        assert!(!creds.is_authenticated());

        let creds = Credentials::from_lookup(vars(&[("POSTEROUS_USERNAME", "alice"), ("POSTEROUS_PASSWORD", "pw")]));
        assert!(creds.is_authenticated());
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(matches!(parse_base_url("not a url"), Err(ApiError::Config(_))));
        assert!(matches!(parse_base_url("mailto:a@b.c"), Err(ApiError::Config(_))));
    }

    #[test]
    fn timeout_parsing() {
        assert_eq!(parse_secs("X", " 7 ").unwrap(), Duration::from_secs(7));
        assert!(parse_secs("X", "soon").is_err());
    }
}
