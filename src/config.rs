use std::{fmt::Display, sync::Arc};

use url::Url;

use crate::webdav::{
    auth::{AuthenticationChallengeHandler, StaticCredentials},
    Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Everything needed to open a session against one server.
#[derive(Clone)]
pub struct SessionConfig {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// How many times a request may answer an authentication challenge.
    pub max_auth_attempts: u32,
    pub credential_handler: Option<Arc<dyn AuthenticationChallengeHandler>>,
}

impl SessionConfig {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> SessionConfig {
        SessionConfig {
            scheme: Scheme::Http,
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            max_auth_attempts: 1,
            credential_handler: None,
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_max_auth_attempts(mut self, attempts: u32) -> Self {
        self.max_auth_attempts = attempts;
        self
    }

    pub fn with_credential_handler(
        mut self,
        handler: Arc<dyn AuthenticationChallengeHandler>,
    ) -> Self {
        self.credential_handler = Some(handler);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::InvalidConfig("port must be positive".to_string()));
        }
        Ok(())
    }

    pub(crate) fn base_url(&self) -> Result<Url, Error> {
        let host = self.host.trim().trim_end_matches('/');
        let raw = format!("{}://{}:{}/", self.scheme, host, self.port);
        Url::parse(&raw).map_err(|source| Error::InvalidUri { uri: raw, source })
    }

    pub(crate) fn handler(&self) -> Arc<dyn AuthenticationChallengeHandler> {
        match &self.credential_handler {
            Some(handler) => handler.clone(),
            None => Arc::new(StaticCredentials::new(&self.username, &self.password)),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("max_auth_attempts", &self.max_auth_attempts)
            .finish_non_exhaustive()
    }
}

/// Joins a server-relative path onto the session base, encoding each segment.
pub(crate) fn resource_url(base: &Url, uri: &str) -> Result<Url, Error> {
    let encoded = uri
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<String>>()
        .join("/");
    let encoded = encoded.trim_start_matches('/');
    base.join(&format!("/{}", encoded))
        .map_err(|source| Error::InvalidUri {
            uri: uri.to_string(),
            source,
        })
}
