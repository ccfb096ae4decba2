use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{
    header::{AUTHORIZATION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, WWW_AUTHENTICATE},
    Method, Response, StatusCode,
};
use tracing::{debug, warn};
use url::Url;

use super::{
    auth::{parse_challenges, AuthenticationChallengeHandler, Challenge, Credentials},
    Error,
};
use crate::config::{resource_url, SessionConfig};

/// One request as the session wants it sent; replayed on auth challenges.
pub(crate) struct DavRequest<'a> {
    pub method: Method,
    pub uri: &'a str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Bytes>,
}

impl<'a> DavRequest<'a> {
    pub fn new(method: Method, uri: &'a str) -> Self {
        DavRequest {
            method,
            uri,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// HTTP plumbing for one session: connection context plus authentication state.
pub(crate) struct Transport {
    client: reqwest::Client,
    base_url: Url,
    handler: Arc<dyn AuthenticationChallengeHandler>,
    max_auth_attempts: u32,
    server_auth: Option<Credentials>,
    proxy_auth: Option<Credentials>,
}

impl Transport {
    pub fn new(config: &SessionConfig) -> Result<Transport, Error> {
        config.validate()?;
        let base_url = config.base_url()?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(Transport {
            client,
            base_url,
            handler: config.handler(),
            max_auth_attempts: config.max_auth_attempts,
            server_auth: None,
            proxy_auth: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, uri: &str) -> Result<Url, Error> {
        resource_url(&self.base_url, uri)
    }

    pub fn forget_auth(&mut self) {
        self.server_auth = None;
        self.proxy_auth = None;
    }

    /// Sends the request, answering 401/407 challenges through the handler.
    /// Any final status outside 2xx becomes an error.
    pub async fn send(&mut self, request: &DavRequest<'_>) -> Result<Response, Error> {
        let url = self.url_for(request.uri)?;
        let mut attempts = 0;

        loop {
            let response = self.send_once(request, &url).await?;
            let status = response.status();
            debug!("{} {} -> {}", request.method, url, status);

            if status.is_success() {
                return Ok(response);
            }

            let (challenge_header, proxy) = match status {
                StatusCode::UNAUTHORIZED => (WWW_AUTHENTICATE, false),
                StatusCode::PROXY_AUTHENTICATION_REQUIRED => (PROXY_AUTHENTICATE, true),
                _ => {
                    return Err(Error::Status {
                        method: request.method.to_string(),
                        url: url.to_string(),
                        status,
                    })
                }
            };

            let challenges: Vec<Challenge> = response
                .headers()
                .get_all(&challenge_header)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(parse_challenges)
                .collect();
            let basic = challenges.iter().find(|c| c.is_basic());
            let realm = basic
                .or(challenges.first())
                .map(|c| c.realm.clone())
                .unwrap_or_default();

            let credentials = match basic {
                Some(challenge) if attempts < self.max_auth_attempts => {
                    self.handler.authenticate(&challenge.realm, attempts)
                }
                Some(_) => None,
                None => {
                    let schemes: Vec<&str> =
                        challenges.iter().map(|c| c.scheme.as_str()).collect();
                    warn!("no Basic challenge offered (schemes: {:?})", schemes);
                    None
                }
            };

            let credentials = match credentials {
                Some(credentials) => credentials.truncated(),
                None => {
                    if proxy {
                        self.proxy_auth = None;
                    } else {
                        self.server_auth = None;
                    }
                    return Err(Error::Authentication {
                        method: request.method.to_string(),
                        url: url.to_string(),
                        status,
                        realm,
                        attempts,
                    });
                }
            };

            attempts += 1;
            debug!("answering challenge for realm \"{}\" (attempt {})", realm, attempts);
            if proxy {
                self.proxy_auth = Some(credentials);
            } else {
                self.server_auth = Some(credentials);
            }
        }
    }

    async fn send_once(&self, request: &DavRequest<'_>, url: &Url) -> Result<Response, Error> {
        let mut builder = self.client.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(credentials) = &self.server_auth {
            builder = builder.header(AUTHORIZATION, basic_header_value(credentials));
        }
        if let Some(credentials) = &self.proxy_auth {
            builder = builder.header(PROXY_AUTHORIZATION, basic_header_value(credentials));
        }
        if let Some(body) = &request.body {
            // refcount bump, the buffer itself is shared
            builder = builder.body(body.clone());
        }

        builder.send().await.map_err(|source| Error::Connection {
            method: request.method.to_string(),
            url: url.to_string(),
            source,
        })
    }
}

fn basic_header_value(credentials: &Credentials) -> String {
    let pair = format!("{}:{}", credentials.username, credentials.password);
    format!("Basic {}", STANDARD.encode(pair))
}
