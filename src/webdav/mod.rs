pub mod auth;
pub mod entry;
pub mod errors;
pub mod propfind;

mod transfer;
mod transport;

use std::path::Path;

use bytes::Bytes;
use reqwest::Method;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;

pub use auth::{AuthenticationChallengeHandler, Credentials, StaticCredentials};
pub use entry::ResourceEntry;
pub use errors::{Error, ErrorKind};
pub use propfind::Depth;

use propfind::{parse_multistatus, PROPFIND_BODY};
use transfer::{LocalDestination, LocalSource};
use transport::{DavRequest, Transport};

/// One connection context to one WebDAV server.
///
/// Every operation records its failure in [`WebDAVSession::last_error`] and
/// reports it through a sentinel return value (`false` or a short list). A
/// successful operation clears the recorded error.
///
/// `list` drops the first entry of the PROPFIND answer (the directory
/// itself) while `tree` keeps it. Callers rely on that difference.
pub struct WebDAVSession {
    transport: Transport,
    last_error: Option<Error>,
}

impl WebDAVSession {
    /// Sets up the connection context. No request is sent until the first
    /// operation.
    pub fn new(config: SessionConfig) -> Result<WebDAVSession, Error> {
        let transport = Transport::new(&config)?;
        info!("webdav session for {}", transport.base_url());
        Ok(WebDAVSession {
            transport,
            last_error: None,
        })
    }

    /// Forgets cached authentication and releases the connection context.
    pub fn close(mut self) {
        self.transport.forget_auth();
        info!("webdav session for {} closed", self.transport.base_url());
    }

    /// Issues one PROPFIND and maps every `<response>` to an entry, in
    /// server order.
    pub async fn fetch(&mut self, uri: &str, depth: Depth) -> Result<Vec<ResourceEntry>, Error> {
        let mut entries = Vec::new();
        self.fetch_into(uri, depth, &mut entries).await?;
        Ok(entries)
    }

    async fn fetch_into(
        &mut self,
        uri: &str,
        depth: Depth,
        entries: &mut Vec<ResourceEntry>,
    ) -> Result<(), Error> {
        let request = DavRequest::new(dav_method("PROPFIND")?, uri)
            .header("Depth", depth.header_value())
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(Bytes::from_static(PROPFIND_BODY.as_bytes()));

        let response = self.transport.send(&request).await?;
        let request_url = response.url().clone();
        let body = response.text().await.map_err(|source| Error::Connection {
            method: request.method.to_string(),
            url: request_url.to_string(),
            source,
        })?;

        let before = entries.len();
        parse_multistatus(&body, &request_url, |entry| entries.push(entry))?;
        if entries.len() == before {
            return Err(Error::Protocol(format!(
                "PROPFIND {} (depth {}) returned no resources",
                request_url, depth
            )));
        }
        debug!(
            "PROPFIND {} (depth {}) -> {} entries",
            request_url,
            depth,
            entries.len() - before
        );
        Ok(())
    }

    /// Immediate children of `uri`, without `uri` itself.
    pub async fn list(&mut self, uri: &str) -> Vec<ResourceEntry> {
        let mut entries = Vec::new();
        let result = self.fetch_into(uri, Depth::One, &mut entries).await;
        if self.record(result).is_some() {
            entries.remove(0);
        }
        entries
    }

    /// `uri` followed by every resource below it.
    pub async fn tree(&mut self, uri: &str) -> Vec<ResourceEntry> {
        let mut entries = Vec::new();
        let result = self.fetch_into(uri, Depth::Infinity, &mut entries).await;
        self.record(result);
        entries
    }

    /// Any failure, not only 404, reads as "does not exist".
    pub async fn exists(&mut self, uri: &str) -> bool {
        let result = self.fetch(uri, Depth::Zero).await.map(|_| ());
        self.record(result).is_some()
    }

    pub async fn put(&mut self, uri: &str, local_source: impl AsRef<Path>) -> bool {
        let result = self.try_put(uri, local_source.as_ref()).await;
        self.record(result).is_some()
    }

    async fn try_put(&mut self, uri: &str, local_source: &Path) -> Result<(), Error> {
        let body = {
            let mut source = LocalSource::open(local_source).await?;
            source.read_all().await?
        };
        debug!("PUT {} ({} bytes from {})", uri, body.len(), local_source.display());

        let request = DavRequest::new(Method::PUT, uri).body(body);
        self.transport.send(&request).await?;
        Ok(())
    }

    pub async fn get(&mut self, uri: &str, local_destination: impl AsRef<Path>) -> bool {
        let result = self.try_get(uri, local_destination.as_ref()).await;
        self.record(result).is_some()
    }

    async fn try_get(&mut self, uri: &str, local_destination: &Path) -> Result<(), Error> {
        let mut destination = LocalDestination::create(local_destination).await?;

        let request = DavRequest::new(Method::GET, uri);
        let mut response = self.transport.send(&request).await?;
        let url = response.url().to_string();

        loop {
            let chunk = response.chunk().await.map_err(|source| Error::Connection {
                method: Method::GET.to_string(),
                url: url.clone(),
                source,
            })?;
            match chunk {
                Some(chunk) => destination.write(&chunk).await?,
                None => break,
            }
        }

        let written = destination.finish().await?;
        debug!("GET {} ({} bytes to {})", uri, written, local_destination.display());
        Ok(())
    }

    pub async fn mkdir(&mut self, uri: &str) -> bool {
        let result = self.try_mkcol(uri).await;
        self.record(result).is_some()
    }

    async fn try_mkcol(&mut self, uri: &str) -> Result<(), Error> {
        let request = DavRequest::new(dav_method("MKCOL")?, uri);
        self.transport.send(&request).await?;
        Ok(())
    }

    pub async fn rm(&mut self, uri: &str) -> bool {
        let request = DavRequest::new(Method::DELETE, uri);
        let result = self.transport.send(&request).await.map(|_| ());
        self.record(result).is_some()
    }

    /// Text of the error recorded by the last failing call, or empty.
    pub fn last_error(&self) -> String {
        self.last_error
            .as_ref()
            .map_or_else(String::new, |e| e.to_string())
    }

    pub fn last_failure(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    fn record<T>(&mut self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                warn!("{}", e);
                self.last_error = Some(e);
                None
            }
        }
    }
}

fn dav_method(name: &str) -> Result<Method, Error> {
    Method::from_bytes(name.as_bytes())
        .map_err(|e| Error::Protocol(format!("bad method {}: {}", name, e)))
}
