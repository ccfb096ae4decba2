//! Minimal WebDAV client: one [`WebDAVSession`] per server, with listing,
//! existence checks, transfers, collection creation and deletion.

pub mod config;
pub mod webdav;

pub use config::{Scheme, SessionConfig};
pub use webdav::{
    AuthenticationChallengeHandler, Credentials, Depth, Error, ErrorKind, ResourceEntry,
    StaticCredentials, WebDAVSession,
};
