use chrono::{DateTime, Utc};

/// One resource (file or collection) as reported by a PROPFIND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    host: String,
    path: String,
    resource_kind: String,
    last_modified: String,
    content_type: String,
}

impl ResourceEntry {
    pub fn new(
        host: String,
        path: String,
        resource_kind: String,
        last_modified: String,
        content_type: String,
    ) -> ResourceEntry {
        ResourceEntry {
            host,
            path,
            resource_kind,
            last_modified,
            content_type,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw `resourcetype` value. Empty for plain files.
    pub fn resource_kind(&self) -> &str {
        &self.resource_kind
    }

    /// Raw `getlastmodified` value, an HTTP-date or empty.
    pub fn last_modified(&self) -> &str {
        &self.last_modified
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_file(&self) -> bool {
        self.resource_kind.is_empty()
    }

    pub fn is_directory(&self) -> bool {
        !self.is_file()
    }

    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => name,
            _ if trimmed.is_empty() => "/",
            _ => trimmed,
        }
    }

    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc2822(&self.last_modified)
            .ok()
            .map(|x| x.with_timezone(&Utc))
    }
}
