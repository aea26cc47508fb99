//! Image queries.

/// How the image in a query is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// A short label (or hash prefix) plus an optional remote.
    Alias,
    /// A direct download URL.
    HttpDownload,
    /// A local image file.
    LocalFile,
}

/// Request for an image, optionally on behalf of a named instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Instance name; empty when only the image is wanted.
    pub name: String,
    /// Alias, hash prefix, URL or path depending on `query_type`.
    pub release: String,
    pub persistent: bool,
    /// Remote to look in; empty means the default remote.
    pub remote_name: String,
    pub query_type: QueryType,
}

impl Query {
    /// Alias query on the default remote.
    pub fn alias(name: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            release: release.into(),
            persistent: false,
            remote_name: String::new(),
            query_type: QueryType::Alias,
        }
    }

    /// Same query on a specific remote.
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote_name = remote.into();
        self
    }
}
