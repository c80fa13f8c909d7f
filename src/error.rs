//! Error types for the scan engine.
//!
//! Only [`ScanError`] ever reaches a caller of [`crate::scan`]. The other
//! types are caught at their own boundary (one manifest, one lookup, one
//! property) and logged before the scan degrades and moves on.

use thiserror::Error;

/// A manifest could not be parsed. The file contributes no dependencies.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a Maven POM: missing <project> root element")]
    MissingProject,

    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}

/// A registry lookup failed. The dependency degrades to Unknown.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
}

/// A Maven property could not be resolved. The value degrades to `"unknown"`.
#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("parent POM {coordinate} not found in any repository")]
    ParentUnavailable { coordinate: String },

    #[error("parent POM {coordinate} is malformed: {source}")]
    ParentMalformed {
        coordinate: String,
        #[source]
        source: ParseError,
    },
}

/// Reading from a source tree (local directory, GitHub API, archive) failed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{path}: source-control API returned status {status}")]
    Status { path: String, status: u16 },

    #[error("invalid archive: {0}")]
    Archive(String),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("{path}: unexpected response: {message}")]
    Malformed { path: String, message: String },

    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("access token expired")]
    CredentialExpired,
}

impl From<zip::result::ZipError> for SourceError {
    fn from(err: zip::result::ZipError) -> Self {
        SourceError::Archive(err.to_string())
    }
}

/// Fatal scan errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("discovery failed at root '{root}': {source}")]
    Discovery {
        root: String,
        #[source]
        source: SourceError,
    },

    #[error("source tree unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}
