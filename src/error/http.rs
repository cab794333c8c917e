use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to read body file '{path}': {source}")]
    ReadBodyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid request URI '{url}': {source}")]
    InvalidUri {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },
    #[error("Failed to build request: {source}")]
    BuildRequest {
        #[source]
        source: http::Error,
    },
    #[error("Failed to build TLS connector: {source}")]
    BuildTls {
        #[source]
        source: native_tls::Error,
    },
}
