use bytes::Bytes;
use http::{HeaderMap, Method, Request, Uri};
use http_body_util::Full;

use crate::config::TargetSettings;
use crate::error::HttpError;

/// Immutable base request, built once per run and cloned per attempt.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestTemplate {
    /// Reads the optional body file and assembles the base request.
    ///
    /// # Errors
    ///
    /// Returns an error when the body file cannot be read or the target does
    /// not form a valid request.
    pub async fn build(target: &TargetSettings) -> Result<Self, HttpError> {
        let body = match target.body_file.as_ref() {
            Some(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|source| HttpError::ReadBodyFile {
                    path: path.clone(),
                    source,
                })?,
            None => Bytes::new(),
        };

        let uri: Uri = target
            .url
            .as_str()
            .parse()
            .map_err(|source| HttpError::InvalidUri {
                url: target.url.to_string(),
                source,
            })?;

        let mut builder = Request::builder().method(target.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(target.headers.clone());
        }
        let (parts, ()) = builder
            .body(())
            .map_err(|source| HttpError::BuildRequest { source })?
            .into_parts();

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        })
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Fresh request for one attempt. The body shares the template's buffer.
    #[must_use]
    pub fn to_request(&self) -> Request<Full<Bytes>> {
        let mut request = Request::new(Full::new(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}
