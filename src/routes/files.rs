//! `/files/<name>`: reads and writes files under a base directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{ServerError, ServerResult};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::routes::Handler;

/// Serves GET and POST for files beneath `base_dir`.
///
/// The name after `files/` may contain further `/` separators, but only
/// plain path components: `..`, absolute roots and prefixes are rejected so
/// a request can never reach outside `base_dir`.
pub struct FilesHandler {
    base_dir: PathBuf,
}

impl FilesHandler {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Maps a request path onto a file below the base directory.
    pub fn resolve(&self, path: &str) -> ServerResult<PathBuf> {
        let rest = path
            .strip_prefix('/')
            .unwrap_or(path)
            .strip_prefix("files/")
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| ServerError::BadFilesPath(path.to_string()))?;

        let relative = Path::new(rest);
        let only_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if !only_plain || relative.components().next().is_none() {
            return Err(ServerError::BadFilesPath(path.to_string()));
        }

        Ok(self.base_dir.join(relative))
    }

    async fn read(&self, path: PathBuf) -> ServerResult<Response> {
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|source| ServerError::FileNotFound {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Read file");

        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "application/octet-stream")
            .bytes(contents)
            .build())
    }

    async fn write(&self, path: PathBuf, body: &[u8]) -> ServerResult<Response> {
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ServerError::FileWrite {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), bytes = body.len(), "Wrote file");

        Ok(Response::empty(StatusCode::Created))
    }
}

#[async_trait]
impl Handler for FilesHandler {
    async fn handle(&self, request: &Request) -> ServerResult<Response> {
        let path = self.resolve(&request.path)?;

        match request.method {
            Method::GET => self.read(path).await,
            Method::POST => self.write(path, &request.body).await,
            ref other => Err(ServerError::MethodNotAllowed(other.to_string())),
        }
    }
}
