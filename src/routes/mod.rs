//! Request routing.
//!
//! Routes are keyed by the first path segment of the request. Each key maps
//! to a [`Handler`]; a request whose key has no handler gets a 404.
//!
//! ```text
//! /                 → ""           → RootHandler
//! /echo/hello       → "echo"       → EchoHandler
//! /user-agent       → "user-agent" → UserAgentHandler
//! /files/a/b.txt    → "files"      → FilesHandler
//! ```

pub mod echo;
pub mod files;
pub mod root;
pub mod user_agent;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ServerError, ServerResult};
use crate::http::request::Request;
use crate::http::response::Response;

pub use echo::EchoHandler;
pub use files::FilesHandler;
pub use root::RootHandler;
pub use user_agent::UserAgentHandler;

/// Turns a parsed request into a response.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &Request) -> ServerResult<Response>;
}

/// Maps route keys to handlers.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// The standard route table. `files` is only served when a base
    /// directory is configured.
    pub fn with_default_routes(files_dir: Option<PathBuf>) -> Self {
        let router = Router::new()
            .route("", RootHandler)
            .route("echo", EchoHandler)
            .route("user-agent", UserAgentHandler);

        match files_dir {
            Some(dir) => router.route("files", FilesHandler::new(dir)),
            None => router,
        }
    }

    /// Registers `handler` for `key`, replacing any previous one.
    pub fn route(mut self, key: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.routes.insert(key.into(), Arc::new(handler));
        self
    }

    /// Runs the handler registered for the request's route key.
    pub async fn dispatch(&self, request: &Request) -> ServerResult<Response> {
        let key = request.route_key();

        let handler = self
            .routes
            .get(key)
            .ok_or_else(|| ServerError::RouteNotFound(key.to_string()))?;

        handler.handle(request).await
    }
}
