use async_trait::async_trait;

use crate::error::ServerResult;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::routes::Handler;

/// `/user-agent`: echoes the `User-Agent` header, or an empty body without one.
pub struct UserAgentHandler;

#[async_trait]
impl Handler for UserAgentHandler {
    async fn handle(&self, request: &Request) -> ServerResult<Response> {
        let agent = request.header("user-agent").unwrap_or_default();

        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain")
            .text(agent)
            .build())
    }
}
