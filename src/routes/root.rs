use async_trait::async_trait;

use crate::error::ServerResult;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::routes::Handler;

/// `/`: always 200 with an empty plain-text body.
pub struct RootHandler;

#[async_trait]
impl Handler for RootHandler {
    async fn handle(&self, _request: &Request) -> ServerResult<Response> {
        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain")
            .build())
    }
}
