use async_trait::async_trait;

use crate::error::{ServerError, ServerResult};
use crate::http::encoding::negotiate;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::routes::Handler;

/// `/echo/<message>`: returns `<message>` verbatim, gzip-compressed when
/// the client accepts it.
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, request: &Request) -> ServerResult<Response> {
        let message = request.segments().nth(1).unwrap_or_default();

        let builder = ResponseBuilder::new(StatusCode::Ok).header("Content-Type", "text/plain");

        let response = match negotiate(request.header("accept-encoding")) {
            Some(coding) => {
                let encoded = coding
                    .encode(message.as_bytes())
                    .map_err(ServerError::Encoding)?;

                tracing::debug!(
                    coding = coding.as_str(),
                    original = message.len(),
                    encoded = encoded.len(),
                    "Compressed echo body"
                );

                builder
                    .header("Content-Encoding", coding.as_str())
                    .bytes(encoded)
            }
            None => builder.text(message),
        };

        Ok(response.build())
    }
}
