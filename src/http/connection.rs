use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::http::parser::{parse_http_request, request_frame, Frame};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::routes::Router;

/// Serves exactly one request on an accepted stream, then closes it.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    router: Arc<Router>,
    max_request_bytes: usize,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Dispatching(Bytes),
    Writing(ResponseWriter),
    Closed,
}

enum ReadOutcome {
    Request(Bytes),
    TooLarge,
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>, max_request_bytes: usize) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            router,
            max_request_bytes,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(frame) => ConnectionState::Dispatching(frame),
                        ReadOutcome::TooLarge => {
                            let err = ServerError::PayloadTooLarge(self.max_request_bytes);
                            ConnectionState::Writing(ResponseWriter::new(&error_response(&err)))
                        }
                        ReadOutcome::Closed => ConnectionState::Closed,
                    };
                }

                ConnectionState::Dispatching(frame) => {
                    let response = self.respond(frame).await;
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    debug!(bytes = writer.len(), "Response written");

                    if let Err(e) = self.stream.shutdown().await {
                        debug!(error = %e, "Shutdown after response failed");
                    }
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads until one request has fully arrived or the peer stops sending.
    ///
    /// Everything received is handed to the parser, so bytes past the
    /// declared `Content-Length` stay part of the body.
    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            match request_frame(&self.buffer, self.max_request_bytes) {
                Frame::Complete(_) => {
                    return Ok(ReadOutcome::Request(self.buffer.split().freeze()));
                }
                Frame::TooLarge => return Ok(ReadOutcome::TooLarge),
                Frame::Incomplete => {}
            }

            if self.buffer.len() >= self.max_request_bytes {
                return Ok(ReadOutcome::TooLarge);
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    // Client closed connection without sending anything
                    return Ok(ReadOutcome::Closed);
                }
                return Ok(ReadOutcome::Request(self.buffer.split().freeze()));
            }
        }
    }

    async fn respond(&self, frame: Bytes) -> Response {
        let request = match parse_http_request(&frame) {
            Ok(request) => request,
            Err(e) => return error_response(&ServerError::from(e)),
        };

        let method = request.method.clone();
        let path = request.path.clone();

        // Run the handler in its own task so a panic still produces a 500.
        let router = Arc::clone(&self.router);
        let result = tokio::spawn(async move { router.dispatch(&request).await }).await;

        let response = match result {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => error_response(&e),
            Err(e) => {
                tracing::error!(method = %method, path = %path, error = %e, "Handler panicked");
                Response::internal_error()
            }
        };

        info!(
            method = %method,
            path = %path,
            status = response.status.as_u16(),
            encoding = ?response.header("Content-Encoding"),
            bytes = response.body.len(),
            "Handled request"
        );

        response
    }
}

fn error_response(err: &ServerError) -> Response {
    let status = err.status();
    warn!(error = %err, status = status.as_u16(), "Request failed");
    Response::empty(status)
}
