//! Per-connection request/response loop.
//!
//! Each accepted socket runs this loop on its own task:
//!
//! 1. Read and parse a request head under the keep-alive deadline
//! 2. Route it; 404/405 short-circuit to an error status
//! 3. Read the body by its advertised framing, feeding any chunk callback
//! 4. Run the handler on a subordinate task, raced against the server's
//!    per-request timeout
//! 5. Write the buffered response, or just the terminator when the handler
//!    streamed chunks itself
//! 6. Keep the connection for the next request or close, per the version's
//!    close semantics
//!
//! A deadline that elapses while waiting for a request closes the
//! connection without writing anything; every other failure is answered
//! with a head-only error response before closing.

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufRead, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::http::body::{read_chunked_body, read_full_body, CHUNK_TERMINATOR};
use crate::http::error::Error;
use crate::http::parser::parse_request_head;
use crate::http::{is_closing, status, Method, Version, KEEP_ALIVE_TIMEOUT};
use crate::net::ServerStream;
use crate::server::request::ServerRequest;
use crate::server::response::{encode_error_response, ConnWriter, ServerResponse};
use crate::server::router::{HandlerRecord, ServerChunkFn};
use crate::server::Shared;

pub(crate) async fn handle_connection(stream: ServerStream, shared: Arc<Shared>) -> Result<(), Error> {
    let (mut read_half, write_half) = tokio::io::split(stream);
    let writer: ConnWriter = Arc::new(Mutex::new(write_half));
    let mut keep_alive = true;

    while keep_alive && shared.is_running() {
        let mut reader = BufReader::new(&mut read_half);

        let head = match timeout(KEEP_ALIVE_TIMEOUT, parse_request_head(&mut reader)).await {
            Err(_) => return Ok(()),
            Ok(Err(Error::ConnectionClosed)) => return Ok(()),
            Ok(Err(e)) => {
                write_error(&writer, &e).await;
                return Ok(());
            }
            Ok(Ok(head)) => head,
        };

        let started = Instant::now();
        let mut request = match ServerRequest::from_head(head) {
            Ok(request) => request,
            Err(e) => {
                write_error(&writer, &e).await;
                return Ok(());
            }
        };
        tracing::debug!(
            method = %request.method(),
            path = %request.path(),
            "Received HTTP request"
        );

        let method = request.method();
        let path = request.path().to_string();
        let closing = is_closing(request.version(), request.headers());
        let mut response = ServerResponse::new(request.version(), method, writer.clone());

        match shared.router.lookup(request.path(), method) {
            Err(Error::NotFound) => {
                response.set_status(status::NOT_FOUND);
            }
            Err(Error::MethodNotAllowed) => {
                response.set_status(status::METHOD_NOT_ALLOWED);
                for allowed in shared.router.allowed_methods(request.path()) {
                    response.add_header("Allow", allowed);
                }
            }
            Err(e) => {
                write_error(&writer, &e).await;
                return Ok(());
            }
            Ok(handler) => {
                let on_chunk = handler.options.on_chunk.clone();
                if let Err(e) =
                    read_request_body(&mut request, &mut reader, &mut response, on_chunk).await
                {
                    write_error(&writer, &e).await;
                    return Ok(());
                }

                match execute(&shared, &handler, request, response).await {
                    Ok(returned) => response = returned,
                    Err(e) => {
                        write_error(&writer, &e).await;
                        return Ok(());
                    }
                }
            }
        }

        if method == Method::Head {
            response.clear_body();
        }

        tracing::info!(
            method = %method,
            path = %path,
            status = response.status(),
            duration_ms = started.elapsed().as_millis() as u64,
            "HTTP request completed"
        );

        {
            let mut guard = writer.lock().await;
            if response.is_chunked() {
                guard.write_all(CHUNK_TERMINATOR).await?;
            } else {
                let bytes = response.to_bytes();
                guard.write_all(&bytes).await?;
            }
            guard.flush().await?;
        }

        keep_alive = !closing;
    }

    Ok(())
}

/// Reads the request body by its advertised framing.
///
/// Chunked framing is honored only on HTTP/1.1; otherwise the last
/// `Content-Length` value decides, and no header means no body. The chunk
/// callback, when present, runs inline against the request and response.
async fn read_request_body<R>(
    request: &mut ServerRequest,
    reader: &mut R,
    response: &mut ServerResponse,
    on_chunk: Option<ServerChunkFn>,
) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin,
{
    if request.version() == Version::Http11
        && request.has_header_value("Transfer-Encoding", "chunked")
    {
        let body = {
            let request_view: &ServerRequest = request;
            let callback = on_chunk
                .map(|f| move |chunk: &[u8]| f(chunk, request_view, &mut *response));
            read_chunked_body(reader, callback).await?
        };
        request.set_body(body);
    } else if let Some(value) = request.headers().last("Content-Length") {
        let length = value.parse::<u32>().map_err(|_| Error::InvalidLength)? as usize;
        if length != 0 {
            request.set_body(read_full_body(reader, length).await?);
        }
    }
    Ok(())
}

/// Runs the handler on a subordinate task so the per-request timeout can be
/// awaited concurrently.
///
/// On timeout the task is abandoned, not aborted: it keeps running with no
/// recipient while the connection answers 408 and closes. A panicking
/// handler surfaces as an internal error.
async fn execute(
    shared: &Shared,
    handler: &HandlerRecord,
    request: ServerRequest,
    response: ServerResponse,
) -> Result<ServerResponse, Error> {
    if handler.options.on_chunk.is_some() && !handler.options.run_after_chunks {
        // The chunk callback already shaped the response.
        return Ok(response);
    }

    let func = handler.func.clone();
    let task = tokio::spawn(async move { func(request, response).await });

    let joined = match shared.timeout {
        Some(limit) => match timeout(limit, task).await {
            Err(_) => {
                tracing::warn!("Handler exceeded the request timeout, abandoning it");
                return Err(Error::RequestTimeout);
            }
            Ok(joined) => joined,
        },
        None => task.await,
    };

    joined.map_err(|e| {
        if e.is_panic() {
            tracing::warn!("Handler panicked");
        }
        Error::Internal
    })
}

/// Writes the head-only error response for failures that map to a status.
/// Deadline elapses and closed connections stay silent.
async fn write_error(writer: &ConnWriter, error: &Error) {
    if let Some(code) = error.status_code() {
        let bytes = encode_error_response(code);
        let mut guard = writer.lock().await;
        if let Err(e) = guard.write_all(&bytes).await {
            tracing::debug!(error = %e, "Failed to write error response");
        }
        let _ = guard.flush().await;
    }
}
