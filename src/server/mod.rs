//! HTTP server: route registration, the accept loop and shutdown.

pub mod request;
pub mod response;
pub mod router;

mod connection;

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::http::error::Error;
use crate::http::{status, Method};
use crate::net::ServerStream;

pub use request::ServerRequest;
pub use response::ServerResponse;
pub use router::{pattern_matches, BoxedHandler, HandlerOptions, ServerChunkFn};

use router::{HandlerRecord, Router};

/// State shared by the accept loop and every connection task.
pub(crate) struct Shared {
    pub(crate) router: Router,
    pub(crate) timeout: Option<Duration>,
    shutdown: Arc<ShutdownState>,
}

impl Shared {
    pub(crate) fn is_running(&self) -> bool {
        self.shutdown.running.load(Ordering::SeqCst)
    }
}

struct ShutdownState {
    running: AtomicBool,
    graceful: AtomicBool,
    notify: Notify,
}

/// Stops a running server from another task.
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<ShutdownState>,
    done: watch::Receiver<bool>,
}

impl ServerHandle {
    /// Stops accepting and lets the accept loop return. Connections that
    /// are mid-request finish their current exchange and then close.
    pub fn close(&self) {
        self.shutdown.running.store(false, Ordering::SeqCst);
        // notify_one stores a permit, so a close that lands between two
        // polls of the accept loop is not lost.
        self.shutdown.notify.notify_one();
    }

    /// Like [`close`](Self::close), but waits for every in-flight
    /// connection task to finish.
    pub async fn graceful_shutdown(&mut self) {
        self.shutdown.graceful.store(true, Ordering::SeqCst);
        self.close();
        let _ = self.done.wait_for(|done| *done).await;
    }
}

/// An HTTP/1.x server bound to a local address.
///
/// Routes are registered up front; [`run`](Self::run) then serves until a
/// [`ServerHandle`] stops it. The route table is immutable while serving.
pub struct Server {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    router: Router,
    timeout: Option<Duration>,
    shutdown: Arc<ShutdownState>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl Server {
    /// Binds a plain-TCP server.
    pub async fn bind(address: &str) -> Result<Self, Error> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self::from_listener(listener, None))
    }

    /// Binds a TLS server; each accepted connection performs its handshake
    /// on its own task.
    pub async fn bind_tls(address: &str, config: Arc<ServerConfig>) -> Result<Self, Error> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self::from_listener(listener, Some(TlsAcceptor::from(config))))
    }

    fn from_listener(listener: TcpListener, tls: Option<TlsAcceptor>) -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            listener,
            tls,
            router: Router::default(),
            timeout: None,
            shutdown: Arc::new(ShutdownState {
                running: AtomicBool::new(false),
                graceful: AtomicBool::new(false),
                notify: Notify::new(),
            }),
            done_tx,
            done_rx,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Per-request handler timeout; unset means handlers run unbounded.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
            done: self.done_rx.clone(),
        }
    }

    /// Registers a handler for `method` on `pattern`.
    pub fn route<H: IntoHandler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
        options: HandlerOptions,
    ) {
        self.router.route(
            method,
            pattern,
            HandlerRecord {
                func: handler.into_handler(),
                options,
            },
        );
    }

    pub fn handle_get<H: IntoHandler>(&mut self, pattern: &str, handler: H) {
        self.route(Method::Get, pattern, handler, HandlerOptions::default());
    }

    pub fn handle_get_with_options<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
        options: HandlerOptions,
    ) {
        self.route(Method::Get, pattern, handler, options);
    }

    pub fn handle_post<H: IntoHandler>(&mut self, pattern: &str, handler: H) {
        self.route(Method::Post, pattern, handler, HandlerOptions::default());
    }

    pub fn handle_post_with_options<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
        options: HandlerOptions,
    ) {
        self.route(Method::Post, pattern, handler, options);
    }

    pub fn handle_put<H: IntoHandler>(&mut self, pattern: &str, handler: H) {
        self.route(Method::Put, pattern, handler, HandlerOptions::default());
    }

    pub fn handle_put_with_options<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
        options: HandlerOptions,
    ) {
        self.route(Method::Put, pattern, handler, options);
    }

    pub fn handle_patch<H: IntoHandler>(&mut self, pattern: &str, handler: H) {
        self.route(Method::Patch, pattern, handler, HandlerOptions::default());
    }

    pub fn handle_patch_with_options<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
        options: HandlerOptions,
    ) {
        self.route(Method::Patch, pattern, handler, options);
    }

    pub fn handle_delete<H: IntoHandler>(&mut self, pattern: &str, handler: H) {
        self.route(Method::Delete, pattern, handler, HandlerOptions::default());
    }

    pub fn handle_delete_with_options<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
        options: HandlerOptions,
    ) {
        self.route(Method::Delete, pattern, handler, options);
    }

    /// Serves until the handle closes the server. Blocks the calling task.
    pub async fn run(mut self) -> Result<(), Error> {
        self.shutdown.running.store(true, Ordering::SeqCst);
        let shared = Arc::new(Shared {
            router: std::mem::take(&mut self.router),
            timeout: self.timeout,
            shutdown: self.shutdown.clone(),
        });

        let address = self.listener.local_addr()?;
        tracing::info!(address = %address, "Listening");

        let mut tasks = JoinSet::new();
        loop {
            if !self.shutdown.running.load(Ordering::SeqCst) {
                break;
            }
            tokio::select! {
                _ = self.shutdown.notify.notified() => break,

                accepted = self.listener.accept() => {
                    // Reap connection tasks that have already finished.
                    while tasks.try_join_next().is_some() {}

                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            break;
                        }
                    };
                    tracing::debug!(peer = %peer, "Accepted connection");

                    let shared = shared.clone();
                    let acceptor = self.tls.clone();
                    tasks.spawn(async move {
                        let stream = match acceptor {
                            Some(acceptor) => match acceptor.accept(socket).await {
                                Ok(tls) => ServerStream::Tls(Box::new(tls)),
                                Err(e) => {
                                    tracing::warn!(error = %e, "TLS handshake failed");
                                    return;
                                }
                            },
                            None => ServerStream::Plain(socket),
                        };
                        if let Err(e) = connection::handle_connection(stream, shared).await {
                            tracing::debug!(error = %e, "Connection error");
                        }
                    });
                }
            }
        }

        if self.shutdown.graceful.load(Ordering::SeqCst) {
            while tasks.join_next().await.is_some() {}
        } else {
            tasks.detach_all();
        }

        let _ = self.done_tx.send(true);
        Ok(())
    }
}

/// Anything registrable as a handler: an async closure (or fn) taking the
/// request and the response builder and returning the response.
pub trait IntoHandler {
    fn into_handler(self) -> BoxedHandler;
}

impl<H, Fut> IntoHandler for H
where
    H: Fn(ServerRequest, ServerResponse) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServerResponse> + Send + 'static,
{
    fn into_handler(self) -> BoxedHandler {
        Arc::new(move |request, response| {
            Box::pin((self)(request, response))
                as Pin<Box<dyn Future<Output = ServerResponse> + Send>>
        })
    }
}

type BuiltinFuture = Pin<Box<dyn Future<Output = ServerResponse> + Send>>;

/// Handler that answers every request with the contents of one file.
pub fn file_server(
    file_name: impl Into<String>,
) -> impl Fn(ServerRequest, ServerResponse) -> BuiltinFuture + Send + Sync + 'static {
    let file_name = file_name.into();
    move |_request: ServerRequest, mut response: ServerResponse| {
        let file_name = file_name.clone();
        Box::pin(async move {
            response.set_status(status::OK);
            response.send_file(&file_name).await;
            response
        }) as BuiltinFuture
    }
}

/// Handler that serves `prefix` + the last request path segment.
pub fn file_server_from_path(
    prefix: impl Into<String>,
) -> impl Fn(ServerRequest, ServerResponse) -> BuiltinFuture + Send + Sync + 'static {
    let prefix = prefix.into();
    move |request: ServerRequest, mut response: ServerResponse| {
        let prefix = prefix.clone();
        Box::pin(async move {
            response.set_status(status::OK);
            let file_name = request
                .path()
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            let full_path = format!("{}/{}", prefix.trim_end_matches('/'), file_name);
            response.send_file(&full_path).await;
            response
        }) as BuiltinFuture
    }
}

/// Handler that answers with a permanent redirect to `target`.
pub fn perma_redirect(
    target: impl Into<String>,
) -> impl Fn(ServerRequest, ServerResponse) -> BuiltinFuture + Send + Sync + 'static {
    let target = target.into();
    move |_request: ServerRequest, mut response: ServerResponse| {
        let target = target.clone();
        Box::pin(async move {
            response.set_status(status::MOVED_PERMANENTLY);
            response.set_header("Location", target);
            response
        }) as BuiltinFuture
    }
}
