//! Route table and glob pattern matching.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::http::error::Error;
use crate::http::Method;
use crate::server::request::ServerRequest;
use crate::server::response::ServerResponse;

/// A registered response handler.
pub type BoxedHandler = Arc<
    dyn Fn(ServerRequest, ServerResponse) -> Pin<Box<dyn Future<Output = ServerResponse> + Send>>
        + Send
        + Sync,
>;

/// Callback run on each decoded request chunk. Returning `false` stops the
/// body read and discards what accumulated so far.
pub type ServerChunkFn = Arc<dyn Fn(&[u8], &ServerRequest, &mut ServerResponse) -> bool + Send + Sync>;

/// Additional options attached to a handler registration.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    /// Invoked inline on every chunk of a chunked request body.
    pub on_chunk: Option<ServerChunkFn>,
    /// Run the response handler after all chunks are consumed; without it
    /// the response derives entirely from the chunk callback.
    pub run_after_chunks: bool,
}

impl HandlerOptions {
    pub fn with_chunk_fn<F>(on_chunk: F, run_after_chunks: bool) -> Self
    where
        F: Fn(&[u8], &ServerRequest, &mut ServerResponse) -> bool + Send + Sync + 'static,
    {
        Self {
            on_chunk: Some(Arc::new(on_chunk)),
            run_after_chunks,
        }
    }
}

pub(crate) struct HandlerRecord {
    pub(crate) func: BoxedHandler,
    pub(crate) options: HandlerOptions,
}

/// Ordered route table: the first registered pattern that matches wins.
#[derive(Default)]
pub(crate) struct Router {
    patterns: Vec<String>,
    handlers: HashMap<String, HashMap<Method, Arc<HandlerRecord>>>,
}

impl Router {
    pub(crate) fn route(&mut self, method: Method, pattern: &str, record: HandlerRecord) {
        if !self.patterns.iter().any(|p| p == pattern) {
            self.patterns.push(pattern.to_string());
        }
        self.handlers
            .entry(pattern.to_string())
            .or_default()
            .insert(method, Arc::new(record));
    }

    /// Finds the handler for a request. HEAD is dispatched to the GET
    /// handler of the same pattern.
    pub(crate) fn lookup(&self, path: &str, method: Method) -> Result<Arc<HandlerRecord>, Error> {
        let method = if method == Method::Head {
            Method::Get
        } else {
            method
        };

        let mut matched = false;
        for pattern in &self.patterns {
            if pattern_matches(path, pattern) {
                matched = true;
                if let Some(record) = self.handlers[pattern].get(&method) {
                    return Ok(record.clone());
                }
            }
        }

        if matched {
            Err(Error::MethodNotAllowed)
        } else {
            Err(Error::NotFound)
        }
    }

    /// Methods registered on the first pattern matching `path`, for the
    /// `Allow` header of a 405.
    pub(crate) fn allowed_methods(&self, path: &str) -> Vec<&'static str> {
        for pattern in &self.patterns {
            if pattern_matches(path, pattern) {
                let mut methods: Vec<&'static str> = self.handlers[pattern]
                    .keys()
                    .map(Method::as_str)
                    .collect();
                methods.sort_unstable();
                return methods;
            }
        }
        Vec::new()
    }
}

/// Matches a request path against a slash-delimited pattern of literal
/// segments and `*` wildcards.
///
/// Empty segments on either side are dropped before matching. A literal
/// must equal the current request segment. A wildcard consumes request
/// segments up to the position that leaves exactly one segment per
/// remaining pattern segment; it must consume at least one, except against
/// a request with no segments at all. The match succeeds iff the request
/// is fully consumed.
pub fn pattern_matches(request_path: &str, pattern: &str) -> bool {
    let request: Vec<&str> = request_path.split('/').filter(|s| !s.is_empty()).collect();
    let pattern: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

    let mut consumed = 0;
    for (i, part) in pattern.iter().enumerate() {
        if *part == "*" {
            let tail = pattern.len() - (i + 1);
            let target = match request.len().checked_sub(tail) {
                Some(target) => target,
                None => return false,
            };
            if target < consumed || (target == consumed && !request.is_empty()) {
                return false;
            }
            consumed = target;
        } else if consumed < request.len() && *part == request[consumed] {
            consumed += 1;
        } else {
            return false;
        }
    }

    consumed == request.len()
}
