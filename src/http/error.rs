use std::fmt;
use std::io;

/// Errors produced by the protocol engine.
///
/// Server-side failures map to a wire status via [`Error::status_code`];
/// the rest surface to the caller.
#[derive(Debug)]
pub enum Error {
    /// The `Content-Length` value is not a valid length.
    InvalidLength,
    /// The method name is unknown or not routable.
    InvalidMethod,
    /// A pattern matched but the method has no handler.
    MethodNotAllowed,
    /// No registered pattern matched the request path.
    NotFound,
    /// The requested HTTP version is not 1.0 or 1.1.
    VersionNotSupported,
    /// The start line or a header line is malformed.
    BadRequest,
    /// A handler exceeded the server's per-request timeout.
    RequestTimeout,
    /// The response did not arrive within the client's read deadline.
    ClientTimeout,
    /// A handler aborted unexpectedly.
    Internal,
    /// A read deadline elapsed without progress; closed silently.
    IdleTimeout,
    /// The peer closed the connection before a message started.
    ConnectionClosed,
    /// Redirect following exceeded the configured cap.
    TooManyRedirects,
    /// The request URI could not be parsed or carries no host.
    InvalidUri,
    /// A `Set-Cookie` value could not be parsed.
    InvalidCookie(&'static str),
    /// A received message violates the protocol.
    InvalidMessage(&'static str),
    Io(io::Error),
}

impl Error {
    /// The status code written for this error, if it is one the server
    /// reports on the wire.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::InvalidLength => Some(411),
            Error::InvalidMethod | Error::MethodNotAllowed => Some(405),
            Error::NotFound => Some(404),
            Error::VersionNotSupported => Some(505),
            Error::BadRequest => Some(400),
            Error::RequestTimeout => Some(408),
            Error::Internal => Some(500),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLength => write!(f, "invalid content length"),
            Error::InvalidMethod => write!(f, "invalid method"),
            Error::MethodNotAllowed => write!(f, "method not allowed"),
            Error::NotFound => write!(f, "not found"),
            Error::VersionNotSupported => write!(f, "version not supported"),
            Error::BadRequest => write!(f, "bad request"),
            Error::RequestTimeout => write!(f, "request timeout"),
            Error::ClientTimeout => write!(f, "client timeout"),
            Error::Internal => write!(f, "internal error"),
            Error::IdleTimeout => write!(f, "idle timeout"),
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::TooManyRedirects => write!(f, "too many redirects"),
            Error::InvalidUri => write!(f, "uri is not valid"),
            Error::InvalidCookie(reason) => write!(f, "invalid cookie: {}", reason),
            Error::InvalidMessage(reason) => write!(f, "invalid message: {}", reason),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
