use crate::http::cookie::Cookie;
use crate::http::error::Error;
use crate::http::headers::Headers;
use crate::http::parser::ResponseHead;
use crate::http::Version;

/// A response as received by the client.
///
/// `Set-Cookie` headers are parsed into [`cookies`](Self::cookies) while
/// the message is read; a malformed one fails the whole response.
#[derive(Debug)]
pub struct ClientResponse {
    version: Version,
    status: u16,
    headers: Headers,
    cookies: Vec<Cookie>,
    body: Option<Vec<u8>>,
}

impl ClientResponse {
    pub(crate) fn from_head(head: ResponseHead) -> Result<Self, Error> {
        let mut cookies = Vec::new();
        if let Some(values) = head.headers.get("Set-Cookie") {
            for line in values {
                cookies.push(Cookie::parse(line)?);
            }
        }

        Ok(Self {
            version: head.version,
            status: head.status,
            headers: head.headers,
            cookies,
            body: None,
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn get_header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name)
    }

    pub fn has_header_value(&self, name: &str, value: &str) -> bool {
        self.headers.has_value(name, value)
    }

    pub fn contains_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// Cookies the server set on this response.
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Whether a non-empty body arrived. A chunked body fully consumed by a
    /// chunk callback counts as absent.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().map(|b| !b.is_empty()).unwrap_or(false)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn into_body(self) -> Option<Vec<u8>> {
        self.body
    }

    pub(crate) fn set_body(&mut self, body: Option<Vec<u8>>) {
        self.body = body;
    }
}
