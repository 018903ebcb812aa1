use std::collections::HashMap;

use crate::http::cookie::parse_cookie_header;
use crate::http::error::Error;
use crate::http::headers::Headers;
use crate::http::parser::RequestHead;
use crate::http::{Method, Version};

/// A request as received by the server.
///
/// Cookies arrive through the `Cookie` header; they are split out into
/// their own map and the raw header is dropped.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    method: Method,
    path: String,
    query: Option<String>,
    version: Version,
    headers: Headers,
    cookies: HashMap<String, String>,
    body: Vec<u8>,
}

impl ServerRequest {
    pub(crate) fn from_head(head: RequestHead) -> Result<Self, Error> {
        let mut headers = head.headers;
        let mut cookies = HashMap::new();
        if let Some(values) = headers.remove("Cookie") {
            for line in values {
                cookies.extend(parse_cookie_header(&line)?);
            }
        }

        Ok(Self {
            method: head.method,
            path: head.path,
            query: head.query,
            version: head.version,
            headers,
            cookies,
            body: Vec::new(),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Decoded query pairs, in order of appearance.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.query {
            Some(query) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
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

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    /// Cookies sent by the client, by name.
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }
}
