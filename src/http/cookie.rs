//! Cookie parsing, serialization and the client-side jar.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime};

use url::Url;

use crate::http::error::Error;

/// `SameSite` cookie attribute. `None` implies `Secure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Default,
    Lax,
    Strict,
    None,
}

/// One HTTP cookie with its attributes.
///
/// `expires` left unset together with a zero `max_age` makes a session
/// cookie: it lives until the jar is dropped.
#[derive(Debug, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: Option<SystemTime>,
    pub max_age: i64,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    creation: SystemTime,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: 0,
            domain: String::new(),
            path: String::new(),
            secure: false,
            http_only: false,
            same_site: SameSite::Default,
            creation: SystemTime::now(),
        }
    }

    /// Sets `Max-Age` and fixes the expiry to creation + `seconds`.
    pub fn set_max_age(&mut self, seconds: i64) {
        self.max_age = seconds;
        self.expires = Some(shift(self.creation, seconds));
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires.map(|e| e < now).unwrap_or(false)
    }

    /// Parses a `Set-Cookie` header value.
    ///
    /// Recognized attributes only; a later `Expires` never overrides an
    /// earlier one, while `Max-Age` always recomputes the expiry.
    pub fn parse(line: &str) -> Result<Cookie, Error> {
        let mut segments = line.trim().split(';');

        let pair = segments.next().ok_or(Error::InvalidCookie("bad cookie line"))?;
        let (name, value) = pair
            .split_once('=')
            .ok_or(Error::InvalidCookie("bad name value pair"))?;
        let mut cookie = Cookie::new(name, value);

        for attribute in segments {
            let (attr_name, attr_value) = match attribute.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (attribute, None),
            };
            match attr_name.trim().to_ascii_lowercase().as_str() {
                "expires" => {
                    if cookie.expires.is_some() {
                        continue;
                    }
                    let value = attr_value.ok_or(Error::InvalidCookie("bad attribute"))?;
                    let expires = httpdate::parse_http_date(value.trim())
                        .map_err(|_| Error::InvalidCookie("bad expire value"))?;
                    cookie.expires = Some(expires);
                }
                "max-age" => {
                    let value = attr_value.ok_or(Error::InvalidCookie("bad attribute"))?;
                    let seconds: i64 = value
                        .trim()
                        .parse()
                        .map_err(|_| Error::InvalidCookie("bad max age value"))?;
                    cookie.set_max_age(seconds);
                }
                "domain" => {
                    let value = attr_value.ok_or(Error::InvalidCookie("bad attribute"))?;
                    cookie.domain = value.trim().to_string();
                }
                "path" => {
                    let value = attr_value.ok_or(Error::InvalidCookie("bad attribute"))?;
                    cookie.path = value.trim().to_string();
                }
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => {
                    let value = attr_value.ok_or(Error::InvalidCookie("bad attribute"))?;
                    match value.trim().to_ascii_lowercase().as_str() {
                        "lax" => cookie.same_site = SameSite::Lax,
                        "strict" => cookie.same_site = SameSite::Strict,
                        "none" => {
                            cookie.same_site = SameSite::None;
                            cookie.secure = true;
                        }
                        _ => return Err(Error::InvalidCookie("bad samesite value")),
                    }
                }
                _ => return Err(Error::InvalidCookie("unknown attribute")),
            }
        }

        Ok(cookie)
    }
}

impl fmt::Display for Cookie {
    /// `Set-Cookie` serialization, attributes in fixed order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(expires) = self.expires {
            write!(f, "; Expires={}", httpdate::fmt_http_date(expires))?;
        }
        if self.max_age != 0 {
            write!(f, "; Max-Age={}", self.max_age)?;
        }
        if !self.domain.is_empty() {
            write!(f, "; Domain={}", self.domain)?;
        }
        if !self.path.is_empty() {
            write!(f, "; Path={}", self.path)?;
        }
        if self.secure {
            write!(f, "; Secure")?;
        }
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        match self.same_site {
            SameSite::Default => {}
            SameSite::Lax => write!(f, "; SameSite=Lax")?,
            SameSite::Strict => write!(f, "; SameSite=Strict")?,
            SameSite::None => write!(f, "; SameSite=None")?,
        }
        Ok(())
    }
}

fn shift(base: SystemTime, seconds: i64) -> SystemTime {
    if seconds >= 0 {
        base + Duration::from_secs(seconds as u64)
    } else {
        base - Duration::from_secs(seconds.unsigned_abs())
    }
}

/// Parses a request `Cookie` header into name/value pairs.
pub fn parse_cookie_header(value: &str) -> Result<HashMap<String, String>, Error> {
    let mut cookies = HashMap::new();
    for pair in value.trim().split(';') {
        let (name, value) = pair.split_once('=').ok_or(Error::BadRequest)?;
        cookies.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(cookies)
}

/// Client cookie store: host, then cookie name, then the cookie.
///
/// The host key is the cookie's `Domain` attribute when present, otherwise
/// the request host; matching is exact host equality. Contents never cross
/// hosts.
#[derive(Debug, Default)]
pub struct CookieJar {
    map: HashMap<String, HashMap<String, Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts cookies under their host; a cookie that is already expired
    /// removes the stored entry instead.
    pub fn set_cookies(&mut self, uri: &Url, cookies: Vec<Cookie>) {
        let now = SystemTime::now();
        for cookie in cookies {
            let host = if cookie.domain.is_empty() {
                match uri.host_str() {
                    Some(host) => host.to_string(),
                    None => continue,
                }
            } else {
                cookie.domain.clone()
            };
            let entry = self.map.entry(host).or_default();
            if cookie.is_expired(now) {
                entry.remove(&cookie.name);
            } else {
                entry.insert(cookie.name.clone(), cookie);
            }
        }
    }

    /// All cookies to attach to a request for `uri`.
    ///
    /// Expired cookies are evicted on the way, `Secure` cookies are withheld
    /// off `https`, and the cookie path must prefix the request path (an
    /// empty path matches everything).
    pub fn cookies(&mut self, uri: &Url) -> Vec<Cookie> {
        let host = match uri.host_str() {
            Some(host) => host,
            None => return Vec::new(),
        };
        let entry = match self.map.get_mut(host) {
            Some(entry) => entry,
            None => return Vec::new(),
        };

        let now = SystemTime::now();
        entry.retain(|_, cookie| !cookie.is_expired(now));

        let https = uri.scheme() == "https";
        let request_path = uri.path();
        entry
            .values()
            .filter(|cookie| !cookie.secure || https)
            .filter(|cookie| matches_path(request_path, &cookie.path))
            .cloned()
            .collect()
    }
}

fn matches_path(request_path: &str, cookie_path: &str) -> bool {
    cookie_path.is_empty() || request_path.starts_with(cookie_path)
}
