use std::time::{Duration, SystemTime, UNIX_EPOCH};

use easyhttp::http::cookie::{parse_cookie_header, Cookie, CookieJar, SameSite};
use url::Url;

#[test]
fn test_parse_name_and_value() {
    let cookie = Cookie::parse("TestID=12345").unwrap();
    assert_eq!(cookie.name, "TestID");
    assert_eq!(cookie.value, "12345");
    assert_eq!(cookie.same_site, SameSite::Default);
    assert!(cookie.expires.is_none());
}

#[test]
fn test_parse_value_may_contain_equals() {
    let cookie = Cookie::parse("token=a=b=c").unwrap();
    assert_eq!(cookie.name, "token");
    assert_eq!(cookie.value, "a=b=c");
}

#[test]
fn test_parse_all_attributes() {
    let cookie =
        Cookie::parse("sid=abc; Domain=localhost; Path=/app; Secure; HttpOnly; SameSite=Strict")
            .unwrap();
    assert_eq!(cookie.domain, "localhost");
    assert_eq!(cookie.path, "/app");
    assert!(cookie.secure);
    assert!(cookie.http_only);
    assert_eq!(cookie.same_site, SameSite::Strict);
}

#[test]
fn test_parse_expires_rfc1123() {
    let cookie = Cookie::parse("sid=abc; Expires=Thu, 01 Jan 1970 00:01:40 GMT").unwrap();
    assert_eq!(cookie.expires, Some(UNIX_EPOCH + Duration::from_secs(100)));
}

#[test]
fn test_parse_first_expires_wins() {
    let cookie = Cookie::parse(
        "sid=abc; Expires=Thu, 01 Jan 1970 00:01:40 GMT; Expires=Thu, 01 Jan 1970 00:03:20 GMT",
    )
    .unwrap();
    assert_eq!(cookie.expires, Some(UNIX_EPOCH + Duration::from_secs(100)));
}

#[test]
fn test_parse_max_age_fixes_expiry() {
    let before = SystemTime::now();
    let cookie = Cookie::parse("sid=abc; Max-Age=3600").unwrap();
    assert_eq!(cookie.max_age, 3600);

    let expires = cookie.expires.expect("max-age must set the expiry");
    assert!(expires >= before + Duration::from_secs(3599));
    assert!(expires <= SystemTime::now() + Duration::from_secs(3601));
}

#[test]
fn test_parse_samesite_none_forces_secure() {
    let cookie = Cookie::parse("sid=abc; SameSite=None").unwrap();
    assert_eq!(cookie.same_site, SameSite::None);
    assert!(cookie.secure);
}

#[test]
fn test_parse_samesite_is_case_insensitive() {
    let cookie = Cookie::parse("sid=abc; samesite=lax").unwrap();
    assert_eq!(cookie.same_site, SameSite::Lax);
}

#[test]
fn test_parse_unknown_attribute_is_an_error() {
    assert!(Cookie::parse("sid=abc; Unknown=1").is_err());
}

#[test]
fn test_parse_bad_samesite_is_an_error() {
    assert!(Cookie::parse("sid=abc; SameSite=Whatever").is_err());
}

#[test]
fn test_parse_missing_value_is_an_error() {
    assert!(Cookie::parse("justaname").is_err());
}

#[test]
fn test_serialization_attribute_order() {
    let mut cookie = Cookie::new("TestID", "12345");
    cookie.expires = Some(UNIX_EPOCH);
    cookie.max_age = 3600;
    cookie.domain = "localhost".to_string();
    cookie.path = "/".to_string();
    cookie.secure = true;
    cookie.http_only = true;
    cookie.same_site = SameSite::Lax;

    assert_eq!(
        cookie.to_string(),
        "TestID=12345; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=3600; \
         Domain=localhost; Path=/; Secure; HttpOnly; SameSite=Lax"
    );
}

#[test]
fn test_serialization_skips_unset_attributes() {
    let cookie = Cookie::new("sid", "abc");
    assert_eq!(cookie.to_string(), "sid=abc");
}

#[test]
fn test_serialization_round_trip() {
    let original =
        Cookie::parse("sid=abc; Domain=test.com; Path=/a; Secure; SameSite=Strict").unwrap();
    let reparsed = Cookie::parse(&original.to_string()).unwrap();

    assert_eq!(reparsed.name, original.name);
    assert_eq!(reparsed.value, original.value);
    assert_eq!(reparsed.domain, original.domain);
    assert_eq!(reparsed.path, original.path);
    assert_eq!(reparsed.secure, original.secure);
    assert_eq!(reparsed.same_site, original.same_site);
}

#[test]
fn test_cookie_header_parsing() {
    let cookies = parse_cookie_header("TestID=12345; Session=abc").unwrap();
    assert_eq!(cookies.get("TestID").map(String::as_str), Some("12345"));
    assert_eq!(cookies.get("Session").map(String::as_str), Some("abc"));
}

#[test]
fn test_cookie_header_without_equals_is_an_error() {
    assert!(parse_cookie_header("broken").is_err());
}

#[test]
fn test_jar_returns_cookies_for_host() {
    let uri = Url::parse("http://localhost/path").unwrap();
    let mut jar = CookieJar::new();
    jar.set_cookies(&uri, vec![Cookie::new("TestID", "12345")]);

    let cookies = jar.cookies(&uri);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "TestID");
}

#[test]
fn test_jar_upserts_by_name() {
    let uri = Url::parse("http://localhost/").unwrap();
    let mut jar = CookieJar::new();
    jar.set_cookies(&uri, vec![Cookie::new("sid", "old")]);
    jar.set_cookies(&uri, vec![Cookie::new("sid", "new")]);

    let cookies = jar.cookies(&uri);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value, "new");
}

#[test]
fn test_jar_domain_attribute_overrides_request_host() {
    let uri = Url::parse("http://localhost/").unwrap();
    let mut cookie = Cookie::new("sid", "abc");
    cookie.domain = "test.com".to_string();

    let mut jar = CookieJar::new();
    jar.set_cookies(&uri, vec![cookie]);

    assert!(jar.cookies(&uri).is_empty());
    let other = Url::parse("http://test.com/").unwrap();
    assert_eq!(jar.cookies(&other).len(), 1);
}

#[test]
fn test_jar_never_crosses_hosts() {
    let first = Url::parse("http://one.example/").unwrap();
    let second = Url::parse("http://two.example/").unwrap();

    let mut jar = CookieJar::new();
    jar.set_cookies(&first, vec![Cookie::new("sid", "abc")]);

    assert_eq!(jar.cookies(&first).len(), 1);
    assert!(jar.cookies(&second).is_empty());
}

#[test]
fn test_jar_withholds_secure_cookies_off_https() {
    let https = Url::parse("https://localhost/").unwrap();
    let http = Url::parse("http://localhost/").unwrap();

    let mut cookie = Cookie::new("sid", "abc");
    cookie.secure = true;

    let mut jar = CookieJar::new();
    jar.set_cookies(&https, vec![cookie]);

    assert!(jar.cookies(&http).is_empty());
    assert_eq!(jar.cookies(&https).len(), 1);
}

#[test]
fn test_jar_honors_path_prefix() {
    let base = Url::parse("http://localhost/").unwrap();
    let mut cookie = Cookie::new("sid", "abc");
    cookie.path = "/a".to_string();

    let mut jar = CookieJar::new();
    jar.set_cookies(&base, vec![cookie]);

    let exact = Url::parse("http://localhost/a").unwrap();
    let nested = Url::parse("http://localhost/a/b").unwrap();
    let other = Url::parse("http://localhost/b").unwrap();

    assert_eq!(jar.cookies(&exact).len(), 1);
    assert_eq!(jar.cookies(&nested).len(), 1);
    assert!(jar.cookies(&other).is_empty());
}

#[test]
fn test_jar_empty_path_matches_everything() {
    let base = Url::parse("http://localhost/").unwrap();
    let mut jar = CookieJar::new();
    jar.set_cookies(&base, vec![Cookie::new("sid", "abc")]);

    let deep = Url::parse("http://localhost/some/deep/path").unwrap();
    assert_eq!(jar.cookies(&deep).len(), 1);
}

#[test]
fn test_jar_storing_an_expired_cookie_removes_the_entry() {
    let uri = Url::parse("http://localhost/").unwrap();
    let mut jar = CookieJar::new();
    jar.set_cookies(&uri, vec![Cookie::new("sid", "abc")]);

    let mut expired = Cookie::new("sid", "abc");
    expired.expires = Some(SystemTime::now() - Duration::from_secs(60));
    jar.set_cookies(&uri, vec![expired]);

    assert!(jar.cookies(&uri).is_empty());
}

#[test]
fn test_jar_evicts_expired_cookies_on_read() {
    let uri = Url::parse("http://localhost/").unwrap();
    let mut soon_expired = Cookie::new("sid", "abc");
    soon_expired.expires = Some(SystemTime::now() + Duration::from_millis(5));

    let mut jar = CookieJar::new();
    jar.set_cookies(&uri, vec![soon_expired]);
    std::thread::sleep(Duration::from_millis(20));

    assert!(jar.cookies(&uri).is_empty());
}

#[test]
fn test_session_cookie_never_expires() {
    let cookie = Cookie::new("sid", "abc");
    assert!(!cookie.is_expired(SystemTime::now() + Duration::from_secs(3_600 * 24 * 365)));
}
