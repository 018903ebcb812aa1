use easyhttp::http::headers::Headers;
use easyhttp::http::{is_closing, Version};

#[test]
fn test_names_are_case_insensitive() {
    let mut headers = Headers::new();
    headers.set("Content-Type", "text/plain");

    assert_eq!(headers.first("content-type"), Some("text/plain"));
    assert_eq!(headers.first("CONTENT-TYPE"), Some("text/plain"));
    assert!(headers.contains("Content-type"));
}

#[test]
fn test_set_replaces_all_values() {
    let mut headers = Headers::new();
    headers.add("Accept", "text/html");
    headers.add("Accept", "application/json");
    headers.set("Accept", "*/*");

    assert_eq!(headers.get("Accept").unwrap(), &["*/*".to_string()]);
}

#[test]
fn test_add_preserves_value_order() {
    let mut headers = Headers::new();
    headers.add("ResponseHeader", "Test");
    headers.add("ResponseHeader", "Passed");

    let values = headers.get("ResponseHeader").unwrap();
    assert_eq!(values, &["Test".to_string(), "Passed".to_string()]);
}

#[test]
fn test_has_value_is_case_sensitive_on_values() {
    let mut headers = Headers::new();
    headers.add("TestHeader", "Hello");

    assert!(headers.has_value("testheader", "Hello"));
    assert!(!headers.has_value("testheader", "hello"));
}

#[test]
fn test_last_value_wins_for_single_valued_headers() {
    let mut headers = Headers::new();
    headers.add("Content-Length", "10");
    headers.add("Content-Length", "20");

    assert_eq!(headers.last("Content-Length"), Some("20"));
}

#[test]
fn test_names_and_values_are_trimmed() {
    let mut headers = Headers::new();
    headers.set("  Host  ", "  localhost  ");

    assert_eq!(headers.first("host"), Some("localhost"));
}

#[test]
fn test_write_joins_values_with_comma() {
    let mut headers = Headers::new();
    headers.add("Allow", "GET");
    headers.add("Allow", "POST");

    let mut buf = Vec::new();
    headers.write_to(&mut buf);
    assert_eq!(String::from_utf8(buf).unwrap(), "allow: GET, POST\r\n");
}

#[test]
fn test_close_semantics_http11() {
    let mut headers = Headers::new();
    assert!(!is_closing(Version::Http11, &headers));

    headers.set("Connection", "close");
    assert!(is_closing(Version::Http11, &headers));
}

#[test]
fn test_close_semantics_http10() {
    let mut headers = Headers::new();
    assert!(is_closing(Version::Http10, &headers));

    headers.set("Connection", "keep-alive");
    assert!(!is_closing(Version::Http10, &headers));
}
