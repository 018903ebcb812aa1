use easyhttp::server::pattern_matches;

struct UriMatchCase {
    request_path: &'static str,
    pattern: &'static str,
    expected: bool,
}

const URI_MATCH_CASES: &[UriMatchCase] = &[
    UriMatchCase { request_path: "/path", pattern: "/*", expected: true },
    UriMatchCase { request_path: "/", pattern: "*", expected: true },
    UriMatchCase { request_path: "/path", pattern: "/", expected: false },
    UriMatchCase { request_path: "/path", pattern: "/path/resource", expected: false },
    UriMatchCase { request_path: "/path/resource", pattern: "/*", expected: true },
    UriMatchCase { request_path: "/path/resource", pattern: "/path/*", expected: true },
    UriMatchCase { request_path: "/path/resource", pattern: "/path/resource/*", expected: false },
    UriMatchCase { request_path: "/path/resource", pattern: "/path/resource", expected: true },
    UriMatchCase { request_path: "/path/resource", pattern: "/path/resource/", expected: true },
    UriMatchCase { request_path: "/path/resource/local", pattern: "/path/*/local", expected: true },
    UriMatchCase { request_path: "/path/resource/local", pattern: "/path/*/test", expected: false },
    UriMatchCase { request_path: "/path/resource/local/test", pattern: "/path/*/test", expected: true },
    UriMatchCase { request_path: "/path/resource/local/test", pattern: "/path/*/local/test", expected: true },
    UriMatchCase { request_path: "/path/resource/local/test", pattern: "/path/*/test/test", expected: false },
    UriMatchCase { request_path: "/path/resource/local/test", pattern: "/path/resource/*/local/test", expected: false },
];

#[test]
fn test_uri_matching_table() {
    for case in URI_MATCH_CASES {
        let got = pattern_matches(case.request_path, case.pattern);
        assert_eq!(
            got, case.expected,
            "request: {}; pattern: {}; expected {}, got {}",
            case.request_path, case.pattern, case.expected, got
        );
    }
}

#[test]
fn test_doubled_and_trailing_slashes_are_ignored() {
    assert!(pattern_matches("//path///resource", "/path/resource"));
    assert!(pattern_matches("/path/resource", "//path//resource//"));
}

#[test]
fn test_wildcard_consumes_multiple_segments() {
    assert!(pattern_matches("/a/b/c/d/e", "/a/*/e"));
    assert!(pattern_matches("/a/b/c/d/e", "/*"));
    assert!(!pattern_matches("/a/b", "/a/b/c/*"));
}

#[test]
fn test_literal_mismatch() {
    assert!(!pattern_matches("/path", "/other"));
    assert!(!pattern_matches("/path/resource", "/path/other"));
}
