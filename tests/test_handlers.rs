use easyhttp::client::{Client, ClientRequest};
use easyhttp::http::mime::content_type;
use easyhttp::http::status::{self, reason_phrase};
use easyhttp::server::{file_server, file_server_from_path, Server};

#[test]
fn test_reason_phrases() {
    assert_eq!(reason_phrase(status::OK), "OK");
    assert_eq!(reason_phrase(status::NOT_FOUND), "Not Found");
    assert_eq!(reason_phrase(status::METHOD_NOT_ALLOWED), "Method Not Allowed");
    assert_eq!(reason_phrase(status::LENGTH_REQUIRED), "Length Required");
    assert_eq!(reason_phrase(status::REQUEST_TIMEOUT), "Request Timeout");
    assert_eq!(
        reason_phrase(status::HTTP_VERSION_NOT_SUPPORTED),
        "HTTP Version Not Supported"
    );
    assert_eq!(reason_phrase(status::UNPROCESSABLE_CONTENT), "Unprocessable Content");
}

#[test]
fn test_unknown_codes_have_an_empty_phrase() {
    assert_eq!(reason_phrase(418), "");
    assert_eq!(reason_phrase(599), "");
}

#[test]
fn test_mime_table() {
    assert_eq!(content_type("notes.txt"), Some("text/plain"));
    assert_eq!(content_type("index.html"), Some("text/html"));
    assert_eq!(content_type("app.js"), Some("application/javascript"));
    assert_eq!(content_type("data.json"), Some("application/json"));
    assert_eq!(content_type("photo.jpg"), Some("image/jpeg"));
    assert_eq!(content_type("diagram.svg"), Some("image/svg+xml"));
}

#[test]
fn test_unlisted_extensions_have_no_mime_type() {
    assert_eq!(content_type("binary.exe"), None);
    assert_eq!(content_type("no_extension"), None);
}

#[tokio::test]
async fn test_file_server_serves_one_file() {
    let file_path = std::env::temp_dir().join(format!("easyhttp_fs_{}.txt", std::process::id()));
    tokio::fs::write(&file_path, b"static content\n").await.unwrap();

    let mut server = Server::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    server.handle_get("/static", file_server(file_path.to_string_lossy()));
    let handle = server.handle();
    tokio::spawn(server.run());

    let mut client = Client::new();
    let mut request = ClientRequest::new(&format!("http://localhost:{}/static", port)).unwrap();
    request.close_connection();
    let response = client.get(request).await.unwrap();

    assert_eq!(response.status(), status::OK);
    assert_eq!(response.headers().first("Content-Type"), Some("text/plain"));
    assert_eq!(response.body(), Some(&b"static content\n"[..]));

    handle.close();
    tokio::fs::remove_file(&file_path).await.unwrap();
}

#[tokio::test]
async fn test_file_server_from_path_appends_the_last_segment() {
    let dir = std::env::temp_dir();
    let name = format!("easyhttp_prefix_{}.txt", std::process::id());
    let file_path = dir.join(&name);
    tokio::fs::write(&file_path, b"prefixed content\n").await.unwrap();

    let mut server = Server::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    server.handle_get("/files/*", file_server_from_path(dir.to_string_lossy()));
    let handle = server.handle();
    tokio::spawn(server.run());

    let mut client = Client::new();
    let mut request =
        ClientRequest::new(&format!("http://localhost:{}/files/{}", port, name)).unwrap();
    request.close_connection();
    let response = client.get(request).await.unwrap();

    assert_eq!(response.status(), status::OK);
    assert_eq!(response.body(), Some(&b"prefixed content\n"[..]));

    handle.close();
    tokio::fs::remove_file(&file_path).await.unwrap();
}

#[tokio::test]
async fn test_file_server_missing_file_is_404() {
    let mut server = Server::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    server.handle_get("/static", file_server("/definitely/not/a/real/file.txt"));
    let handle = server.handle();
    tokio::spawn(server.run());

    let mut client = Client::new();
    let mut request = ClientRequest::new(&format!("http://localhost:{}/static", port)).unwrap();
    request.close_connection();
    let response = client.get(request).await.unwrap();

    assert_eq!(response.status(), status::NOT_FOUND);
    assert!(!response.has_body());

    handle.close();
}
