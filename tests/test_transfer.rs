use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use easyhttp::client::{ChunkSender, Client, ClientRequest};
use easyhttp::http::{status, Version};
use easyhttp::server::{
    HandlerOptions, Server, ServerHandle, ServerRequest, ServerResponse,
};

const LARGE_LEN: usize = 362_128;

fn large_payload() -> Vec<u8> {
    (0..LARGE_LEN).map(|i| (i % 251) as u8).collect()
}

async fn handle_echo(request: ServerRequest, mut response: ServerResponse) -> ServerResponse {
    let body = request.body().to_vec();
    response.write(&body);
    response.set_status(status::OK);
    response.set_header("TestHeader", "Hello");
    response
}

async fn handle_chunked(_request: ServerRequest, mut response: ServerResponse) -> ServerResponse {
    response.set_status(status::OK);
    response.set_header("TestHeader", "Hello");

    let payload = large_payload();
    for chunk in payload.chunks(4096) {
        response.write(chunk);
        response.send_chunk().await.unwrap();
    }
    response
}

async fn handle_after_chunks(
    _request: ServerRequest,
    mut response: ServerResponse,
) -> ServerResponse {
    response.set_status(status::OK);
    response.set_header("TestHeader", "Hello");
    response.write(b"Hello World!\n");
    response
}

fn count_chunk(
    chunk: &[u8],
    _request: &ServerRequest,
    response: &mut ServerResponse,
) -> bool {
    response.set_status(status::NO_CONTENT);
    response.add_header("ChunkBytes", chunk.len().to_string());
    true
}

async fn setup_server() -> (ServerHandle, String) {
    let mut server = Server::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    server.handle_post("/large", handle_echo);
    server.handle_get("/chunked", handle_chunked);
    server.handle_post_with_options(
        "/runafter",
        handle_after_chunks,
        HandlerOptions::with_chunk_fn(count_chunk, true),
    );
    server.handle_post_with_options(
        "/notrun",
        handle_after_chunks,
        HandlerOptions::with_chunk_fn(count_chunk, false),
    );

    let handle = server.handle();
    tokio::spawn(server.run());
    (handle, format!("http://localhost:{}", port))
}

fn spawn_producer(sender: ChunkSender) {
    tokio::spawn(async move {
        let payload = large_payload();
        for chunk in payload.chunks(4096) {
            sender.send(chunk.to_vec()).await.unwrap();
        }
    });
}

#[tokio::test]
async fn test_large_upload_with_content_length() {
    let (handle, base) = setup_server().await;
    let mut client = Client::new();

    let payload = large_payload();
    let mut request = ClientRequest::with_body(&format!("{}/large", base), payload.clone()).unwrap();
    request.set_version(Version::Http10);

    let response = client.post(request).await.unwrap();

    assert_eq!(response.status(), status::OK);
    assert_eq!(
        response.headers().last("Content-Length"),
        Some(LARGE_LEN.to_string().as_str())
    );
    let body = response.body().unwrap();
    assert_eq!(body.len(), LARGE_LEN);
    assert_eq!(body, &payload[..]);

    handle.close();
}

#[tokio::test]
async fn test_chunked_upload_is_echoed_whole() {
    let (handle, base) = setup_server().await;
    let mut client = Client::new();

    let mut request =
        ClientRequest::with_body(&format!("{}/large", base), b"This should be ignored".to_vec())
            .unwrap();
    request.close_connection();
    request.set_chunked();

    spawn_producer(request.chunk_sender());
    let response = client.post(request).await.unwrap();

    assert_eq!(response.status(), status::OK);
    assert!(response.has_header_value("TestHeader", "Hello"));
    assert_eq!(
        response.headers().last("Content-Length"),
        Some(LARGE_LEN.to_string().as_str())
    );
    assert_eq!(response.body().unwrap(), &large_payload()[..]);

    handle.close();
}

#[tokio::test]
async fn test_chunked_download() {
    let (handle, base) = setup_server().await;
    let mut client = Client::new();

    let mut request = ClientRequest::new(&format!("{}/chunked", base)).unwrap();
    request.close_connection();
    let response = client.get(request).await.unwrap();

    assert_eq!(response.status(), status::OK);
    assert!(response.has_header_value("TestHeader", "Hello"));

    let body = response.body().unwrap();
    assert_eq!(body.len(), LARGE_LEN);
    assert_eq!(body, &large_payload()[..]);

    handle.close();
}

#[tokio::test]
async fn test_chunked_download_with_callback_leaves_no_body() {
    let (handle, base) = setup_server().await;
    let mut client = Client::new();

    let total = Arc::new(AtomicUsize::new(0));
    let counter = total.clone();

    let mut request = ClientRequest::new(&format!("{}/chunked", base)).unwrap();
    request.close_connection();
    request.on_chunk(move |chunk, _response| {
        counter.fetch_add(chunk.len(), Ordering::Relaxed);
        true
    });

    let response = client.get(request).await.unwrap();

    assert_eq!(response.status(), status::OK);
    assert!(response.has_header_value("TestHeader", "Hello"));
    assert_eq!(total.load(Ordering::Relaxed), LARGE_LEN);
    assert!(!response.has_body());

    handle.close();
}

#[tokio::test]
async fn test_chunked_upload_with_response_after_chunks() {
    let (handle, base) = setup_server().await;
    let mut client = Client::new();

    let mut request = ClientRequest::new(&format!("{}/runafter", base)).unwrap();
    request.close_connection();
    request.set_chunked();

    spawn_producer(request.chunk_sender());
    let response = client.post(request).await.unwrap();

    // The chunk callback ran first, then the response function overrode it.
    assert_eq!(response.status(), status::OK);
    assert!(response.has_header_value("TestHeader", "Hello"));
    assert_eq!(response.body(), Some(&b"Hello World!\n"[..]));

    handle.close();
}

#[tokio::test]
async fn test_chunked_upload_without_response_after_chunks() {
    let (handle, base) = setup_server().await;
    let mut client = Client::new();

    let mut request = ClientRequest::new(&format!("{}/notrun", base)).unwrap();
    request.close_connection();
    request.set_chunked();

    spawn_producer(request.chunk_sender());
    let response = client.post(request).await.unwrap();

    assert_eq!(response.status(), status::NO_CONTENT);
    assert!(!response.contains_header("TestHeader"));
    assert!(response.contains_header("ChunkBytes"));
    assert!(!response.has_body());

    handle.close();
}
