use easyhttp::config::Config;
use easyhttp::server::{file_server_from_path, Server, ServerRequest, ServerResponse};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cfg = Config::load();

    let mut server = Server::bind(&cfg.listen_addr).await?;
    if let Some(timeout) = cfg.request_timeout {
        server.set_timeout(timeout);
    }

    server.handle_get("/", |_request: ServerRequest, mut response: ServerResponse| async move {
        response.set_header("Content-Type", "text/plain");
        response.write(b"Easyhttp is running\n");
        response
    });
    server.handle_get("/public/*", file_server_from_path("public"));

    let mut handle = server.handle();
    let server_task = tokio::spawn(server.run());

    tokio::select! {
        result = server_task => {
            result??;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            handle.graceful_shutdown().await;
        }
    }

    Ok(())
}
