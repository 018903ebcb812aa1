/// MIME type for a file path, by extension.
///
/// Only the built-in table is consulted; anything else is served without a
/// `Content-Type`.
pub fn content_type(path: &str) -> Option<&'static str> {
    let extension = path.rsplit('.').next()?;
    match extension {
        "txt" => Some("text/plain"),
        "html" => Some("text/html"),
        "css" => Some("text/css"),
        "js" => Some("application/javascript"),
        "json" => Some("application/json"),
        "pdf" => Some("application/pdf"),
        "jpg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "mp4" => Some("video/mp4"),
        "zip" => Some("application/zip"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
