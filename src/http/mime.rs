//! # Content-Type por extensión
//! src/http/mime.rs
//!
//! Mapeo simple (case-insensitive) de la extensión del archivo al
//! Content-Type que se envía en /static/*.

use std::path::Path;

/// Content-Type por defecto para extensiones desconocidas
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Retorna el Content-Type asociado a la extensión de `path`
///
/// # Ejemplo
/// ```
/// use prefork_httpd::http::mime::content_type_for;
///
/// assert_eq!(content_type_for("/static/logo.PNG"), "image/png");
/// assert_eq!(content_type_for("/static/data.bin"), "application/octet-stream");
/// ```
pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    let ext = match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
