//! # Módulo HTTP
//!
//! Subconjunto mínimo de HTTP/1.0 que necesita el servidor:
//!
//! - Parsing de la request line (sin headers)
//! - Construcción y envío de responses
//! - Status codes
//! - Content-Type según la extensión del archivo
//!
//! ### Formato de Request
//!
//! ```text
//! GET /calc?a=3&b=4 HTTP/1.0\r\n
//! (headers ignorados)
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 72\r\n
//! Connection: close\r\n
//! \r\n
//! <html>...</html>
//! ```
//!
//! Una sola petición por conexión: el servidor siempre cierra después
//! de responder.

pub mod mime;
pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
