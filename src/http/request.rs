//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser de la request line. Los headers y el body se ignoran: el
//! servidor enruta solo por path.
//!
//! ## Formato de la Request Line
//!
//! ```text
//! METHOD /path?query [VERSION]\r\n
//! ```
//!
//! Basta con dos tokens. La versión, si viene, no se valida, y cualquier
//! método llega al router.

use std::collections::HashMap;
use thiserror::Error;

/// Método HTTP del request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,

    /// Se responde con los headers de GET y sin body
    HEAD,

    /// Aceptado, pero el body se ignora
    POST,

    /// Cualquier otro token; se enruta igual que GET
    Other(String),
}

impl Method {
    fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::Other(token) => token,
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Falta el path en la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,
}

/// Request line parseada
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query (ej: "/calc")
    path: String,

    /// Query string cruda, sin el '?' (ej: "a=3&b=4")
    query: Option<String>,

    /// Query parameters decodificados
    query_params: HashMap<String, String>,
}

impl Request {
    /// Parsea la request line desde el buffer leído del socket
    ///
    /// Solo se mira la primera línea; el resto del buffer (headers,
    /// body) se descarta. Los bytes que no son UTF-8 se reemplazan, así
    /// que un path inválido termina en 404 y no en 400.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use prefork_httpd::http::Request;
    ///
    /// let raw = b"GET /calc?a=3&b=4 HTTP/1.0\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/calc");
    /// assert_eq!(request.query(), Some("a=3&b=4"));
    /// assert_eq!(request.query_param("b"), Some("4"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let first_line = buffer
            .split(|&b| b == b'\n')
            .next()
            .unwrap_or_default();
        let line = String::from_utf8_lossy(first_line);

        let mut tokens = line.split_whitespace();
        let method = tokens.next().ok_or(ParseError::EmptyRequest)?;
        let target = tokens.next().ok_or(ParseError::InvalidRequestLine)?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        let query_params = query.as_deref().map(parse_query_string).unwrap_or_default();

        Ok(Request {
            method: Method::parse(method),
            path,
            query,
            query_params,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string cruda, si había '?'
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Obtiene un query parameter decodificado
    ///
    /// Si el parámetro se repite gana la última aparición.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }
}

/// Parsea una query string en un HashMap
///
/// Ejemplo: "a=3&b=hello%20world" → {"a": "3", "b": "hello world"}
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in query.split('&') {
        if param.is_empty() {
            continue;
        }

        match param.split_once('=') {
            Some((key, value)) => {
                params.insert(url_decode(key), url_decode(value));
            }
            // Parámetro sin valor (ej: "?debug")
            None => {
                params.insert(url_decode(param), String::new());
            }
        }
    }

    params
}

/// Decodifica percent-encoding (`%41` → `A`) y `+` → espacio
///
/// Los escapes inválidos (`%zz`, `%4` al final) se copian tal cual.
///
/// # Ejemplo
/// ```
/// use prefork_httpd::http::request::url_decode;
///
/// assert_eq!(url_decode("hello%20world"), "hello world");
/// assert_eq!(url_decode("a+b%2bc"), "a b+c");
/// assert_eq!(url_decode("100%"), "100%");
/// ```
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi * 16 + lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
