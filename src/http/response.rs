//! # Construcción de Respuestas HTTP
//!
//! API para construir respuestas HTTP/1.0 y escribirlas en el socket.
//! El body puede estar en memoria o ser un archivo abierto que se envía
//! por bloques (para /static/* no se carga el archivo completo).
//!
//! ## Ejemplo de uso
//!
//! ```
//! use prefork_httpd::http::{Response, StatusCode};
//!
//! let mut response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/html")
//!     .with_body("<p>hola</p>");
//!
//! let mut out = Vec::new();
//! response.write_to(&mut out).unwrap();
//! assert!(out.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::fs::File;
use std::io::{self, Read, Write};

/// Tamaño de los bloques al enviar archivos
const CHUNK_SIZE: usize = 8192;

/// Cuerpo de la respuesta
#[derive(Debug)]
enum Body {
    /// Bytes en memoria
    Bytes(Vec<u8>),

    /// Archivo abierto de `len` bytes
    File { file: File, len: u64 },
}

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers en orden de inserción; un nombre repetido se sobrescribe
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Body,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    ///
    /// Por defecto, la respuesta no tiene headers ni body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Bytes(Vec::new()),
        }
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe (sin distinguir mayúsculas), se sobrescribe.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo de la respuesta desde un string
    ///
    /// Automáticamente calcula y agrega el header `Content-Length`.
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo de la respuesta desde bytes
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        let len = body.len().to_string();
        self.body = Body::Bytes(body);
        self.add_header("Content-Length", &len);
        self
    }

    /// Usa un archivo abierto como body; `len` es su tamaño en bytes
    pub fn with_file(mut self, file: File, len: u64) -> Self {
        self.body = Body::File { file, len };
        self.add_header("Content-Length", &len.to_string());
        self
    }

    /// Página HTML con 200 OK
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "text/html")
            .with_body(body)
    }

    /// JSON con 200 OK
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// 404 con body `Not Found`
    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound, StatusCode::NotFound.reason_phrase())
    }

    /// Respuesta de error en texto plano
    ///
    /// # Ejemplo
    /// ```
    /// use prefork_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::BadRequest, "Invalid request line");
    /// assert_eq!(response.body_bytes(), Some(&b"Invalid request line"[..]));
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain")
            .with_body(message)
    }

    /// Serializa status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.0 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Escribe la respuesta completa en `writer`
    ///
    /// El head y los bodies en memoria se escriben con `write_all`; los
    /// archivos se copian por bloques de 8 KiB. Retorna los bytes escritos.
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> io::Result<u64> {
        let mut written = self.write_head_to(writer)?;

        match &mut self.body {
            Body::Bytes(bytes) => {
                writer.write_all(bytes)?;
                written += bytes.len() as u64;
            }
            Body::File { file, len } => {
                let mut chunk = [0u8; CHUNK_SIZE];
                let mut remaining = *len;
                while remaining > 0 {
                    let want = remaining.min(CHUNK_SIZE as u64) as usize;
                    let n = file.read(&mut chunk[..want])?;
                    if n == 0 {
                        // El archivo se achicó después de anunciar Content-Length
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "file truncated while sending",
                        ));
                    }
                    writer.write_all(&chunk[..n])?;
                    remaining -= n as u64;
                    written += n as u64;
                }
            }
        }

        Ok(written)
    }

    /// Escribe solo status line y headers (respuesta a HEAD)
    ///
    /// `Content-Length` sigue anunciando el tamaño del body que no se envía.
    pub fn write_head_to<W: Write>(&self, writer: &mut W) -> io::Result<u64> {
        let head = self.head_bytes();
        writer.write_all(&head)?;
        Ok(head.len() as u64)
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Busca un header por nombre (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body en memoria, o `None` si es un archivo
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Bytes(bytes) => Some(bytes),
            Body::File { .. } => None,
        }
    }
}
