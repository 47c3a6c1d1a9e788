//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea paths HTTP a handlers.
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Hay dos tipos de ruta: exacta (`/stats`) y por prefijo (`/static/`).
//! Las rutas se prueban en orden de registro; si ninguna coincide se
//! retorna 404 Not Found.

use crate::http::{Request, Response};
use crate::metrics::SharedCounters;
use std::path::Path;

/// Lo que un handler puede consultar además del request
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Contadores compartidos (para /stats)
    pub counters: &'a SharedCounters,

    /// Directorio raíz para /static/*
    pub root: &'a Path,
}

/// Tipo de función handler
///
/// Un handler recibe un Request y el contexto, y retorna una Response
pub type Handler = fn(&Request, &RequestContext<'_>) -> Response;

/// Cómo se compara el path con la ruta registrada
#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Exact(String),
    Prefix(String),
}

impl Matcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Exact(route) => route == path,
            Matcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Router que mapea paths a handlers
pub struct Router {
    routes: Vec<(Matcher, Handler)>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta exacta
    ///
    /// # Ejemplo
    /// ```
    /// use prefork_httpd::router::{RequestContext, Router};
    /// use prefork_httpd::http::{Request, Response};
    ///
    /// fn hello_handler(_req: &Request, _ctx: &RequestContext) -> Response {
    ///     Response::html("<p>hello</p>")
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register("/hello", hello_handler);
    /// ```
    pub fn register(&mut self, path: &str, handler: Handler) {
        self.routes.push((Matcher::Exact(path.to_string()), handler));
    }

    /// Registra una ruta que acepta cualquier path con ese prefijo
    pub fn register_prefix(&mut self, prefix: &str, handler: Handler) {
        self.routes.push((Matcher::Prefix(prefix.to_string()), handler));
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// Si no encuentra un handler para el path, retorna 404 Not Found.
    pub fn route(&self, request: &Request, ctx: &RequestContext<'_>) -> Response {
        let path = request.path();

        let mut response = self
            .routes
            .iter()
            .find(|(matcher, _)| matcher.matches(path))
            .map(|(_, handler)| handler(request, ctx))
            .unwrap_or_else(Response::not_found);

        add_common_headers(&mut response);
        response
    }

}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Agrega headers comunes a todas las respuestas
pub fn add_common_headers(response: &mut Response) {
    response.add_header("Server", "prefork_httpd/0.1");
    response.add_header("Connection", "close");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use std::path::PathBuf;

    fn exact_handler(_req: &Request, _ctx: &RequestContext<'_>) -> Response {
        Response::html("exact")
    }

    fn prefix_handler(req: &Request, _ctx: &RequestContext<'_>) -> Response {
        Response::html(req.path())
    }

    fn route(router: &Router, raw: &[u8]) -> Response {
        let counters = SharedCounters::new().unwrap();
        let root = PathBuf::from(".");
        let ctx = RequestContext { counters: &counters, root: &root };
        router.route(&Request::parse(raw).unwrap(), &ctx)
    }

    #[test]
    fn test_empty_router_is_404() {
        let router = Router::new();
        let response = route(&router, b"GET /stats HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_exact_route() {
        let mut router = Router::new();
        router.register("/stats", exact_handler);

        let response = route(&router, b"GET /stats HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::Ok);

        // Exacta: /stats/extra no coincide
        let response = route(&router, b"GET /stats/extra HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_exact_route_ignores_query() {
        let mut router = Router::new();
        router.register("/calc", exact_handler);

        let response = route(&router, b"GET /calc?a=1 HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::Ok);
    }

    #[test]
    fn test_prefix_route() {
        let mut router = Router::new();
        router.register_prefix("/static/", prefix_handler);

        let response = route(&router, b"GET /static/css/site.css HTTP/1.0\r\n\r\n");
        assert_eq!(response.body_bytes(), Some(&b"/static/css/site.css"[..]));

        let response = route(&router, b"GET /static HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_route_not_found_body() {
        let router = Router::new();
        let response = route(&router, b"GET /nonexistent HTTP/1.0\r\n\r\n");

        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body_bytes(), Some(&b"Not Found"[..]));
        assert_eq!(response.header("Connection"), Some("close"));
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::new();
        router.register_prefix("/", prefix_handler);
        router.register("/stats", exact_handler);

        let response = route(&router, b"GET /stats HTTP/1.0\r\n\r\n");
        assert_eq!(response.body_bytes(), Some(&b"/stats"[..]));
    }
}
