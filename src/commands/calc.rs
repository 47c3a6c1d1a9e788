//! # Calculadora
//! src/commands/calc.rs
//!
//! `GET /calc?a=N&b=M` responde una página con `N + M = suma`.
//! Parámetros ausentes o inválidos valen 0.

use crate::http::{Request, Response};
use crate::router::RequestContext;

/// Handler para /calc?a=&b=
///
/// # Ejemplo de response
/// ```text
/// <html><body><h1>Calculator Result</h1><p>3 + 4 = 7</p></body></html>
/// ```
pub fn calc_handler(req: &Request, _ctx: &RequestContext<'_>) -> Response {
    let a = req.query_param("a").map(parse_leading_int).unwrap_or(0);
    let b = req.query_param("b").map(parse_leading_int).unwrap_or(0);

    Response::html(&render_html(a, b))
}

/// Página HTML del resultado
pub fn render_html(a: i64, b: i64) -> String {
    format!(
        "<html><body>\
         <h1>Calculator Result</h1>\
         <p>{} + {} = {}</p>\
         </body></html>",
        a,
        b,
        a.saturating_add(b)
    )
}

/// Parsea como `atoi`: espacios iniciales, signo opcional y los dígitos
/// que siguen. Si no hay dígitos retorna 0. Satura en los límites de i64.
///
/// # Ejemplo
/// ```
/// use prefork_httpd::commands::calc::parse_leading_int;
///
/// assert_eq!(parse_leading_int("42"), 42);
/// assert_eq!(parse_leading_int("  -7xyz"), -7);
/// assert_eq!(parse_leading_int("abc"), 0);
/// ```
pub fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SharedCounters;
    use std::path::Path;

    fn calc(raw: &[u8]) -> String {
        let counters = SharedCounters::new().unwrap();
        let ctx = RequestContext { counters: &counters, root: Path::new(".") };
        let response = calc_handler(&Request::parse(raw).unwrap(), &ctx);
        String::from_utf8(response.body_bytes().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_sum() {
        assert!(calc(b"GET /calc?a=3&b=4 HTTP/1.0\r\n\r\n").contains("3 + 4 = 7"));
    }

    #[test]
    fn test_no_query_defaults_to_zero() {
        assert!(calc(b"GET /calc HTTP/1.0\r\n\r\n").contains("0 + 0 = 0"));
    }

    #[test]
    fn test_missing_and_malformed_params() {
        assert!(calc(b"GET /calc?a=5 HTTP/1.0\r\n\r\n").contains("5 + 0 = 5"));
        assert!(calc(b"GET /calc?a=foo&b=2 HTTP/1.0\r\n\r\n").contains("0 + 2 = 2"));
        assert!(calc(b"GET /calc?b=-10&a=12abc HTTP/1.0\r\n\r\n").contains("12 + -10 = 2"));
    }

    #[test]
    fn test_page_title() {
        assert!(calc(b"GET /calc?a=1&b=1 HTTP/1.0\r\n\r\n").contains("<h1>Calculator Result</h1>"));
    }

    #[test]
    fn test_parse_leading_int_edges() {
        assert_eq!(parse_leading_int(""), 0);
        assert_eq!(parse_leading_int("-"), 0);
        assert_eq!(parse_leading_int("+15"), 15);
        assert_eq!(parse_leading_int("99999999999999999999999"), i64::MAX);
        assert_eq!(parse_leading_int("-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_sum_saturates() {
        assert!(render_html(i64::MAX, 1).contains(&format!("= {}", i64::MAX)));
    }
}
