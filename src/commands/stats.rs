//! # Estadísticas
//! src/commands/stats.rs
//!
//! `GET /stats` muestra los contadores compartidos en HTML.
//! `GET /stats?format=json` retorna el mismo snapshot en JSON.

use crate::http::{Request, Response, StatusCode};
use crate::metrics::CountersSnapshot;
use crate::router::RequestContext;

/// Handler para /stats
pub fn stats_handler(req: &Request, ctx: &RequestContext<'_>) -> Response {
    let snapshot = ctx.counters.snapshot();

    if req.query_param("format") == Some("json") {
        return match serde_json::to_string(&snapshot) {
            Ok(body) => Response::json(&body),
            Err(e) => Response::error(StatusCode::InternalServerError, &e.to_string()),
        };
    }

    Response::html(&render_html(&snapshot))
}

/// Página HTML con los tres contadores
pub fn render_html(snapshot: &CountersSnapshot) -> String {
    format!(
        "<html><body>\
         <h1>Server Statistics</h1>\
         <p>Total Requests: {}</p>\
         <p>Bytes Received: {}</p>\
         <p>Bytes Sent: {}</p>\
         </body></html>",
        snapshot.total_requests, snapshot.bytes_received, snapshot.bytes_sent
    )
}
