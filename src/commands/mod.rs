//! # Comandos del Servidor
//!
//! Handlers de las rutas que atiende cada worker:
//!
//! - **static_files**: `/static/*` sirve archivos del directorio raíz
//! - **stats**: `/stats` muestra los contadores compartidos
//! - **calc**: `/calc?a=&b=` suma dos enteros
//!
//! Cada comando es una función handler que recibe un Request y el
//! contexto del worker, y retorna una Response.

pub mod calc;
pub mod static_files;
pub mod stats;

use crate::router::Router;

pub use calc::calc_handler;
pub use static_files::static_handler;
pub use stats::stats_handler;

/// Router con las rutas del servidor
pub fn default_router() -> Router {
    let mut router = Router::new();
    router.register_prefix("/static/", static_handler);
    router.register("/stats", stats_handler);
    router.register("/calc", calc_handler);
    router
}
