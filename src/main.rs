//! # Prefork HTTP Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa el logging y corre el supervisor.
//! Código de salida 0 tras un apagado limpio, 1 ante un error de arranque.

use prefork_httpd::config::Config;
use prefork_httpd::server::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let config = Config::new();

    // RUST_LOG tiene prioridad sobre --log-level
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(fmt::layer())
        .init();

    config.print_summary();

    if let Err(e) = Server::new(config).run() {
        tracing::error!(error = %e, "Error fatal");
        std::process::exit(1);
    }
}
