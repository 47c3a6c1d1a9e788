//! # Prefork HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 multiproceso: un supervisor crea un pool fijo de
//! procesos worker con `fork()`, todos aceptando conexiones del mismo
//! socket. Los contadores globales viven en una región de memoria
//! compartida (`mmap`) visible para todos los procesos.
//!
//! ## Arquitectura
//!
//! - `http`: parsing del request line y serialización de responses
//! - `router`: enrutamiento de paths a handlers
//! - `commands`: handlers de `/static/*`, `/stats` y `/calc`
//! - `metrics`: contadores compartidos entre procesos
//! - `server`: workers, supervisor y apagado
//! - `config`: argumentos CLI y variables de entorno
//! - `error`: errores fatales de arranque
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use prefork_httpd::config::Config;
//! use prefork_httpd::server::Server;
//!
//! let mut config = Config::default();
//! config.port = 8080;
//! config.workers = 4;
//! Server::new(config).run().expect("Error al iniciar servidor");
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod router;
pub mod server;

pub use error::{Result, ServerError};
