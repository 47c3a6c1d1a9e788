//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor multiproceso con soporte para argumentos CLI
//! y variables de entorno. Todo se fija al arrancar: el tamaño del pool no
//! cambia mientras el servidor corre.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./prefork_httpd --port 8080 --workers 8 --root ./public
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKERS=4 ./prefork_httpd
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Número de procesos worker por defecto
pub const DEFAULT_WORKERS: usize = 20;

/// Límite superior razonable para el pool
pub const MAX_WORKERS: usize = 1024;

/// Configuración del servidor HTTP/1.0 multiproceso
#[derive(Debug, Clone, Parser)]
#[command(name = "prefork_httpd")]
#[command(about = "Servidor HTTP/1.0 con pool fijo de procesos worker y supervisor")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "80", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Número de procesos worker que comparten el socket
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, env = "WORKERS")]
    pub workers: usize,

    /// Directorio raíz desde el que se sirven las rutas /static/*
    #[arg(long, default_value = ".", env = "DOC_ROOT")]
    pub root: PathBuf,

    /// Tiempo máximo (ms) que el supervisor espera a los workers al apagar
    /// antes de enviarles SIGKILL
    #[arg(long = "shutdown-grace-ms", default_value = "5000", env = "SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: u64,

    /// Nivel de log cuando RUST_LOG no está definido
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use prefork_httpd::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.port = 8080;
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Periodo de gracia del apagado
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.workers > MAX_WORKERS {
            return Err(format!("Workers must be <= {}", MAX_WORKERS));
        }
        if self.shutdown_grace_ms == 0 {
            return Err("Shutdown grace must be > 0".to_string());
        }
        Ok(())
    }

    /// Registra un resumen de la configuración efectiva
    pub fn print_summary(&self) {
        tracing::info!(
            address = %self.address(),
            workers = self.workers,
            root = %self.root.display(),
            shutdown_grace_ms = self.shutdown_grace_ms,
            "Configuración cargada"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 80,
            host: "0.0.0.0".to_string(),
            workers: DEFAULT_WORKERS,
            root: PathBuf::from("."),
            shutdown_grace_ms: 5_000,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 80);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.workers, 20);
        assert_eq!(config.root, PathBuf::from("."));
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = Config::default();
        config.workers = 0;
        let result = config.validate();
        assert!(result.unwrap_err().contains("Workers"));
    }

    #[test]
    fn test_validate_too_many_workers() {
        let mut config = Config::default();
        config.workers = MAX_WORKERS + 1;
        assert!(config.validate().is_err());

        config.workers = MAX_WORKERS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_grace() {
        let mut config = Config::default();
        config.shutdown_grace_ms = 0;
        assert!(config.validate().unwrap_err().contains("Shutdown grace"));
    }

    #[test]
    fn test_shutdown_grace_duration() {
        let mut config = Config::default();
        config.shutdown_grace_ms = 250;
        assert_eq!(config.shutdown_grace(), Duration::from_millis(250));
    }

    // ==================== CLI ====================

    #[test]
    fn test_parse_cli_flags() {
        let config = Config::try_parse_from([
            "prefork_httpd", "-p", "8080", "-w", "4", "--root", "/srv/www",
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.workers, 4);
        assert_eq!(config.root, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_parse_cli_rejects_bad_port() {
        let result = Config::try_parse_from(["prefork_httpd", "--port", "notaport"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_print_summary() {
        // No debe hacer panic sin subscriber instalado
        Config::default().print_summary();
    }
}
