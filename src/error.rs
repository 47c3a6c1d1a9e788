//! # Errores del Servidor
//! src/error.rs
//!
//! Errores fatales de arranque. Cualquiera de ellos termina el proceso
//! con código distinto de cero; los errores por conexión nunca llegan aquí.

use thiserror::Error;

/// Errores que abortan el servidor completo
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuración inválida (workers = 0, etc.)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No se pudo crear/bindear el socket de escucha
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// mmap de la región compartida falló
    #[error("shared memory allocation failed: {0}")]
    SharedMemory(#[source] std::io::Error),

    /// fork() falló al crear el pool inicial
    #[error("fork failed for slot {slot}: {source}")]
    Fork {
        slot: usize,
        #[source]
        source: nix::Error,
    },

    /// No se pudieron instalar los handlers de SIGINT/SIGTERM
    #[error("signal handler installation failed: {0}")]
    Signal(#[source] nix::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_config() {
        let err = ServerError::Config("workers must be >= 1".to_string());
        assert_eq!(err.to_string(), "invalid configuration: workers must be >= 1");
    }

    #[test]
    fn test_display_bind_includes_address() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let text = err.to_string();
        assert!(text.contains("0.0.0.0:80"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_fork_error_source() {
        use std::error::Error as _;
        let err = ServerError::Fork { slot: 3, source: nix::Error::EAGAIN };
        assert!(err.to_string().contains("slot 3"));
        assert!(err.source().is_some());
    }
}
