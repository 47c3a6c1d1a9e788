//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor prefork: el proceso padre abre el socket y la región de
//! contadores, crea N workers con `fork()` y los vigila.
//!
//! 1. Validar configuración
//! 2. Bind del socket de escucha
//! 3. Mapear los contadores compartidos
//! 4. Bloquear señales de control y crear el pool
//! 5. Supervisar hasta SIGINT/SIGTERM
//! 6. Apagar workers y liberar recursos

pub mod shutdown;
pub mod supervisor;
pub mod worker;

pub use shutdown::{ControlSignals, RunningFlag};
pub use supervisor::{Supervisor, WorkerRecord, WorkerTable};
pub use worker::{handle_connection, Worker};

use crate::commands;
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::metrics::SharedCounters;
use crate::router::Router;
use std::net::TcpListener;

/// Servidor HTTP/1.0 prefork
pub struct Server {
    config: Config,
    router: Router,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            router: commands::default_router(),
        }
    }

    /// Corre el servidor hasta recibir SIGINT/SIGTERM
    ///
    /// Retorna `Ok(())` tras un apagado limpio. Cualquier error de arranque
    /// (configuración, bind, mmap, señales, fork inicial) se retorna sin
    /// dejar workers vivos.
    pub fn run(self) -> Result<()> {
        self.config.validate().map_err(ServerError::Config)?;

        let address = self.config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;
        match listener.local_addr() {
            Ok(local) => tracing::info!(addr = %local, "Escuchando"),
            Err(_) => tracing::info!(addr = %address, "Escuchando"),
        }

        let counters = SharedCounters::new().map_err(ServerError::SharedMemory)?;
        let control = ControlSignals::block().map_err(ServerError::Signal)?;

        let mut supervisor = Supervisor::new(
            &listener,
            &counters,
            &self.router,
            &self.config.root,
            control,
            self.config.workers,
        );

        if let Err(e) = supervisor.start() {
            supervisor.shutdown(self.config.shutdown_grace());
            return Err(e);
        }

        supervisor.supervise();
        supervisor.shutdown(self.config.shutdown_grace());

        let snapshot = counters.snapshot();
        tracing::info!(
            respawns = supervisor.respawns(),
            total_requests = snapshot.total_requests,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            "Servidor detenido"
        );

        // Sin workers vivos ya se puede liberar la región y el socket
        drop(supervisor);
        drop(counters);
        drop(listener);
        Ok(())
    }
}
