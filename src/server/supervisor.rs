//! # Supervisor del Pool de Workers
//! src/server/supervisor.rs
//!
//! El proceso padre crea N workers con `fork()`, todos heredando el mismo
//! socket de escucha y la misma región de contadores. Después se queda
//! esperando señales de control:
//!
//! ```text
//!            ┌──────────── SIGCHLD ────────────┐
//!            ▼                                 │
//!   wait ─► reap (WNOHANG) ─► running? ─► fork en el mismo slot
//!            │                    │
//!            │                    └─ no ─► quitar registro
//!            └── SIGINT/SIGTERM ─► running = false ─► apagado
//! ```
//!
//! Un worker que termina limpio y uno que crashea se tratan igual: se
//! re-crea en cuanto se detecta, sin backoff.

use super::shutdown::{self, ControlEvent, ControlSignals, RunningFlag};
use super::worker::Worker;
use crate::error::{Result, ServerError};
use crate::metrics::SharedCounters;
use crate::router::{RequestContext, Router};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::net::TcpListener;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Duration;

/// Un worker vivo: su pid y el slot que ocupa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRecord {
    pub pid: Pid,
    pub slot: usize,
}

/// Tabla slot → pid del supervisor
#[derive(Debug, Clone, Default)]
pub struct WorkerTable {
    slots: Vec<Option<Pid>>,
}

impl WorkerTable {
    /// Tabla con `n` slots vacíos
    pub fn with_slots(n: usize) -> Self {
        Self {
            slots: vec![None; n],
        }
    }

    /// Número de slots (tamaño fijo del pool)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Registra `pid` en `slot`; retorna el pid anterior si había uno
    pub fn assign(&mut self, slot: usize, pid: Pid) -> Option<Pid> {
        self.slots[slot].replace(pid)
    }

    /// Slot que ocupa `pid`
    pub fn slot_of(&self, pid: Pid) -> Option<usize> {
        self.slots.iter().position(|entry| *entry == Some(pid))
    }

    /// Quita `pid` de la tabla; retorna el slot que ocupaba
    pub fn remove_pid(&mut self, pid: Pid) -> Option<usize> {
        let slot = self.slot_of(pid)?;
        self.slots[slot] = None;
        Some(slot)
    }

    pub fn clear_all(&mut self) {
        self.slots.iter_mut().for_each(|entry| *entry = None);
    }

    /// Workers registrados
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn records(&self) -> impl Iterator<Item = WorkerRecord> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.map(|pid| WorkerRecord { pid, slot }))
    }

    pub fn vacant_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_none())
            .map(|(slot, _)| slot)
            .collect()
    }
}

/// Supervisor: crea, vigila y re-crea los workers
pub struct Supervisor<'a> {
    listener: &'a TcpListener,
    counters: &'a SharedCounters,
    router: &'a Router,
    root: &'a Path,
    control: ControlSignals,
    running: RunningFlag,
    table: WorkerTable,
    respawns: u64,
}

impl<'a> Supervisor<'a> {
    pub fn new(
        listener: &'a TcpListener,
        counters: &'a SharedCounters,
        router: &'a Router,
        root: &'a Path,
        control: ControlSignals,
        workers: usize,
    ) -> Self {
        Self {
            listener,
            counters,
            router,
            root,
            control,
            running: RunningFlag::new(),
            table: WorkerTable::with_slots(workers),
            respawns: 0,
        }
    }

    /// Crea el pool inicial (un fork por slot)
    ///
    /// # Errores
    ///
    /// Un fork fallido aquí es fatal. Los workers ya creados quedan en la
    /// tabla para que el llamador los apague.
    pub fn start(&mut self) -> Result<()> {
        for slot in 0..self.table.capacity() {
            let pid = self
                .spawn(slot)
                .map_err(|source| ServerError::Fork { slot, source })?;
            self.table.assign(slot, pid);
            tracing::debug!(slot, pid = pid.as_raw(), "Worker creado");
        }
        tracing::info!(workers = self.table.live(), "Pool de workers iniciado");
        Ok(())
    }

    /// Bucle principal: re-crea workers hasta recibir SIGINT/SIGTERM
    pub fn supervise(&mut self) {
        while self.running.is_running() {
            match self.control.wait() {
                Ok(ControlEvent::WorkerExited) => self.reap_and_respawn(),
                Ok(ControlEvent::Shutdown(sig)) => {
                    tracing::info!(signal = ?sig, "Señal de apagado recibida");
                    self.running.stop();
                }
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    // Sin sigwait no hay forma de vigilar el pool
                    tracing::error!(error = %e, "sigwait falló; iniciando apagado");
                    self.running.stop();
                }
            }
        }
    }

    /// Apaga el pool (ver [`shutdown::shutdown_workers`])
    pub fn shutdown(&mut self, grace: Duration) {
        shutdown::shutdown_workers(&mut self.table, &self.running, grace);
        tracing::info!("Todos los workers terminaron");
    }

    pub fn respawns(&self) -> u64 {
        self.respawns
    }

    /// Recoge todos los hijos terminados y re-crea cada uno en su slot
    fn reap_and_respawn(&mut self) {
        loop {
            match waitpid(None::<Pid>, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if let Some(pid) = status.pid() {
                        self.on_worker_exit(pid, status);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "waitpid falló");
                    break;
                }
            }
        }

        // Slots que quedaron vacíos por un fork fallido antes
        for slot in self.table.vacant_slots() {
            self.respawn(slot);
        }
    }

    fn on_worker_exit(&mut self, pid: Pid, status: WaitStatus) {
        let Some(slot) = self.table.remove_pid(pid) else {
            tracing::debug!(pid = pid.as_raw(), ?status, "Hijo desconocido recogido");
            return;
        };

        if !self.running.is_running() {
            tracing::debug!(slot, pid = pid.as_raw(), "Worker recogido durante el apagado");
            return;
        }

        tracing::warn!(slot, pid = pid.as_raw(), ?status, "Worker terminó; re-creando");
        self.respawn(slot);
    }

    fn respawn(&mut self, slot: usize) {
        if !self.running.is_running() {
            return;
        }
        match self.spawn(slot) {
            Ok(pid) => {
                self.table.assign(slot, pid);
                self.respawns += 1;
                tracing::info!(slot, pid = pid.as_raw(), "Worker re-creado");
            }
            Err(e) => {
                // Se reintenta en el próximo SIGCHLD
                tracing::error!(slot, error = %e, "fork falló; el slot queda vacío");
            }
        }
    }

    fn spawn(&self, slot: usize) -> nix::Result<Pid> {
        // SAFETY: el supervisor no crea threads, el hijo no hereda locks tomados.
        match unsafe { fork() }? {
            ForkResult::Parent { child } => Ok(child),
            ForkResult::Child => self.run_child(slot),
        }
    }

    /// Cuerpo del proceso hijo; nunca retorna
    fn run_child(&self, slot: usize) -> ! {
        let running = self.running.clone();

        if let Err(e) = shutdown::install_worker_handlers(&running)
            .and_then(|()| self.control.unblock())
        {
            tracing::error!(slot, error = %e, "No se pudieron instalar las señales del worker");
            std::process::exit(1);
        }

        let ctx = RequestContext {
            counters: self.counters,
            root: self.root,
        };
        let code = worker_exit_code(|| {
            Worker::new(slot, self.listener, self.router, ctx, &running).run();
        });

        std::process::exit(code)
    }
}

/// Corre el cuerpo de un worker y lo traduce a código de salida
///
/// Un panic se detiene aquí (código 1): el hijo nunca vuelve a los frames
/// del supervisor que heredó del `fork()`.
fn worker_exit_code(body: impl FnOnce()) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => 0,
        Err(_) => {
            tracing::error!("Worker terminó con panic");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = WorkerTable::with_slots(3);
        assert_eq!(table.capacity(), 3);
        assert_eq!(table.live(), 0);
        assert_eq!(table.vacant_slots(), vec![0, 1, 2]);
    }

    #[test]
    fn test_assign_and_lookup() {
        let mut table = WorkerTable::with_slots(3);
        assert_eq!(table.assign(0, pid(100)), None);
        table.assign(2, pid(102));

        assert_eq!(table.slot_of(pid(100)), Some(0));
        assert_eq!(table.slot_of(pid(102)), Some(2));
        assert_eq!(table.slot_of(pid(999)), None);
        assert_eq!(table.live(), 2);
        assert_eq!(table.vacant_slots(), vec![1]);
    }

    #[test]
    fn test_respawn_replaces_record_in_same_slot() {
        let mut table = WorkerTable::with_slots(2);
        table.assign(0, pid(10));
        table.assign(1, pid(11));

        // Muere el worker del slot 1 y se re-crea con otro pid
        let slot = table.remove_pid(pid(11)).unwrap();
        assert_eq!(slot, 1);
        assert_eq!(table.live(), 1);
        table.assign(slot, pid(12));

        assert_eq!(table.live(), 2);
        assert_eq!(table.slot_of(pid(12)), Some(1));
        assert_eq!(table.slot_of(pid(11)), None);
    }

    #[test]
    fn test_assign_returns_previous() {
        let mut table = WorkerTable::with_slots(1);
        table.assign(0, pid(1));
        assert_eq!(table.assign(0, pid(2)), Some(pid(1)));
    }

    #[test]
    fn test_records_in_slot_order() {
        let mut table = WorkerTable::with_slots(3);
        table.assign(2, pid(30));
        table.assign(0, pid(10));

        let records: Vec<_> = table.records().collect();
        assert_eq!(
            records,
            vec![
                WorkerRecord { pid: pid(10), slot: 0 },
                WorkerRecord { pid: pid(30), slot: 2 },
            ]
        );
    }

    #[test]
    fn test_clear_all() {
        let mut table = WorkerTable::with_slots(2);
        table.assign(0, pid(1));
        table.assign(1, pid(2));

        table.clear_all();
        assert_eq!(table.live(), 0);
        assert_eq!(table.vacant_slots(), vec![0, 1]);
    }

    #[test]
    fn test_remove_unknown_pid() {
        let mut table = WorkerTable::with_slots(1);
        table.assign(0, pid(5));
        assert_eq!(table.remove_pid(pid(6)), None);
        assert_eq!(table.live(), 1);
    }

    #[test]
    fn test_worker_exit_code() {
        assert_eq!(worker_exit_code(|| {}), 0);
        assert_eq!(worker_exit_code(|| panic!("worker roto")), 1);
    }

    #[test]
    fn test_panicking_child_exits_with_status_1() {
        // SAFETY: el hijo solo corre el closure y termina con _exit.
        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                let code = worker_exit_code(|| panic!("worker roto"));
                unsafe { libc::_exit(code) };
            }
            ForkResult::Parent { child } => {
                assert_eq!(waitpid(child, None).unwrap(), WaitStatus::Exited(child, 1));
            }
        }
    }
}
