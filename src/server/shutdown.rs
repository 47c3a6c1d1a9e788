//! # Señales y Apagado
//! src/server/shutdown.rs
//!
//! Dos formas de recibir SIGINT/SIGTERM:
//!
//! - **Supervisor**: las señales de control (SIGCHLD, SIGINT, SIGTERM) se
//!   bloquean y se consumen de forma síncrona con `sigwait`, así no hay
//!   carrera entre revisar el flag y bloquearse esperando hijos.
//! - **Workers**: tras el `fork()` se desbloquean y se instala un handler
//!   que solo pone el `RunningFlag` en false. El handler se instala sin
//!   `SA_RESTART` para que un `accept` bloqueado retorne `EINTR`.
//!
//! El apagado envía SIGTERM a cada worker registrado, espera hasta el
//! periodo de gracia y remata con SIGKILL a los que sigan vivos.

use super::supervisor::WorkerTable;
use nix::errno::Errno;
use nix::sys::signal::{self, kill, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Señales que disparan el apagado
pub const SHUTDOWN_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

/// Intervalo de sondeo mientras se espera a los workers
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Flag que el handler de señales del worker pone en false
static SHUTDOWN_TARGET: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Flag de "el servidor sigue corriendo"
///
/// Empieza en true y pasa a false una sola vez. Los clones comparten el
/// mismo flag dentro de un proceso; después de `fork()` cada proceso
/// tiene su propia copia.
#[derive(Debug, Clone)]
pub struct RunningFlag {
    running: Arc<AtomicBool>,
}

impl RunningFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pasa el flag a false. Retorna true solo para la primera llamada.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

extern "C" fn on_shutdown_signal(_signal: libc::c_int) {
    // Solo un store atómico: es async-signal-safe.
    if let Some(running) = SHUTDOWN_TARGET.get() {
        running.store(false, Ordering::SeqCst);
    }
}

/// Instala el handler de SIGINT/SIGTERM de un worker
///
/// Se llama una vez por proceso worker, justo después del `fork()`.
/// Si ya había un flag registrado en este proceso se conserva el primero.
pub fn install_worker_handlers(flag: &RunningFlag) -> nix::Result<()> {
    let _ = SHUTDOWN_TARGET.set(Arc::clone(&flag.running));

    let action = SigAction::new(
        SigHandler::Handler(on_shutdown_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for sig in SHUTDOWN_SIGNALS {
        // SAFETY: el handler solo hace un store atómico.
        unsafe { signal::sigaction(sig, &action)? };
    }
    Ok(())
}

/// Evento que despierta al supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// SIGCHLD: al menos un worker terminó
    WorkerExited,

    /// SIGINT o SIGTERM
    Shutdown(Signal),
}

/// Señales de control bloqueadas en el supervisor
#[derive(Debug)]
pub struct ControlSignals {
    set: SigSet,
}

impl ControlSignals {
    /// Bloquea SIGCHLD, SIGINT y SIGTERM en el thread actual
    ///
    /// Debe llamarse antes del primer `fork()`: los hijos heredan la
    /// máscara y la desbloquean con [`ControlSignals::unblock`].
    pub fn block() -> nix::Result<Self> {
        let mut set = SigSet::empty();
        set.add(Signal::SIGCHLD);
        for sig in SHUTDOWN_SIGNALS {
            set.add(sig);
        }
        set.thread_block()?;
        Ok(Self { set })
    }

    /// Espera (bloqueando) la siguiente señal de control
    pub fn wait(&self) -> nix::Result<ControlEvent> {
        match self.set.wait()? {
            Signal::SIGCHLD => Ok(ControlEvent::WorkerExited),
            other => Ok(ControlEvent::Shutdown(other)),
        }
    }

    /// Desbloquea las señales (en el hijo después del fork)
    pub fn unblock(&self) -> nix::Result<()> {
        self.set.thread_unblock()
    }
}

/// Envía `sig` a cada worker registrado; retorna a cuántos llegó
pub fn signal_all(table: &WorkerTable, sig: Signal) -> usize {
    let mut delivered = 0;
    for record in table.records() {
        match kill(record.pid, sig) {
            Ok(()) => delivered += 1,
            // Ya terminó y fue recogido por alguien más
            Err(Errno::ESRCH) => {}
            Err(e) => tracing::warn!(slot = record.slot, pid = record.pid.as_raw(), error = %e, "kill falló"),
        }
    }
    delivered
}

/// Secuencia de apagado del pool
///
/// 1. `running` ← false (sin efecto si ya lo estaba)
/// 2. SIGTERM a cada worker registrado
/// 3. Recoger workers hasta que no quede ninguno o venza `grace`
/// 4. SIGKILL a los restantes y recogerlos
///
/// Al terminar la tabla queda vacía.
pub fn shutdown_workers(table: &mut WorkerTable, running: &RunningFlag, grace: Duration) {
    running.stop();

    let signaled = signal_all(table, Signal::SIGTERM);
    tracing::info!(workers = signaled, "SIGTERM enviado a los workers");

    let deadline = Instant::now() + grace;
    reap_until(table, deadline);

    if table.live() > 0 {
        tracing::warn!(
            remaining = table.live(),
            grace_ms = grace.as_millis() as u64,
            "Workers siguen vivos tras el periodo de gracia; enviando SIGKILL"
        );
        signal_all(table, Signal::SIGKILL);
        reap_blocking(table);
    }
}

/// Recoge workers sin bloquear hasta vaciar la tabla o llegar a `deadline`
fn reap_until(table: &mut WorkerTable, deadline: Instant) {
    while table.live() > 0 {
        match waitpid(None::<Pid>, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                if Instant::now() >= deadline {
                    return;
                }
                thread::sleep(REAP_POLL_INTERVAL);
            }
            Ok(status) => {
                if let Some(pid) = status.pid() {
                    if let Some(slot) = table.remove_pid(pid) {
                        tracing::debug!(slot, pid = pid.as_raw(), ?status, "Worker recogido");
                    }
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                // No quedan hijos: lo que quede en la tabla ya no existe
                table.clear_all();
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "waitpid falló durante el apagado");
                return;
            }
        }
    }
}

/// Espera uno a uno a los workers que sigan en la tabla
fn reap_blocking(table: &mut WorkerTable) {
    let pids: Vec<Pid> = table.records().map(|record| record.pid).collect();
    for pid in pids {
        loop {
            match waitpid(pid, None) {
                Err(Errno::EINTR) => continue,
                Ok(_) | Err(_) => break,
            }
        }
        table.remove_pid(pid);
    }
}
