//! # Contadores en Memoria Compartida
//! src/metrics/shared.rs
//!
//! Tres contadores monótonos (requests, bytes recibidos, bytes enviados)
//! en una página `mmap(MAP_SHARED | MAP_ANONYMOUS)`. La región se crea una
//! vez en el supervisor antes de hacer `fork()`, así que todos los workers
//! (incluidos los que se re-crean) ven la misma memoria física.
//!
//! No hay locks: cada campo es un `AtomicU64` y se actualiza con
//! `fetch_add`. Un snapshot lee cada campo de forma atómica, pero los tres
//! valores no forman una foto consistente entre sí.

use serde::Serialize;
use std::io;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};

/// Layout fijo de la región compartida
#[repr(C)]
struct CounterBlock {
    total_requests: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
}

/// Contador a incrementar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    TotalRequests,
    BytesReceived,
    BytesSent,
}

/// Lectura de los tres contadores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub total_requests: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Handle a la región de contadores compartida entre procesos
///
/// El handle vive en el supervisor y se hereda por `fork()`. Al hacer
/// drop (solo en el supervisor, al final del apagado) se hace `munmap`.
pub struct SharedCounters {
    block: NonNull<CounterBlock>,
}

// La región solo contiene atómicos; compartirla entre threads es seguro.
unsafe impl Send for SharedCounters {}
unsafe impl Sync for SharedCounters {}

impl SharedCounters {
    /// Reserva la región compartida, inicializada en cero por el kernel
    ///
    /// # Errores
    ///
    /// Retorna el error de `mmap` (ej: memoria insuficiente).
    pub fn new() -> io::Result<Self> {
        // MAP_ANONYMOUS no necesita fd; MAP_SHARED la hace visible tras fork().
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                mem::size_of::<CounterBlock>(),
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let block = NonNull::new(ptr as *mut CounterBlock)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;

        Ok(Self { block })
    }

    fn block(&self) -> &CounterBlock {
        // SAFETY: el mapping vive hasta Drop y solo contiene atómicos.
        unsafe { self.block.as_ref() }
    }

    fn cell(&self, counter: Counter) -> &AtomicU64 {
        let block = self.block();
        match counter {
            Counter::TotalRequests => &block.total_requests,
            Counter::BytesReceived => &block.bytes_received,
            Counter::BytesSent => &block.bytes_sent,
        }
    }

    /// Suma `amount` al contador con `fetch_add`
    ///
    /// # Ejemplo
    /// ```
    /// use prefork_httpd::metrics::{Counter, SharedCounters};
    ///
    /// let counters = SharedCounters::new().unwrap();
    /// counters.increment(Counter::BytesSent, 42);
    /// assert_eq!(counters.get(Counter::BytesSent), 42);
    /// ```
    pub fn increment(&self, counter: Counter, amount: u64) {
        // Los campos son independientes: no hace falta ordenar entre ellos.
        self.cell(counter).fetch_add(amount, Ordering::Relaxed);
    }

    /// Lee un contador
    pub fn get(&self, counter: Counter) -> u64 {
        self.cell(counter).load(Ordering::Relaxed)
    }

    /// Lee los tres contadores (cada uno de forma atómica)
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            total_requests: self.get(Counter::TotalRequests),
            bytes_received: self.get(Counter::BytesReceived),
            bytes_sent: self.get(Counter::BytesSent),
        }
    }
}

impl Drop for SharedCounters {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(
                self.block.as_ptr() as *mut libc::c_void,
                mem::size_of::<CounterBlock>(),
            );
        }
    }
}

impl std::fmt::Debug for SharedCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCounters")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
