//! # Worker (RequestDispatcher)
//! src/server/worker.rs
//!
//! Bucle de cada proceso worker. Todos los workers hacen `accept` sobre el
//! mismo socket heredado; el kernel decide cuál recibe cada conexión.
//!
//! ```text
//! Idle → Accepted → RequestRead → Routed → ResponseSent → Closed → Idle
//!                        │
//!                        └─ read == 0 / error ──────────────► Closed
//! ```
//!
//! Una conexión = un request. Los errores de una conexión nunca tumban
//! al worker: se abandona la conexión y se vuelve a `accept`.

use super::shutdown::RunningFlag;
use crate::http::{Method, Request, Response, StatusCode};
use crate::metrics::{Counter, CountingStream};
use crate::router::{add_common_headers, RequestContext, Router};
use nix::errno::Errno;
use nix::sys::socket::accept;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::unix::io::{AsRawFd, FromRawFd};

/// Tamaño máximo del request que se lee (una sola lectura)
pub const BUFFER_SIZE: usize = 8192;

/// Un worker del pool
pub struct Worker<'a> {
    slot: usize,
    listener: &'a TcpListener,
    router: &'a Router,
    ctx: RequestContext<'a>,
    running: &'a RunningFlag,
}

impl<'a> Worker<'a> {
    pub fn new(
        slot: usize,
        listener: &'a TcpListener,
        router: &'a Router,
        ctx: RequestContext<'a>,
        running: &'a RunningFlag,
    ) -> Self {
        Self {
            slot,
            listener,
            router,
            ctx,
            running,
        }
    }

    /// Atiende conexiones hasta que `running` pase a false
    ///
    /// El flag se revisa antes de cada `accept`. Un `accept` interrumpido
    /// por una señal (`EINTR`) vuelve a revisar el flag en lugar de
    /// tratarse como error.
    pub fn run(&self) {
        let span = tracing::info_span!("worker", slot = self.slot, pid = std::process::id());
        let _enter = span.enter();
        tracing::debug!("Worker listo");

        // accept(2) directo: el de std reintenta solo en EINTR
        let fd = self.listener.as_raw_fd();

        while self.running.is_running() {
            let stream = match accept(fd) {
                // SAFETY: accept acaba de crear el fd y nadie más lo posee.
                Ok(client) => unsafe { TcpStream::from_raw_fd(client) },
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "accept falló");
                    continue;
                }
            };

            if let Err(e) = handle_connection(stream, self.router, &self.ctx) {
                tracing::debug!(error = %e, "Conexión abandonada");
            }
        }

        tracing::debug!("Worker terminando");
    }
}

/// Procesa una conexión completa: lee, enruta, responde y cierra
///
/// Los bytes leídos y escritos se suman a los contadores compartidos en
/// el momento de cada operación; `total_requests` sube una vez por cada
/// lectura con datos. El socket se cierra al salir (drop), haya error o no.
pub fn handle_connection(
    stream: TcpStream,
    router: &Router,
    ctx: &RequestContext<'_>,
) -> io::Result<()> {
    let mut conn = CountingStream::new(stream, ctx.counters);

    let mut buffer = [0u8; BUFFER_SIZE];
    let bytes_read = conn.read(&mut buffer)?;

    if bytes_read == 0 {
        // El cliente cerró sin enviar nada: no hay respuesta
        return Ok(());
    }
    ctx.counters.increment(Counter::TotalRequests, 1);

    let (mut response, head_only) = match Request::parse(&buffer[..bytes_read]) {
        Ok(request) => {
            tracing::debug!(method = request.method().as_str(), path = request.path(), "Request");
            (router.route(&request, ctx), *request.method() == Method::HEAD)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Request line inválida");
            let mut response = Response::error(StatusCode::BadRequest, &format!("Invalid: {}", e));
            add_common_headers(&mut response);
            (response, false)
        }
    };

    response.add_header("X-Worker-Pid", &std::process::id().to_string());

    let sent = if head_only {
        response.write_head_to(&mut conn)?
    } else {
        response.write_to(&mut conn)?
    };
    conn.flush()?;

    tracing::debug!(status = response.status().as_u16(), bytes = sent, "Respuesta enviada");
    Ok(())
}
