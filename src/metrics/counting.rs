//! # Stream con Contabilidad de Bytes
//! src/metrics/counting.rs
//!
//! Envuelve el socket de una conexión y suma a los contadores compartidos
//! cada byte leído (`bytes_received`) y escrito (`bytes_sent`) en el
//! momento en que ocurre la operación.

use super::{Counter, SharedCounters};
use std::io::{self, Read, Write};

/// Stream que reporta sus lecturas/escrituras a `SharedCounters`
pub struct CountingStream<'a, S> {
    inner: S,
    counters: &'a SharedCounters,
}

impl<'a, S> CountingStream<'a, S> {
    pub fn new(inner: S, counters: &'a SharedCounters) -> Self {
        Self { inner, counters }
    }
}

impl<S: Read> Read for CountingStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counters.increment(Counter::BytesReceived, n as u64);
        Ok(n)
    }
}

impl<S: Write> Write for CountingStream<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.counters.increment(Counter::BytesSent, n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Writer que acepta como máximo 3 bytes por llamada
    struct Trickle(Vec<u8>);

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_counts_reads() {
        let counters = SharedCounters::new().unwrap();
        let mut stream = CountingStream::new(Cursor::new(b"GET / HTTP/1.0\r\n".to_vec()), &counters);

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 4);
        assert_eq!(counters.get(Counter::BytesReceived), 4);
        assert_eq!(counters.get(Counter::BytesSent), 0);
    }

    #[test]
    fn test_counts_partial_writes() {
        let counters = SharedCounters::new().unwrap();
        let mut stream = CountingStream::new(Trickle(Vec::new()), &counters);

        stream.write_all(b"0123456789").unwrap();

        assert_eq!(counters.get(Counter::BytesSent), 10);
        assert_eq!(stream.inner.0, b"0123456789");
    }

    #[test]
    fn test_eof_read_counts_nothing() {
        let counters = SharedCounters::new().unwrap();
        let mut stream = CountingStream::new(Cursor::new(Vec::new()), &counters);

        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(counters.get(Counter::BytesReceived), 0);
    }
}
