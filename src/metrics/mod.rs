//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Estadísticas del servidor compartidas entre todos los procesos:
//! - Total de requests leídos
//! - Bytes recibidos de los clientes
//! - Bytes enviados a los clientes

pub mod counting;
pub mod shared;

pub use counting::CountingStream;
pub use shared::{Counter, CountersSnapshot, SharedCounters};
