//! Support code used while a design is running.

pub mod tracing;
