//! Waveform tracing for the [`Simulator`](crate::sim::Simulator).
//!
//! A [`Trace`] receives the flattened module hierarchy once, when it is attached with [`Simulator::trace`](crate::sim::Simulator::trace), followed by a time stamp and the value of every signal that changed, for each simulated time at which something changed.

pub mod vcd;

use crate::value::Value;

use std::io;

pub trait Trace {
    type SignalId;

    fn push_module(&mut self, name: &str) -> io::Result<()>;
    fn pop_module(&mut self) -> io::Result<()>;
    fn add_signal(&mut self, name: &str, bit_width: u32) -> io::Result<Self::SignalId>;

    fn update_time_stamp(&mut self, time_stamp: u64) -> io::Result<()>;
    fn update_signal(&mut self, signal_id: &Self::SignalId, value: &Value) -> io::Result<()>;
}
