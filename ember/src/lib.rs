//! An [HDL](https://en.wikipedia.org/wiki/Hardware_description_language) embedded in [Rust](https://www.rust-lang.org/).
//!
//! ember provides an API to describe [`Module`]s composed of [`Signal`]s, [`Instance`]s of other modules and [`ConditionalBlock`]s. A built module hierarchy can be run in an event-driven, four-state [simulator](sim::Simulator) or turned into [SystemVerilog](system_verilog::synthesize).
//!
//! Mistakes such as driving a signal twice, connecting ports of the wrong width or instantiating a module inside itself are reported as an [`Error`] as early as they can be detected.
//!
//! # Examples
//!
//! ```rust
//! use ember::*;
//! use ember::sim::*;
//!
//! // Create a context, which will contain our module(s)
//! let c = Context::new();
//!
//! // Create a module
//! let inverter = c.module("Inverter");
//! let i = inverter.input("i", 1).unwrap(); // 1-bit input
//! inverter.output("o", 1).unwrap().drive(!i).unwrap(); // Output inverted input
//! inverter.build().unwrap();
//!
//! // Simulate it
//! let mut sim = Simulator::new(inverter, SimConfig::default()).unwrap();
//! sim.put_by_name("i", true).unwrap();
//! sim.settle().unwrap();
//! assert_eq!(sim.value_by_name("o").unwrap(), Value::from_bool(false));
//!
//! // Generate SystemVerilog code
//! let sv = system_verilog::synthesize(inverter).unwrap();
//! assert!(sv.starts_with("module Inverter("));
//! ```

mod code_writer;
mod error;
mod graph;
mod names;
pub mod runtime;
pub mod sim;
pub mod system_verilog;
mod validation;
mod value;

pub use error::*;
pub use graph::*;
pub use value::*;
