//! Error types shared by graph construction, simulation and synthesis.
//!
//! Every fallible operation in this crate returns [`Error`]. Variants carry the
//! identity of the module/signal involved plus the offending values, so tooling can
//! branch on the kind and users get an actionable message.

use std::io;

/// Errors that can occur while building, simulating or synthesizing a design.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A signal that already has a driver was given another one.
    #[error("signal \"{signal}\" in module \"{module}\" is already driven by {existing}; cannot also drive it by {requested}")]
    MultipleDriver {
        /// Module owning the signal.
        module: String,
        /// Name of the signal.
        signal: String,
        /// Description of the driver already registered.
        existing: String,
        /// Description of the rejected driver.
        requested: String,
    },

    /// One or more signals are assigned more than once on a single path of a block.
    #[error("block in module \"{module}\" assigns the following signal(s) more than once on a single path: {}", .signals.join(", "))]
    RedrivenSignal {
        /// Module owning the block.
        module: String,
        /// Every offending signal, in first-offence order.
        signals: Vec<String>,
    },

    /// A port connection joins signals of different widths.
    #[error("port \"{port}\" of {location} is {expected} bit(s) wide but is connected to a {actual}-bit signal")]
    PortWidthMismatch {
        /// Where the port lives, eg. `instance "u0" of module "Adder" in module "Top"`.
        location: String,
        /// Name of the port.
        port: String,
        /// Width of the port.
        expected: u32,
        /// Width of the connected signal.
        actual: u32,
    },

    /// An operation or assignment joins values of incompatible widths.
    #[error("{context}: expected {expected} bit(s) but got {actual}")]
    WidthMismatch {
        /// What was being done when the mismatch was found.
        context: String,
        /// Required width.
        expected: u32,
        /// Width that was supplied.
        actual: u32,
    },

    /// The module hierarchy contains itself.
    #[error("module \"{module}\" has a recursive definition: {}", .path.join(" -> "))]
    CyclicHierarchy {
        /// The module being built.
        module: String,
        /// The chain of `module.instance` steps that closes the cycle.
        path: Vec<String>,
    },

    /// A built module was mutated.
    #[error("module \"{module}\" has already been built and can no longer be modified ({operation})")]
    ModuleAlreadyBuilt {
        /// The frozen module.
        module: String,
        /// The rejected operation.
        operation: String,
    },

    /// A module was simulated or synthesized before `build()` was called on it.
    #[error("module \"{module}\" must be built before it can be {purpose}")]
    NotBuilt {
        /// The unbuilt module.
        module: String,
        /// `simulated` or `synthesized`.
        purpose: String,
    },

    /// A bit index lies outside of a value's width.
    #[error("bit index {index} is out of range for a {width}-bit value")]
    IndexOutOfRange {
        /// The requested index.
        index: u32,
        /// Width of the indexed value.
        width: u32,
    },

    /// A bit range has its bounds reversed.
    #[error("invalid bit range [{high}:{low}]: the upper bound must not be less than the lower bound")]
    InvalidRange {
        /// Upper bound.
        high: u32,
        /// Lower bound.
        low: u32,
    },

    /// A width outside of the supported range was requested.
    #[error("{context}: {width} bit(s) is outside of the supported range [{min}, {max}]")]
    InvalidBitWidth {
        /// What was being created.
        context: String,
        /// The rejected width.
        width: u32,
        /// Minimum supported width.
        min: u32,
        /// Maximum supported width.
        max: u32,
    },

    /// A numeric constant doesn't fit into the requested width.
    #[error("value {value} does not fit into {width} bit(s); it requires at least {required} bit(s)")]
    ValueOverflow {
        /// The constant.
        value: u128,
        /// The requested width.
        width: u32,
        /// Minimum width the constant needs.
        required: u32,
    },

    /// Settling did not reach a fixed point within the configured number of delta cycles.
    #[error("simulation diverged at time {time}: no fixed point after {max_deltas} delta cycles (still changing: {})", .signals.join(", "))]
    SimulationDiverged {
        /// Simulated time at which settling was abandoned.
        time: u64,
        /// The configured delta cycle bound.
        max_deltas: u32,
        /// Signals that changed during the last delta cycle.
        signals: Vec<String>,
    },

    /// Stimulus was written to a signal that is not a top-level input.
    #[error("signal \"{signal}\" is not an input of the top-level module \"{module}\" and cannot be written externally")]
    DrivenSignalWrittenExternally {
        /// The top-level module being simulated.
        module: String,
        /// The rejected signal.
        signal: String,
    },

    /// A signal belonging to another module was used.
    #[error("signal \"{signal}\" belongs to module \"{owner}\" and cannot be used in module \"{module}\"")]
    SignalFromOtherModule {
        /// The foreign signal.
        signal: String,
        /// Module owning the signal.
        owner: String,
        /// Module it was used in.
        module: String,
    },

    /// A signal that can't have a driver was used as an assignment target.
    #[error("signal \"{signal}\" in module \"{module}\" cannot be assigned; only outputs and wires can be driven")]
    NotAssignable {
        /// Module owning the signal.
        module: String,
        /// The rejected target.
        signal: String,
    },

    /// A port or wire name is already in use within a module.
    #[error("module \"{module}\" already contains a port or wire called \"{name}\"")]
    DuplicateName {
        /// The module.
        module: String,
        /// The duplicated name.
        name: String,
    },

    /// A port lookup failed.
    #[error("module \"{module}\" has no {kind} called \"{port}\"")]
    NoSuchPort {
        /// The module definition that was searched.
        module: String,
        /// `input` or `output`.
        kind: String,
        /// The requested name.
        port: String,
    },

    /// An instance input was left unconnected.
    #[error("module \"{module}\" contains an instance of module \"{instantiated}\" called \"{instance}\" whose input \"{input}\" is not driven")]
    UndrivenInstanceInput {
        /// The parent module.
        module: String,
        /// The instance.
        instance: String,
        /// The instantiated definition.
        instantiated: String,
        /// The unconnected input.
        input: String,
    },

    /// A hierarchical signal name did not resolve.
    #[error("no signal called \"{name}\" exists in the simulated hierarchy")]
    UnknownSignal {
        /// The requested name.
        name: String,
    },

    /// The simulator no longer accepts stimulus or events.
    #[error("simulation is {state} and no longer accepts events")]
    SimulationInactive {
        /// The terminal state, eg. `finished`.
        state: String,
    },

    /// An action tried to settle or run the simulation that is executing it.
    #[error("simulation is already running; actions cannot {operation} it")]
    AlreadyRunning {
        /// The rejected operation, eg. `settle`.
        operation: String,
    },

    /// An event was scheduled in the past.
    #[error("cannot schedule an event at time {requested}; current time is {current}")]
    InvalidTime {
        /// The requested time.
        requested: u64,
        /// The current simulated time.
        current: u64,
    },

    /// A clock generator was given an unusable period.
    #[error("clock period must be an even number of at least 2 time units, got {period}")]
    InvalidClockPeriod {
        /// The rejected period.
        period: u64,
    },

    /// An I/O error occurred while writing generated code or waveform data.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redriven_signal_display_lists_every_signal() {
        let e = Error::RedrivenSignal {
            module: "Top".into(),
            signals: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            e.to_string(),
            "block in module \"Top\" assigns the following signal(s) more than once on a single path: a, b"
        );
    }

    #[test]
    fn cyclic_hierarchy_display() {
        let e = Error::CyclicHierarchy {
            module: "A".into(),
            path: vec!["A.b".into(), "B.a".into()],
        };
        assert_eq!(
            e.to_string(),
            "module \"A\" has a recursive definition: A.b -> B.a"
        );
    }

    #[test]
    fn port_width_mismatch_display() {
        let e = Error::PortWidthMismatch {
            location: "instance \"u0\" of module \"Child\" in module \"Top\"".into(),
            port: "i".into(),
            expected: 3,
            actual: 4,
        };
        assert_eq!(
            e.to_string(),
            "port \"i\" of instance \"u0\" of module \"Child\" in module \"Top\" is 3 bit(s) wide but is connected to a 4-bit signal"
        );
    }

    #[test]
    fn simulation_diverged_display() {
        let e = Error::SimulationDiverged {
            time: 0,
            max_deltas: 100,
            signals: vec!["a".into()],
        };
        assert_eq!(
            e.to_string(),
            "simulation diverged at time 0: no fixed point after 100 delta cycles (still changing: a)"
        );
    }

    #[test]
    fn index_out_of_range_display() {
        let e = Error::IndexOutOfRange { index: 4, width: 4 };
        assert_eq!(e.to_string(), "bit index 4 is out of range for a 4-bit value");
    }

    #[test]
    fn io_display() {
        let e = Error::Io(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(e.to_string().contains("I/O error"));
    }
}
