//! Event-driven, four-state simulation of a built module hierarchy.
//!
//! A [`Simulator`] flattens the hierarchy below a built top-level [`Module`](crate::Module) once, then propagates value changes in delta cycles until nothing changes any more before simulated time is allowed to advance.
//!
//! # Examples
//!
//! ```
//! use ember::*;
//! use ember::sim::*;
//!
//! let c = Context::new();
//!
//! let m = c.module("Counter");
//! let clk = m.input("clk", 1).unwrap();
//! let count = m.output("count", 4).unwrap();
//! m.sequential(clk, Edge::Rising, vec![assign(count, count + m.lit(1u32, 4).unwrap())])
//!     .unwrap();
//! m.build().unwrap();
//!
//! let mut sim = Simulator::new(m, SimConfig::default()).unwrap();
//! sim.put(clk, false).unwrap();
//! sim.settle().unwrap();
//! assert_eq!(sim.value(count).unwrap(), Value::x(4));
//! ```

mod compiler;
mod eval;
mod inspect;
mod ir;
mod module_context;

pub use inspect::*;
pub use ir::SimSignalId;

use compiler::*;
use eval::*;
use ir::*;

use crate::error::Error;
use crate::graph;
use crate::runtime::tracing::Trace;
use crate::value::{Constant, Value};

use log::{debug, trace, warn};
use serde::Deserialize;
use typed_arena::Arena;

use std::cell::Cell;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::fmt;
use std::io;
use std::mem;
use std::ptr;
use std::rc::Rc;

/// Simulator tuning knobs.
///
/// Can be loaded from any serde format; missing fields take their default value.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Maximum number of delta cycles spent settling a single point in time before [`Error::SimulationDiverged`] is raised.
    pub max_delta_cycles: u32,
    /// [`Simulator::run`] stops before processing events scheduled after this time.
    pub time_limit: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            max_delta_cycles: 10_000,
            time_limit: None,
        }
    }
}

/// Lifecycle of a [`Simulator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimState {
    /// Accepting stimulus; nothing is being evaluated.
    Idle,
    /// Settling or processing scheduled events.
    Running,
    /// [`Simulator::run`] ran out of events.
    Finished,
    /// A stop was requested or the configured time limit was reached.
    Stopped,
    /// Settling diverged or an action failed.
    Errored,
}

impl SimState {
    /// Returns `true` for states the simulator can't leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, SimState::Finished | SimState::Stopped | SimState::Errored)
    }
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimState::Idle => "idle",
            SimState::Running => "running",
            SimState::Finished => "finished",
            SimState::Stopped => "stopped",
            SimState::Errored => "errored",
        })
    }
}

/// Requests a [`Simulator`] to stop at the end of the current delta cycle.
///
/// Obtained with [`Simulator::stop_handle`]; handles can be cloned and moved into change listeners and actions.
#[derive(Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    fn is_requested(&self) -> bool {
        self.0.get()
    }
}

/// A value change delivered to [`Simulator::on_change`] listeners.
pub struct SignalChange<'s> {
    pub signal: SimSignalId,
    /// Hierarchical name, eg. `u0.sum`.
    pub name: &'s str,
    pub old: &'s Value,
    pub new: &'s Value,
    pub time: u64,
}

type Action<'a> = Box<dyn FnOnce(&mut Simulator<'a>) -> Result<(), Error> + 'a>;
type Listener<'a> = Box<dyn FnMut(&SignalChange<'_>) + 'a>;

enum EventKind<'a> {
    Action(Action<'a>),
    Clock {
        signal: SimSignalId,
        half_period: u64,
    },
}

struct ScheduledEvent<'a> {
    time: u64,
    // Insertion order; keeps events at the same time FIFO.
    seq: u64,
    kind: EventKind<'a>,
}

impl<'a> PartialEq for ScheduledEvent<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl<'a> Eq for ScheduledEvent<'a> {}

impl<'a> PartialOrd for ScheduledEvent<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Ord for ScheduledEvent<'a> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

trait TraceSink {
    fn record(&mut self, time: u64, signal: SimSignalId, value: &Value) -> io::Result<()>;
}

struct Tracer<T: Trace> {
    trace: T,
    ids: Vec<Option<T::SignalId>>,
    last_time: Option<u64>,
}

impl<T: Trace> Tracer<T> {
    fn declare_scope(&mut self, program: &Program, scope_id: ScopeId) -> io::Result<()> {
        let scope = &program.scopes[scope_id];
        self.trace.push_module(&scope.name)?;
        for id in scope.signals.iter() {
            let signal = program.signal(*id);
            self.ids[id.index()] = Some(self.trace.add_signal(&signal.name, signal.bit_width)?);
        }
        for child in scope.children.iter() {
            self.declare_scope(program, *child)?;
        }
        self.trace.pop_module()
    }
}

impl<T: Trace> TraceSink for Tracer<T> {
    fn record(&mut self, time: u64, signal: SimSignalId, value: &Value) -> io::Result<()> {
        if self.last_time != Some(time) {
            self.trace.update_time_stamp(time)?;
            self.last_time = Some(time);
        }
        match &self.ids[signal.index()] {
            Some(id) => self.trace.update_signal(id, value),
            None => Ok(()),
        }
    }
}

/// Simulates a built module hierarchy.
///
/// The simulator only borrows the module graph; any number of simulators may share one built graph. Signal values, the event queue and listeners are owned by the simulator.
///
/// Stimulus written with [`put`](#method.put) and friends is applied at the start of the next delta cycle, ie. when [`settle`](#method.settle) or one of the run methods is called. Combinational blocks see their own earlier assignments within an evaluation; edge-triggered blocks read the values from before the edge and their results become visible in the following delta cycle.
pub struct Simulator<'a> {
    top: &'a graph::Module<'a>,
    config: SimConfig,

    program: Program,
    values: Vec<Value>,
    pending: BTreeMap<SimSignalId, Value>,
    initialized: bool,

    time: u64,
    state: SimState,
    queue: BinaryHeap<Reverse<ScheduledEvent<'a>>>,
    next_seq: u64,
    delta_cycles: u64,

    listeners: Vec<Listener<'a>>,
    tracer: Option<Box<dyn TraceSink + 'a>>,
    stop: StopHandle,
}

impl<'a> Simulator<'a> {
    /// Flattens the hierarchy below `top` and creates an idle simulator at time 0.
    ///
    /// Undriven signals, including all top-level inputs, start out as Z; driven signals start out as X.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotBuilt`] if `top` hasn't been built.
    pub fn new(top: &'a graph::Module<'a>, config: SimConfig) -> Result<Simulator<'a>, Error> {
        if !top.is_built() {
            return Err(Error::NotBuilt {
                module: top.name.clone(),
                purpose: "simulated".into(),
            });
        }

        let context_arena = Arena::new();
        let program = Compiler::new(&context_arena).compile(top)?;
        let values = program
            .signals
            .iter()
            .map(|signal| signal.initial_value())
            .collect();

        debug!(
            "simulating module \"{}\": {} signal(s), {} process(es)",
            top.name,
            program.signals.len(),
            program.processes.len()
        );

        Ok(Simulator {
            top,
            config,

            program,
            values,
            pending: BTreeMap::new(),
            initialized: false,

            time: 0,
            state: SimState::Idle,
            queue: BinaryHeap::new(),
            next_seq: 0,
            delta_cycles: 0,

            listeners: Vec::new(),
            tracer: None,
            stop: StopHandle::default(),
        })
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// Returns the current simulated time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Returns the number of delta cycles evaluated so far.
    pub fn delta_cycles(&self) -> u64 {
        self.delta_cycles
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests the simulation to stop at the end of the current (or next) delta cycle.
    pub fn stop(&self) {
        self.stop.stop();
    }

    fn check_active(&self) -> Result<(), Error> {
        if self.state.is_terminal() {
            return Err(Error::SimulationInactive {
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    fn enter(&mut self, operation: &str) -> Result<(), Error> {
        self.check_active()?;
        if self.state == SimState::Running {
            return Err(Error::AlreadyRunning {
                operation: operation.into(),
            });
        }
        self.state = SimState::Running;
        Ok(())
    }

    fn root_input(&self, signal: &'a graph::Signal<'a>) -> Result<SimSignalId, Error> {
        let is_top_input = ptr::eq(signal.module, self.top)
            && matches!(signal.data, graph::SignalData::Input { .. });
        match self.program.root_signals.get(&signal.id) {
            Some(id) if is_top_input => Ok(*id),
            _ => Err(Error::DrivenSignalWrittenExternally {
                module: self.top.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }

    /// Writes a constant to a top-level input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DrivenSignalWrittenExternally`] if `signal` isn't an input of the top-level module, [`Error::ValueOverflow`] if `value` doesn't fit, and [`Error::SimulationInactive`] once the simulation has ended.
    pub fn put(
        &mut self,
        signal: &'a graph::Signal<'a>,
        value: impl Into<Constant>,
    ) -> Result<(), Error> {
        let id = self.root_input(signal)?;
        let value = Value::from_constant(value, self.program.signal(id).bit_width)?;
        self.write(id, value)
    }

    /// Writes a four-state value to a top-level input. The value's width must match the input's.
    pub fn put_value(&mut self, signal: &'a graph::Signal<'a>, value: Value) -> Result<(), Error> {
        let id = self.root_input(signal)?;
        let bit_width = self.program.signal(id).bit_width;
        if value.width() != bit_width {
            return Err(Error::WidthMismatch {
                context: format!("stimulus for input \"{}\"", signal),
                expected: bit_width,
                actual: value.width(),
            });
        }
        self.write(id, value)
    }

    /// Writes a constant to the top-level input called `name`.
    pub fn put_by_name(&mut self, name: &str, value: impl Into<Constant>) -> Result<(), Error> {
        let id = self.lookup(name)?;
        let signal = self.program.signal(id);
        if signal.scope != Program::ROOT || signal.kind != SignalKind::Input {
            return Err(Error::DrivenSignalWrittenExternally {
                module: self.top.name.clone(),
                signal: name.into(),
            });
        }
        let value = Value::from_constant(value, signal.bit_width)?;
        self.write(id, value)
    }

    fn write(&mut self, id: SimSignalId, value: Value) -> Result<(), Error> {
        self.check_active()?;
        self.pending.insert(id, value);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<SimSignalId, Error> {
        self.program
            .names
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSignal { name: name.into() })
    }

    /// Returns the current value of any signal of the top-level module, evaluating expressions on demand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignalFromOtherModule`] if `signal` doesn't belong to the top-level module.
    pub fn value(&self, signal: &'a graph::Signal<'a>) -> Result<Value, Error> {
        self.top.check_owns(signal)?;
        let expr = Expr::lower(signal, &|signal| self.resolve_root(signal))?;
        eval_with(&expr, &|id| self.values[id.index()].clone())
    }

    fn resolve_root(&self, signal: &'a graph::Signal<'a>) -> Result<SimSignalId, Error> {
        let unknown = || Error::UnknownSignal {
            name: signal.to_string(),
        };
        match signal.data {
            graph::SignalData::InstanceOutput {
                instance, ref name, ..
            } => {
                let index = self
                    .top
                    .instances
                    .borrow()
                    .iter()
                    .position(|candidate| ptr::eq(*candidate, instance))
                    .ok_or_else(unknown)?;
                let scope = &self.program.scopes[self.program.scopes[Program::ROOT].children[index]];
                scope
                    .signals_of_kind(&self.program, SignalKind::Output)
                    .find(|id| self.program.signal(*id).name == *name)
                    .ok_or_else(unknown)
            }
            _ => self
                .program
                .root_signals
                .get(&signal.id)
                .copied()
                .ok_or_else(unknown),
        }
    }

    /// Returns the current value of a signal by hierarchical name, eg. `"u0.carry"`.
    pub fn value_by_name(&self, name: &str) -> Result<Value, Error> {
        let id = self.lookup(name)?;
        Ok(self.values[id.index()].clone())
    }

    /// Registers a listener called for every applied value change.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&SignalChange<'_>) + 'a,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Attaches a waveform trace.
    ///
    /// The whole flattened hierarchy is declared immediately and the current value of every signal is recorded at the current time; afterwards every change is recorded.
    pub fn trace<T>(&mut self, trace: T) -> Result<(), Error>
    where
        T: Trace + 'a,
        T::SignalId: 'a,
    {
        let mut ids = Vec::new();
        ids.resize_with(self.program.signals.len(), || None);
        let mut tracer = Tracer {
            trace,
            ids,
            last_time: None,
        };
        tracer.declare_scope(&self.program, Program::ROOT)?;
        for (index, value) in self.values.iter().enumerate() {
            tracer.record(self.time, SimSignalId::from_index(index), value)?;
        }
        self.tracer = Some(Box::new(tracer));
        Ok(())
    }

    fn schedule(&mut self, time: u64, kind: EventKind<'a>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledEvent { time, seq, kind }));
    }

    /// Schedules `action` to run at `time`, before that time is settled.
    ///
    /// Actions run in registration order among actions scheduled for the same time. An error returned by an action ends the simulation in [`SimState::Errored`]. Actions may write inputs and schedule further events, but calling [`settle`](#method.settle), [`run`](#method.run) or [`run_until`](#method.run_until) from an action fails with [`Error::AlreadyRunning`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `time` lies in the past.
    pub fn register_action<F>(&mut self, time: u64, action: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Simulator<'a>) -> Result<(), Error> + 'a,
    {
        self.check_active()?;
        if time < self.time {
            return Err(Error::InvalidTime {
                requested: time,
                current: self.time,
            });
        }
        self.schedule(time, EventKind::Action(Box::new(action)));
        Ok(())
    }

    /// Drives the 1-bit top-level input `signal` with a free-running clock.
    ///
    /// The clock is low from now until half a period has passed, then toggles every half period. A clocked simulation never runs out of events, so bound [`run`](#method.run) with [`SimConfig::time_limit`], [`stop`](#method.stop) or use [`run_until`](#method.run_until).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidClockPeriod`] unless `period` is even and at least 2.
    pub fn add_clock(&mut self, signal: &'a graph::Signal<'a>, period: u64) -> Result<(), Error> {
        let id = self.root_input(signal)?;
        let bit_width = self.program.signal(id).bit_width;
        if bit_width != 1 {
            return Err(Error::WidthMismatch {
                context: format!("clock \"{}\"", signal),
                expected: 1,
                actual: bit_width,
            });
        }
        if period < 2 || period % 2 != 0 {
            return Err(Error::InvalidClockPeriod { period });
        }
        self.write(id, Value::from_bool(false))?;
        let half_period = period / 2;
        self.schedule(
            self.time + half_period,
            EventKind::Clock {
                signal: id,
                half_period,
            },
        );
        Ok(())
    }

    /// Settles the current point in time without advancing it.
    pub fn settle(&mut self) -> Result<(), Error> {
        self.enter("settle")?;
        let result = self.settle_current_time();
        self.leave(result)?;
        if self.state == SimState::Running {
            self.state = SimState::Idle;
        }
        Ok(())
    }

    /// Processes scheduled events until none are left ([`SimState::Finished`]), a stop is requested or the time limit is reached ([`SimState::Stopped`]).
    pub fn run(&mut self) -> Result<SimState, Error> {
        self.enter("run")?;
        let result = self.run_events(None);
        self.leave(result)?;
        debug!("simulation {} at time {}", self.state, self.time);
        Ok(self.state)
    }

    /// Processes scheduled events up to and including `time`, then pauses at `time` in [`SimState::Idle`].
    pub fn run_until(&mut self, time: u64) -> Result<SimState, Error> {
        self.check_active()?;
        if time < self.time {
            return Err(Error::InvalidTime {
                requested: time,
                current: self.time,
            });
        }
        self.enter("run")?;
        let result = self.run_events(Some(time));
        self.leave(result)?;
        Ok(self.state)
    }

    fn leave(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        if result.is_err() {
            self.state = SimState::Errored;
        }
        result
    }

    fn run_events(&mut self, until: Option<u64>) -> Result<(), Error> {
        loop {
            self.settle_current_time()?;
            if self.state != SimState::Running {
                return Ok(());
            }

            let next_time = match self.queue.peek() {
                Some(Reverse(event)) => event.time,
                None => {
                    self.state = match until {
                        Some(until) => {
                            self.time = until;
                            SimState::Idle
                        }
                        None => SimState::Finished,
                    };
                    return Ok(());
                }
            };
            if let Some(until) = until {
                if next_time > until {
                    self.time = until;
                    self.state = SimState::Idle;
                    return Ok(());
                }
            }
            if let Some(limit) = self.config.time_limit {
                if next_time > limit {
                    debug!("time limit {} reached", limit);
                    self.state = SimState::Stopped;
                    return Ok(());
                }
            }

            self.time = next_time;
            while self
                .queue
                .peek()
                .map_or(false, |Reverse(event)| event.time == next_time)
            {
                if let Some(Reverse(event)) = self.queue.pop() {
                    self.dispatch(event)?;
                }
            }
        }
    }

    fn dispatch(&mut self, event: ScheduledEvent<'a>) -> Result<(), Error> {
        match event.kind {
            EventKind::Action(action) => action(self),
            EventKind::Clock {
                signal,
                half_period,
            } => {
                let next = self
                    .pending
                    .get(&signal)
                    .unwrap_or(&self.values[signal.index()])
                    .not();
                self.pending.insert(signal, next);
                self.schedule(
                    self.time + half_period,
                    EventKind::Clock {
                        signal,
                        half_period,
                    },
                );
                Ok(())
            }
        }
    }

    fn settle_current_time(&mut self) -> Result<(), Error> {
        let mut woken = BTreeSet::new();
        if !self.initialized {
            self.initialized = true;
            woken.extend(
                self.program
                    .processes
                    .iter()
                    .enumerate()
                    .filter(|(_, process)| process.trigger == Trigger::Level)
                    .map(|(process_id, _)| process_id),
            );
        }

        let mut deltas = 0u32;
        loop {
            let changed = self.apply_pending()?;
            for (id, old) in changed.iter() {
                for &process_id in self.program.sensitivity[id.index()].iter() {
                    let wake = match self.program.processes[process_id].trigger {
                        Trigger::Level => true,
                        Trigger::Edge { edge, .. } => is_edge(edge, old, &self.values[id.index()]),
                    };
                    if wake {
                        woken.insert(process_id);
                    }
                }
            }

            if self.stop.is_requested() {
                debug!("stop requested at time {}", self.time);
                self.state = SimState::Stopped;
                return Ok(());
            }
            if woken.is_empty() {
                return Ok(());
            }

            deltas += 1;
            if deltas > self.config.max_delta_cycles {
                let signals: Vec<String> = changed
                    .iter()
                    .map(|(id, _)| self.program.signal(*id).path.clone())
                    .collect();
                warn!(
                    "no fixed point after {} delta cycles at time {}; still changing: {}",
                    self.config.max_delta_cycles,
                    self.time,
                    signals.join(", ")
                );
                self.state = SimState::Errored;
                return Err(Error::SimulationDiverged {
                    time: self.time,
                    max_deltas: self.config.max_delta_cycles,
                    signals,
                });
            }

            for process_id in mem::take(&mut woken) {
                let process = &self.program.processes[process_id];
                let writes = {
                    let mut frame = Frame::new(&self.values, process.trigger == Trigger::Level);
                    frame.exec(&process.body)?;
                    frame.writes
                };
                self.pending.extend(writes);
            }
            self.delta_cycles += 1;
            trace!(
                "time {} delta {}: {} change(s), {} update(s) pending",
                self.time,
                deltas,
                changed.len(),
                self.pending.len()
            );
        }
    }

    fn apply_pending(&mut self) -> Result<Vec<(SimSignalId, Value)>, Error> {
        let mut changed = Vec::new();
        for (id, value) in mem::take(&mut self.pending) {
            if self.values[id.index()] == value {
                continue;
            }
            let old = mem::replace(&mut self.values[id.index()], value);
            let new = &self.values[id.index()];
            let change = SignalChange {
                signal: id,
                name: &self.program.signal(id).path,
                old: &old,
                new,
                time: self.time,
            };
            for listener in self.listeners.iter_mut() {
                listener(&change);
            }
            if let Some(tracer) = self.tracer.as_mut() {
                tracer.record(self.time, id, new)?;
            }
            changed.push((id, old));
        }
        Ok(changed)
    }

    /// Captures the current values of every port in the hierarchy.
    pub fn inspect(&self) -> ModuleSnapshot {
        self.snapshot(Program::ROOT)
    }

    fn snapshot(&self, scope_id: ScopeId) -> ModuleSnapshot {
        let scope = &self.program.scopes[scope_id];
        let port = |id: SimSignalId| {
            let signal = self.program.signal(id);
            PortSnapshot {
                name: signal.name.clone(),
                width: signal.bit_width,
                value: self.values[id.index()].clone(),
            }
        };
        ModuleSnapshot {
            name: scope.module_name.clone(),
            instance_name: if scope.is_instance {
                Some(scope.name.clone())
            } else {
                None
            },
            inputs: scope
                .signals_of_kind(&self.program, SignalKind::Input)
                .map(&port)
                .collect(),
            outputs: scope
                .signals_of_kind(&self.program, SignalKind::Output)
                .map(&port)
                .collect(),
            sub_modules: scope
                .children
                .iter()
                .map(|child| self.snapshot(*child))
                .collect(),
        }
    }
}
