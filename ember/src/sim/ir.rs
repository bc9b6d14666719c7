use crate::error::Error;
use crate::graph::{self, BinOp, Edge, UnOp};
use crate::value::Value;

use serde::Serialize;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Identifies one state-holding signal of one instance in a flattened hierarchy.
///
/// A definition instantiated twice contributes two `SimSignalId`s per signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SimSignalId(u32);

impl SimSignalId {
    pub(crate) fn from_index(index: usize) -> SimSignalId {
        SimSignalId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SimSignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type ProcessId = usize;
pub(crate) type ScopeId = usize;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalKind {
    Input,
    Output,
    Wire,
    /// Holds a derived clock expression so its edges can be observed.
    Net,
}

pub(crate) struct SimSignal {
    pub name: String,
    pub path: String,
    pub bit_width: u32,
    pub kind: SignalKind,
    pub scope: ScopeId,
    pub driven: bool,
}

impl SimSignal {
    pub fn initial_value(&self) -> Value {
        if self.driven {
            Value::x(self.bit_width)
        } else {
            Value::z(self.bit_width)
        }
    }
}

pub(crate) struct Scope {
    /// Instance name unique among its siblings, or the definition name for the root.
    pub name: String,
    pub module_name: String,
    pub is_instance: bool,
    pub children: Vec<ScopeId>,
    pub signals: Vec<SimSignalId>,
}

impl Scope {
    pub fn signals_of_kind<'p>(
        &'p self,
        program: &'p Program,
        kind: SignalKind,
    ) -> impl Iterator<Item = SimSignalId> + 'p {
        self.signals
            .iter()
            .copied()
            .filter(move |id| program.signals[id.index()].kind == kind)
    }
}

#[derive(Clone)]
pub(crate) enum Expr {
    Constant(Value),
    Ref(SimSignalId),
    UnOp {
        source: Box<Expr>,
        op: UnOp,
    },
    BinOp {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        op: BinOp,
    },
    Bits {
        source: Box<Expr>,
        range_high: u32,
        range_low: u32,
    },
    Repeat {
        source: Box<Expr>,
        count: u32,
    },
    Concat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Mux {
        cond: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Extend {
        source: Box<Expr>,
        bit_width: u32,
        signed: bool,
    },
}

impl Expr {
    /// Lowers the expression tree of `signal`, using `resolve` for state-holding signals and instance outputs.
    pub fn lower<'g>(
        signal: &'g graph::Signal<'g>,
        resolve: &dyn Fn(&'g graph::Signal<'g>) -> Result<SimSignalId, Error>,
    ) -> Result<Expr, Error> {
        let lower = |source: &'g graph::Signal<'g>| -> Result<Box<Expr>, Error> {
            Ok(Box::new(Expr::lower(source, resolve)?))
        };
        Ok(match signal.data {
            graph::SignalData::Lit { ref value } => Expr::Constant(value.clone()),

            graph::SignalData::Input { .. }
            | graph::SignalData::Output { .. }
            | graph::SignalData::Wire { .. }
            | graph::SignalData::InstanceOutput { .. } => Expr::Ref(resolve(signal)?),

            graph::SignalData::UnOp { source, op } => Expr::UnOp {
                source: lower(source)?,
                op,
            },
            graph::SignalData::BinOp { lhs, rhs, op, .. } => Expr::BinOp {
                lhs: lower(lhs)?,
                rhs: lower(rhs)?,
                op,
            },

            graph::SignalData::Bits {
                source,
                range_high,
                range_low,
            } => Expr::Bits {
                source: lower(source)?,
                range_high,
                range_low,
            },

            graph::SignalData::Repeat { source, count } => Expr::Repeat {
                source: lower(source)?,
                count,
            },
            graph::SignalData::Concat { lhs, rhs } => Expr::Concat {
                lhs: lower(lhs)?,
                rhs: lower(rhs)?,
            },

            graph::SignalData::Mux {
                cond,
                when_true,
                when_false,
                ..
            } => Expr::Mux {
                cond: lower(cond)?,
                when_true: lower(when_true)?,
                when_false: lower(when_false)?,
            },

            graph::SignalData::Extend {
                source,
                bit_width,
                signed,
            } => Expr::Extend {
                source: lower(source)?,
                bit_width,
                signed,
            },
        })
    }

    pub fn collect_refs(&self, refs: &mut BTreeSet<SimSignalId>) {
        match self {
            Expr::Constant(_) => (),
            Expr::Ref(id) => {
                refs.insert(*id);
            }
            Expr::UnOp { source, .. }
            | Expr::Bits { source, .. }
            | Expr::Repeat { source, .. }
            | Expr::Extend { source, .. } => source.collect_refs(refs),
            Expr::BinOp { lhs, rhs, .. } | Expr::Concat { lhs, rhs } => {
                lhs.collect_refs(refs);
                rhs.collect_refs(refs);
            }
            Expr::Mux {
                cond,
                when_true,
                when_false,
            } => {
                cond.collect_refs(refs);
                when_true.collect_refs(refs);
                when_false.collect_refs(refs);
            }
        }
    }
}

pub(crate) enum Stmt {
    Assign {
        target: SimSignalId,
        expr: Expr,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        otherwise: Vec<Stmt>,
    },
    Case {
        selector: Expr,
        items: Vec<(Value, Vec<Stmt>)>,
        default: Vec<Stmt>,
    },
}

impl Stmt {
    /// Collects every signal the statement reads; assignment targets are not reads.
    pub fn collect_refs(&self, refs: &mut BTreeSet<SimSignalId>) {
        match self {
            Stmt::Assign { expr, .. } => expr.collect_refs(refs),
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (cond, body) in branches.iter() {
                    cond.collect_refs(refs);
                    body.iter().for_each(|stmt| stmt.collect_refs(refs));
                }
                otherwise.iter().for_each(|stmt| stmt.collect_refs(refs));
            }
            Stmt::Case {
                selector,
                items,
                default,
            } => {
                selector.collect_refs(refs);
                for (_, body) in items.iter() {
                    body.iter().for_each(|stmt| stmt.collect_refs(refs));
                }
                default.iter().for_each(|stmt| stmt.collect_refs(refs));
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Level,
    Edge { clock: SimSignalId, edge: Edge },
}

pub(crate) struct Process {
    pub trigger: Trigger,
    pub body: Vec<Stmt>,
    pub reads: BTreeSet<SimSignalId>,
}

/// A flattened, simulation-ready form of a built module hierarchy.
pub(crate) struct Program {
    pub signals: Vec<SimSignal>,
    pub scopes: Vec<Scope>,
    pub processes: Vec<Process>,
    /// For each signal, the processes to wake when it changes.
    pub sensitivity: Vec<Vec<ProcessId>>,
    /// Root-scope signals by graph identity, for expression evaluation on the top module.
    pub root_signals: HashMap<graph::SignalId, SimSignalId>,
    pub names: BTreeMap<String, SimSignalId>,
}

impl Program {
    pub const ROOT: ScopeId = 0;

    pub fn signal(&self, id: SimSignalId) -> &SimSignal {
        &self.signals[id.index()]
    }

    pub fn build_sensitivity(&mut self) {
        let mut sensitivity = vec![Vec::new(); self.signals.len()];
        for (process_id, process) in self.processes.iter().enumerate() {
            match process.trigger {
                Trigger::Level => {
                    for id in process.reads.iter() {
                        sensitivity[id.index()].push(process_id);
                    }
                }
                Trigger::Edge { clock, .. } => sensitivity[clock.index()].push(process_id),
            }
        }
        self.sensitivity = sensitivity;
    }
}
