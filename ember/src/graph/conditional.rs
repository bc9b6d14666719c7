use super::module::*;
use super::signal::*;

use crate::error::Error;
use crate::value::*;

use std::ptr;

/// The clock transition an edge-triggered [`ConditionalBlock`] reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// `posedge`: 0 to non-zero, or X/Z to 1.
    Rising,
    /// `negedge`: 1 to non-one, or X/Z to 0.
    Falling,
}

/// How a [`ConditionalBlock`] is triggered.
#[derive(Clone, Copy)]
pub enum BlockKind<'a> {
    /// Re-evaluated whenever one of the signals it reads changes.
    Combinational,
    /// Evaluated when `clock` makes the given `edge` transition.
    ///
    /// `clock` may be any 1-bit signal of the module, such as an input, an expression like `!clk` or an instance output.
    EdgeTriggered {
        clock: &'a Signal<'a>,
        edge: Edge,
    },
}

/// A statement in a [`ConditionalBlock`].
pub enum Conditional<'a> {
    /// Writes `value` to `target`. Both must have the same width.
    Assign {
        target: &'a Signal<'a>,
        value: &'a Signal<'a>,
    },
    If(If<'a>),
    Case(Case<'a>),
}

/// Creates a [`Conditional::Assign`] statement.
pub fn assign<'a>(target: &'a Signal<'a>, value: &'a Signal<'a>) -> Conditional<'a> {
    Conditional::Assign { target, value }
}

/// An `if` / `else if` / `else` chain. Branches are tried in order; a branch is taken when its 1-bit condition is exactly `1`.
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let c = Context::new();
///
/// let m = c.module("Priority");
/// let a = m.input("a", 1).unwrap();
/// let b = m.input("b", 1).unwrap();
/// let y = m.output("y", 2).unwrap();
///
/// m.combinational(vec![If::new(a, vec![assign(y, m.lit(1u32, 2).unwrap())])
///     .else_if(b, vec![assign(y, m.lit(2u32, 2).unwrap())])
///     .otherwise(vec![assign(y, m.lit(0u32, 2).unwrap())])
///     .into()])
/// .unwrap();
/// ```
pub struct If<'a> {
    pub(crate) branches: Vec<(&'a Signal<'a>, Vec<Conditional<'a>>)>,
    pub(crate) otherwise: Vec<Conditional<'a>>,
}

impl<'a> If<'a> {
    /// Starts a chain whose first branch runs `body` when `cond` is `1`.
    pub fn new(cond: &'a Signal<'a>, body: Vec<Conditional<'a>>) -> If<'a> {
        If {
            branches: vec![(cond, body)],
            otherwise: Vec::new(),
        }
    }

    /// Adds a branch tried after all previous ones.
    pub fn else_if(mut self, cond: &'a Signal<'a>, body: Vec<Conditional<'a>>) -> If<'a> {
        self.branches.push((cond, body));
        self
    }

    /// Sets the body run when no branch is taken.
    pub fn otherwise(mut self, body: Vec<Conditional<'a>>) -> If<'a> {
        self.otherwise = body;
        self
    }
}

impl<'a> From<If<'a>> for Conditional<'a> {
    fn from(i: If<'a>) -> Self {
        Conditional::If(i)
    }
}

/// A `case` statement. The first item whose value exactly matches the selector (four-state comparison) is taken, otherwise the default body runs.
pub struct Case<'a> {
    pub(crate) selector: &'a Signal<'a>,
    pub(crate) items: Vec<(Constant, Vec<Conditional<'a>>)>,
    pub(crate) default: Vec<Conditional<'a>>,
}

impl<'a> Case<'a> {
    /// Starts a `case` on `selector` with no items and an empty default.
    pub fn new(selector: &'a Signal<'a>) -> Case<'a> {
        Case {
            selector,
            items: Vec::new(),
            default: Vec::new(),
        }
    }

    /// Adds an item taken when the selector equals `value`.
    pub fn item(mut self, value: impl Into<Constant>, body: Vec<Conditional<'a>>) -> Case<'a> {
        self.items.push((value.into(), body));
        self
    }

    /// Sets the body run when no item matches.
    pub fn default(mut self, body: Vec<Conditional<'a>>) -> Case<'a> {
        self.default = body;
        self
    }
}

impl<'a> From<Case<'a>> for Conditional<'a> {
    fn from(c: Case<'a>) -> Self {
        Conditional::Case(c)
    }
}

/// An ordered list of [`Conditional`] statements attached to a [`Module`] with [`Module::combinational`] or [`Module::sequential`].
///
/// When a block is attached, it is checked as a whole:
///
/// - every signal it touches must belong to the module ([`Error::SignalFromOtherModule`]),
/// - targets must be outputs or wires ([`Error::NotAssignable`]) of the assigned value's width, conditions must be 1 bit wide and case items must fit the selector ([`Error::WidthMismatch`], [`Error::ValueOverflow`]),
/// - no signal may be assigned more than once on any single path through the block ([`Error::RedrivenSignal`], which names every offending signal at once),
/// - no assigned signal may already have a driver ([`Error::MultipleDriver`]).
///
/// Assigning one signal in mutually exclusive branches is fine. If any check fails, nothing is registered.
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let c = Context::new();
///
/// let m = c.module("Bad");
/// let sel = m.input("sel", 1).unwrap();
/// let y = m.output("y", 1).unwrap();
///
/// let result = m.combinational(vec![If::new(sel, vec![
///     assign(y, m.high()),
///     assign(y, m.low()),
/// ])
/// .into()]);
///
/// assert!(matches!(result, Err(Error::RedrivenSignal { .. })));
/// ```
pub struct ConditionalBlock<'a> {
    pub(crate) module: &'a Module<'a>,
    pub(crate) kind: BlockKind<'a>,
    pub(crate) body: Vec<Conditional<'a>>,
    pub(crate) driven: Vec<&'a Signal<'a>>,
}

impl<'a> ConditionalBlock<'a> {
    pub(super) fn new(
        module: &'a Module<'a>,
        kind: BlockKind<'a>,
        body: Vec<Conditional<'a>>,
        driven: Vec<&'a Signal<'a>>,
    ) -> ConditionalBlock<'a> {
        ConditionalBlock {
            module,
            kind,
            body,
            driven,
        }
    }

    /// Returns how this block is triggered.
    pub fn kind(&self) -> BlockKind<'a> {
        self.kind
    }

    /// Returns every signal this block assigns, in order of first appearance.
    pub fn driven(&self) -> &[&'a Signal<'a>] {
        &self.driven
    }

    /// Returns the block's top-level statements.
    pub fn body(&self) -> &[Conditional<'a>] {
        &self.body
    }

    pub(crate) fn describe(&self) -> String {
        match self.kind {
            BlockKind::Combinational => "a combinational block".into(),
            BlockKind::EdgeTriggered { clock, edge } => format!(
                "a block triggered on the {} edge of \"{}\"",
                match edge {
                    Edge::Rising => "rising",
                    Edge::Falling => "falling",
                },
                clock
            ),
        }
    }

    /// Runs every check performed when a block is attached and returns the ordered driven set.
    pub(super) fn validate(
        module: &'a Module<'a>,
        kind: &BlockKind<'a>,
        body: &[Conditional<'a>],
    ) -> Result<Vec<&'a Signal<'a>>, Error> {
        if let BlockKind::EdgeTriggered { clock, .. } = kind {
            module.check_owns(clock)?;
            check_condition_width("clock", clock)?;
        }
        validate_statements(module, body)?;

        let mut redriven = Vec::new();
        let driven = collect_driven(body, &mut redriven);
        if !redriven.is_empty() {
            return Err(Error::RedrivenSignal {
                module: module.name.clone(),
                signals: redriven.iter().map(|signal| signal.to_string()).collect(),
            });
        }

        for signal in driven.iter() {
            if let Some(existing) = signal.driver() {
                return Err(Error::MultipleDriver {
                    module: module.name.clone(),
                    signal: signal.to_string(),
                    existing: existing.describe(),
                    requested: match kind {
                        BlockKind::Combinational => "a combinational block".into(),
                        BlockKind::EdgeTriggered { .. } => "an edge-triggered block".into(),
                    },
                });
            }
        }

        Ok(driven)
    }
}

fn check_condition_width(what: &str, cond: &Signal) -> Result<(), Error> {
    if cond.bit_width() != 1 {
        return Err(Error::WidthMismatch {
            context: format!("{} \"{}\"", what, cond),
            expected: 1,
            actual: cond.bit_width(),
        });
    }
    Ok(())
}

fn validate_statements<'a>(module: &'a Module<'a>, stmts: &[Conditional<'a>]) -> Result<(), Error> {
    for stmt in stmts {
        match stmt {
            Conditional::Assign { target, value } => {
                module.check_owns(target)?;
                module.check_owns(value)?;
                if target.driver_slot().is_none() {
                    return Err(Error::NotAssignable {
                        module: module.name.clone(),
                        signal: target.to_string(),
                    });
                }
                if target.bit_width() != value.bit_width() {
                    return Err(Error::WidthMismatch {
                        context: format!("assignment to \"{}\"", target),
                        expected: target.bit_width(),
                        actual: value.bit_width(),
                    });
                }
            }
            Conditional::If(i) => {
                for (cond, body) in i.branches.iter() {
                    module.check_owns(cond)?;
                    check_condition_width("condition", cond)?;
                    validate_statements(module, body)?;
                }
                validate_statements(module, &i.otherwise)?;
            }
            Conditional::Case(c) => {
                module.check_owns(c.selector)?;
                for (value, body) in c.items.iter() {
                    Value::from_constant(*value, c.selector.bit_width())?;
                    validate_statements(module, body)?;
                }
                validate_statements(module, &c.default)?;
            }
        }
    }
    Ok(())
}

fn contains<'a>(signals: &[&'a Signal<'a>], signal: &'a Signal<'a>) -> bool {
    signals.iter().any(|s| ptr::eq(*s, signal))
}

fn union_into<'a>(set: &mut Vec<&'a Signal<'a>>, signals: Vec<&'a Signal<'a>>) {
    for signal in signals {
        if !contains(set, signal) {
            set.push(signal);
        }
    }
}

/// Returns the signals assigned on any path through `stmts`, recording in `redriven` each signal assigned twice along one path.
fn collect_driven<'a>(
    stmts: &[Conditional<'a>],
    redriven: &mut Vec<&'a Signal<'a>>,
) -> Vec<&'a Signal<'a>> {
    let mut driven = Vec::new();
    for stmt in stmts {
        let stmt_driven = match stmt {
            Conditional::Assign { target, .. } => vec![*target],
            Conditional::If(i) => {
                let mut branches = Vec::new();
                for (_, body) in i.branches.iter() {
                    union_into(&mut branches, collect_driven(body, redriven));
                }
                union_into(&mut branches, collect_driven(&i.otherwise, redriven));
                branches
            }
            Conditional::Case(c) => {
                let mut items = Vec::new();
                for (_, body) in c.items.iter() {
                    union_into(&mut items, collect_driven(body, redriven));
                }
                union_into(&mut items, collect_driven(&c.default, redriven));
                items
            }
        };
        for signal in stmt_driven {
            if !contains(&driven, signal) {
                driven.push(signal);
            } else if !contains(redriven, signal) {
                redriven.push(signal);
            }
        }
    }
    driven
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn exclusive_branches_may_assign_the_same_signal() {
        let c = Context::new();

        let m = c.module("A");
        let sel = m.input("sel", 1).unwrap();
        let y = m.output("y", 1).unwrap();

        let block = m
            .combinational(vec![If::new(sel, vec![assign(y, m.high())])
                .otherwise(vec![assign(y, m.low())])
                .into()])
            .unwrap();

        assert_eq!(block.driven().len(), 1);
        assert!(matches!(y.driver(), Some(Driver::Block(_))));
    }

    #[test]
    fn redriven_signals_are_all_reported() {
        let c = Context::new();

        let m = c.module("A");
        let sel = m.input("sel", 1).unwrap();
        let a = m.output("a", 1).unwrap();
        let b = m.output("b", 1).unwrap();
        let w = m.wire("w", 1).unwrap();

        let result = m.combinational(vec![
            assign(a, m.high()),
            assign(w, m.high()),
            If::new(
                sel,
                vec![assign(b, m.high()), assign(b, m.low()), assign(a, m.low())],
            )
            .into(),
        ]);

        match result {
            Err(Error::RedrivenSignal { module, signals }) => {
                assert_eq!(module, "A");
                assert_eq!(signals, vec!["b", "a"]);
            }
            _ => panic!("expected a redriven signal error"),
        }
        // Nothing was registered
        assert!(a.driver().is_none());
        assert!(w.driver().is_none());
    }

    #[test]
    fn case_items_are_exclusive() {
        let c = Context::new();

        let m = c.module("A");
        let sel = m.input("sel", 2).unwrap();
        let y = m.output("y", 2).unwrap();

        let block = m.combinational(vec![Case::new(sel)
            .item(0u32, vec![assign(y, m.lit(3u32, 2).unwrap())])
            .item(1u32, vec![assign(y, m.lit(2u32, 2).unwrap())])
            .default(vec![assign(y, sel)])
            .into()]);

        assert!(block.is_ok());
    }

    #[test]
    fn case_item_must_fit_selector() {
        let c = Context::new();

        let m = c.module("A");
        let sel = m.input("sel", 2).unwrap();
        let y = m.output("y", 1).unwrap();

        let result = m.combinational(vec![Case::new(sel)
            .item(4u32, vec![assign(y, m.high())])
            .into()]);

        assert!(matches!(result, Err(Error::ValueOverflow { .. })));
    }

    #[test]
    fn two_blocks_driving_one_signal_error() {
        let c = Context::new();

        let m = c.module("A");
        let clk = m.input("clk", 1).unwrap();
        let y = m.output("y", 1).unwrap();

        m.combinational(vec![assign(y, m.high())]).unwrap();
        let result = m.sequential(clk, Edge::Rising, vec![assign(y, m.low())]);

        assert!(matches!(result, Err(Error::MultipleDriver { .. })));
    }

    #[test]
    fn block_and_continuous_assignment_conflict() {
        let c = Context::new();

        let m = c.module("A");
        let y = m.output("y", 1).unwrap();

        y.drive(m.high()).unwrap();
        let result = m.combinational(vec![assign(y, m.low())]);

        assert!(matches!(result, Err(Error::MultipleDriver { .. })));
    }

    #[test]
    fn assignment_checks() {
        let c = Context::new();

        let m = c.module("A");
        let i = m.input("i", 2).unwrap();
        let y = m.output("y", 1).unwrap();

        assert!(matches!(
            m.combinational(vec![assign(i, m.lit(0u32, 2).unwrap())]),
            Err(Error::NotAssignable { .. })
        ));
        assert!(matches!(
            m.combinational(vec![assign(y, i)]),
            Err(Error::WidthMismatch {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert!(matches!(
            m.combinational(vec![If::new(i, vec![assign(y, m.high())]).into()]),
            Err(Error::WidthMismatch {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert!(matches!(
            m.sequential(i, Edge::Rising, vec![]),
            Err(Error::WidthMismatch { .. })
        ));
    }
}
