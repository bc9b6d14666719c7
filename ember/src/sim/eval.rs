use super::ir::*;

use crate::error::Error;
use crate::graph::{BinOp, Edge, UnOp};
use crate::value::{Logic, Value};

use std::collections::BTreeMap;

/// Reads signal values for one process evaluation and collects its writes.
///
/// With `blocking` set, later statements observe earlier writes of the same evaluation; otherwise every read sees the values from before the evaluation started.
pub(crate) struct Frame<'v> {
    values: &'v [Value],
    blocking: bool,
    pub writes: BTreeMap<SimSignalId, Value>,
}

impl<'v> Frame<'v> {
    pub fn new(values: &'v [Value], blocking: bool) -> Frame<'v> {
        Frame {
            values,
            blocking,
            writes: BTreeMap::new(),
        }
    }

    fn read(&self, id: SimSignalId) -> &Value {
        if self.blocking {
            if let Some(value) = self.writes.get(&id) {
                return value;
            }
        }
        &self.values[id.index()]
    }

    pub fn exec(&mut self, stmts: &[Stmt]) -> Result<(), Error> {
        for stmt in stmts {
            match stmt {
                Stmt::Assign { target, expr } => {
                    let value = self.eval(expr)?;
                    self.writes.insert(*target, value);
                }
                Stmt::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for (cond, body) in branches.iter() {
                        if self.eval(cond)?.is_true() {
                            taken = Some(body);
                            break;
                        }
                    }
                    self.exec(taken.unwrap_or(otherwise))?;
                }
                Stmt::Case {
                    selector,
                    items,
                    default,
                } => {
                    let selector = self.eval(selector)?;
                    let body = items
                        .iter()
                        .find(|(value, _)| value.case_eq(&selector))
                        .map(|(_, body)| body)
                        .unwrap_or(default);
                    self.exec(body)?;
                }
            }
        }
        Ok(())
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, Error> {
        eval_with(expr, &|id| self.read(id).clone())
    }
}

/// Evaluates `expr`, resolving signal references through `read`.
pub(crate) fn eval_with(expr: &Expr, read: &dyn Fn(SimSignalId) -> Value) -> Result<Value, Error> {
    Ok(match expr {
        Expr::Constant(value) => value.clone(),
        Expr::Ref(id) => read(*id),
        Expr::UnOp { source, op } => {
            let source = eval_with(source, read)?;
            match op {
                UnOp::Not => source.not(),
            }
        }
        Expr::BinOp { lhs, rhs, op } => {
            let lhs = eval_with(lhs, read)?;
            let rhs = eval_with(rhs, read)?;
            match op {
                BinOp::Add => lhs.add(&rhs),
                BinOp::Sub => lhs.sub(&rhs),
                BinOp::Mul => lhs.mul(&rhs),
                BinOp::MulSigned => lhs.mul_signed(&rhs),
                BinOp::BitAnd => lhs.and(&rhs),
                BinOp::BitOr => lhs.or(&rhs),
                BinOp::BitXor => lhs.xor(&rhs),
                BinOp::Equal => lhs.logical_eq(&rhs),
                BinOp::NotEqual => lhs.logical_ne(&rhs),
                BinOp::LessThan => lhs.lt(&rhs),
                BinOp::LessThanEqual => lhs.le(&rhs),
                BinOp::GreaterThan => lhs.gt(&rhs),
                BinOp::GreaterThanEqual => lhs.ge(&rhs),
                BinOp::LessThanSigned => lhs.lt_signed(&rhs),
                BinOp::LessThanEqualSigned => lhs.le_signed(&rhs),
                BinOp::GreaterThanSigned => lhs.gt_signed(&rhs),
                BinOp::GreaterThanEqualSigned => lhs.ge_signed(&rhs),
                BinOp::Shl => lhs.shl(&rhs),
                BinOp::Shr => lhs.shr(&rhs),
                BinOp::ShrArithmetic => lhs.shr_arithmetic(&rhs),
            }
        }
        Expr::Bits {
            source,
            range_high,
            range_low,
        } => eval_with(source, read)?.bits(*range_high, *range_low)?,
        Expr::Repeat { source, count } => eval_with(source, read)?.repeat(*count)?,
        Expr::Concat { lhs, rhs } => eval_with(lhs, read)?.concat(&eval_with(rhs, read)?)?,
        Expr::Mux {
            cond,
            when_true,
            when_false,
        } => Value::mux(
            &eval_with(cond, read)?,
            &eval_with(when_true, read)?,
            &eval_with(when_false, read)?,
        ),
        Expr::Extend {
            source,
            bit_width,
            signed,
        } => {
            let source = eval_with(source, read)?;
            if *signed {
                source.sign_extend(*bit_width)?
            } else {
                source.zero_extend(*bit_width)?
            }
        }
    })
}

/// Returns `true` if the change from `old` to `new` on bit 0 is the given edge (Verilog `posedge`/`negedge`).
pub(crate) fn is_edge(edge: Edge, old: &Value, new: &Value) -> bool {
    let (old, new) = match (old.get(0), new.get(0)) {
        (Ok(old), Ok(new)) => (old, new),
        _ => return false,
    };
    match edge {
        Edge::Rising => match old {
            Logic::Zero => new != Logic::Zero,
            Logic::X | Logic::Z => new == Logic::One,
            Logic::One => false,
        },
        Edge::Falling => match old {
            Logic::One => new != Logic::One,
            Logic::X | Logic::Z => new == Logic::Zero,
            Logic::Zero => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Value {
        Value::from_binary_str(s).unwrap()
    }

    fn id(index: usize) -> SimSignalId {
        SimSignalId::from_index(index)
    }

    #[test]
    fn rising_edges() {
        assert!(is_edge(Edge::Rising, &v("0"), &v("1")));
        assert!(is_edge(Edge::Rising, &v("0"), &v("x")));
        assert!(is_edge(Edge::Rising, &v("z"), &v("1")));
        assert!(!is_edge(Edge::Rising, &v("x"), &v("z")));
        assert!(!is_edge(Edge::Rising, &v("1"), &v("0")));
    }

    #[test]
    fn falling_edges() {
        assert!(is_edge(Edge::Falling, &v("1"), &v("0")));
        assert!(is_edge(Edge::Falling, &v("1"), &v("z")));
        assert!(is_edge(Edge::Falling, &v("x"), &v("0")));
        assert!(!is_edge(Edge::Falling, &v("0"), &v("1")));
    }

    #[test]
    fn blocking_reads_observe_earlier_writes() {
        let values = vec![v("0101"), v("0000"), v("0000")];
        let body = vec![
            Stmt::Assign {
                target: id(1),
                expr: Expr::UnOp {
                    source: Box::new(Expr::Ref(id(0))),
                    op: UnOp::Not,
                },
            },
            Stmt::Assign {
                target: id(2),
                expr: Expr::Ref(id(1)),
            },
        ];

        let mut blocking = Frame::new(&values, true);
        blocking.exec(&body).unwrap();
        assert_eq!(blocking.writes[&id(2)], v("1010"));

        let mut non_blocking = Frame::new(&values, false);
        non_blocking.exec(&body).unwrap();
        assert_eq!(non_blocking.writes[&id(2)], v("0000"));
    }

    #[test]
    fn unknown_if_condition_takes_else_branch() {
        let values = vec![v("x"), v("0")];
        let body = vec![Stmt::If {
            branches: vec![(
                Expr::Ref(id(0)),
                vec![Stmt::Assign {
                    target: id(1),
                    expr: Expr::Constant(v("1")),
                }],
            )],
            otherwise: vec![Stmt::Assign {
                target: id(1),
                expr: Expr::Constant(v("0")),
            }],
        }];

        let mut frame = Frame::new(&values, true);
        frame.exec(&body).unwrap();
        assert_eq!(frame.writes[&id(1)], v("0"));
    }

    #[test]
    fn case_matches_exactly() {
        let values = vec![v("1x"), v("00")];
        let assign = |value: &str| {
            vec![Stmt::Assign {
                target: id(1),
                expr: Expr::Constant(v(value)),
            }]
        };
        let body = vec![Stmt::Case {
            selector: Expr::Ref(id(0)),
            items: vec![(v("10"), assign("01")), (v("1x"), assign("10"))],
            default: assign("11"),
        }];

        let mut frame = Frame::new(&values, true);
        frame.exec(&body).unwrap();
        assert_eq!(frame.writes[&id(1)], v("10"));
    }

    #[test]
    fn untaken_paths_write_nothing() {
        let values = vec![v("0"), v("1")];
        let body = vec![Stmt::If {
            branches: vec![(
                Expr::Ref(id(0)),
                vec![Stmt::Assign {
                    target: id(1),
                    expr: Expr::Constant(v("0")),
                }],
            )],
            otherwise: vec![],
        }];

        let mut frame = Frame::new(&values, true);
        frame.exec(&body).unwrap();
        assert!(frame.writes.is_empty());
    }
}
