use super::ir::*;
use super::module_decls::*;

use crate::code_writer;
use crate::error::Error;
use crate::graph;
use crate::names::*;
use crate::value::Value;

use std::collections::HashMap;
use std::io::{self, Write};
use std::ptr;

/// Lowers one module definition into SystemVerilog statements.
pub struct Compiler<'graph> {
    m: &'graph graph::Module<'graph>,
    names: Uniquifier,
    module_decls: ModuleDecls,

    signal_exprs: HashMap<graph::SignalId, Expr>,
    a: AssignmentContext,

    drivers: Vec<Assignment>,
    port_maps: Vec<Vec<(String, Expr)>>,
    blocks: Vec<(String, bool, Vec<Stmt>)>,
}

impl<'graph> Compiler<'graph> {
    pub fn new(
        m: &'graph graph::Module<'graph>,
        module_names: &HashMap<u32, String>,
    ) -> Compiler<'graph> {
        let mut names = Uniquifier::new();
        let module_decls = ModuleDecls::new(m, module_names, &mut names);

        Compiler {
            m,
            names,
            module_decls,

            signal_exprs: HashMap::new(),
            a: AssignmentContext::new(),

            drivers: Vec::new(),
            port_maps: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn compile(&mut self) -> Result<(), Error> {
        let m = self.m;

        for signal in m.outputs.borrow().iter().chain(m.wires.borrow().iter()) {
            let expr = match signal.driver() {
                Some(graph::Driver::Assign(source)) => self.compile_signal(source),
                Some(graph::Driver::Block(_)) => continue,
                None => Expr::Constant {
                    value: Value::z(signal.bit_width()),
                },
            };
            self.drivers.push(Assignment {
                target_name: self.module_decls.signal_names[&signal.id].clone(),
                expr,
            });
        }

        for instance in m.instances.borrow().iter() {
            let child = instance.instantiated_module;
            let child_names = declare_signals(child, &mut Uniquifier::new());
            let index = self.port_maps.len();
            let mut port_map = Vec::new();
            for input in child.inputs.borrow().iter() {
                if let Some(source) = instance.driven_input(&input.to_string()) {
                    let expr = self.compile_signal(source);
                    port_map.push((child_names[&input.id].clone(), expr));
                }
            }
            for output in child.outputs.borrow().iter() {
                let net_name = self.module_decls.instances[index].output_names[&output.to_string()].clone();
                port_map.push((child_names[&output.id].clone(), Expr::Ref { name: net_name }));
            }
            self.port_maps.push(port_map);
        }

        for block in m.blocks.borrow().iter() {
            let (sensitivity, blocking) = match block.kind {
                graph::BlockKind::Combinational => ("always_comb".to_string(), true),
                graph::BlockKind::EdgeTriggered { clock, edge } => {
                    let clock_name = match self.compile_signal(clock) {
                        Expr::Ref { name } => name,
                        expr => self.named_temp(expr, 1),
                    };
                    (
                        format!(
                            "always_ff @({} {})",
                            match edge {
                                graph::Edge::Rising => "posedge",
                                graph::Edge::Falling => "negedge",
                            },
                            clock_name
                        ),
                        false,
                    )
                }
            };
            let body = self.compile_statements(&block.body)?;
            self.blocks.push((sensitivity, blocking, body));
        }

        Ok(())
    }

    fn compile_statements(
        &mut self,
        stmts: &[graph::Conditional<'graph>],
    ) -> Result<Vec<Stmt>, Error> {
        let mut ret = Vec::new();
        for stmt in stmts.iter() {
            ret.push(match stmt {
                graph::Conditional::Assign { target, value } => Stmt::Assign {
                    target_name: self.module_decls.signal_names[&target.id].clone(),
                    expr: self.compile_signal(value),
                },
                graph::Conditional::If(i) => {
                    let mut branches = Vec::new();
                    for (cond, body) in i.branches.iter() {
                        let cond = self.compile_signal(cond);
                        branches.push((cond, self.compile_statements(body)?));
                    }
                    Stmt::If {
                        branches,
                        otherwise: self.compile_statements(&i.otherwise)?,
                    }
                }
                graph::Conditional::Case(c) => {
                    let selector = self.compile_signal(c.selector);
                    let mut items = Vec::new();
                    for (value, body) in c.items.iter() {
                        let value = Value::from_constant(*value, c.selector.bit_width())?;
                        items.push((value, self.compile_statements(body)?));
                    }
                    Stmt::Case {
                        selector,
                        items,
                        default: self.compile_statements(&c.default)?,
                    }
                }
            });
        }
        Ok(ret)
    }

    fn gen_temp(&mut self, expr: Expr, bit_width: u32) -> Expr {
        Expr::Ref {
            name: self.named_temp(expr, bit_width),
        }
    }

    fn named_temp(&mut self, expr: Expr, bit_width: u32) -> String {
        let name = self
            .names
            .unique(&format!("__temp_{}", self.a.num_temps()));
        self.a.gen_temp(name.clone(), expr, bit_width);
        name
    }

    fn as_ref(&mut self, expr: Expr, bit_width: u32) -> Expr {
        match expr {
            Expr::Ref { .. } => expr,
            _ => self.gen_temp(expr, bit_width),
        }
    }

    pub fn compile_signal(&mut self, signal: &'graph graph::Signal<'graph>) -> Expr {
        if let Some(expr) = self.signal_exprs.get(&signal.id) {
            return expr.clone();
        }

        let expr = match signal.data {
            graph::SignalData::Lit { ref value } => Expr::Constant {
                value: value.clone(),
            },

            graph::SignalData::Input { .. }
            | graph::SignalData::Output { .. }
            | graph::SignalData::Wire { .. } => Expr::Ref {
                name: self.module_decls.signal_names[&signal.id].clone(),
            },

            graph::SignalData::UnOp { source, op } => {
                let source = self.compile_signal(source);
                self.gen_temp(
                    Expr::UnOp {
                        source: Box::new(source),
                        op: match op {
                            graph::UnOp::Not => UnOp::Not,
                        },
                    },
                    signal.bit_width(),
                )
            }
            graph::SignalData::BinOp { lhs, rhs, op, .. } => {
                let mut lhs = self.compile_signal(lhs);
                let mut rhs = self.compile_signal(rhs);
                match op {
                    graph::BinOp::MulSigned
                    | graph::BinOp::LessThanSigned
                    | graph::BinOp::LessThanEqualSigned
                    | graph::BinOp::GreaterThanSigned
                    | graph::BinOp::GreaterThanEqualSigned => {
                        lhs = Expr::Signed {
                            source: Box::new(lhs),
                        };
                        rhs = Expr::Signed {
                            source: Box::new(rhs),
                        };
                    }
                    graph::BinOp::ShrArithmetic => {
                        lhs = Expr::Signed {
                            source: Box::new(lhs),
                        };
                    }
                    _ => (),
                }
                self.gen_temp(
                    Expr::BinOp {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        op: match op {
                            graph::BinOp::Add => BinOp::Add,
                            graph::BinOp::Sub => BinOp::Sub,
                            graph::BinOp::Mul | graph::BinOp::MulSigned => BinOp::Mul,
                            graph::BinOp::BitAnd => BinOp::BitAnd,
                            graph::BinOp::BitOr => BinOp::BitOr,
                            graph::BinOp::BitXor => BinOp::BitXor,
                            graph::BinOp::Equal => BinOp::Equal,
                            graph::BinOp::NotEqual => BinOp::NotEqual,
                            graph::BinOp::LessThan | graph::BinOp::LessThanSigned => {
                                BinOp::LessThan
                            }
                            graph::BinOp::LessThanEqual | graph::BinOp::LessThanEqualSigned => {
                                BinOp::LessThanEqual
                            }
                            graph::BinOp::GreaterThan | graph::BinOp::GreaterThanSigned => {
                                BinOp::GreaterThan
                            }
                            graph::BinOp::GreaterThanEqual
                            | graph::BinOp::GreaterThanEqualSigned => BinOp::GreaterThanEqual,
                            graph::BinOp::Shl => BinOp::Shl,
                            graph::BinOp::Shr => BinOp::Shr,
                            graph::BinOp::ShrArithmetic => BinOp::ShrArithmetic,
                        },
                    },
                    signal.bit_width(),
                )
            }

            graph::SignalData::Bits {
                source,
                range_high,
                range_low,
            } => {
                let source_bit_width = source.bit_width();
                let source = self.compile_signal(source);
                let source = self.as_ref(source, source_bit_width);
                self.gen_temp(
                    Expr::Bits {
                        source: Box::new(source),
                        range_high,
                        range_low,
                    },
                    signal.bit_width(),
                )
            }

            graph::SignalData::Repeat { source, count } => {
                let source = self.compile_signal(source);
                self.gen_temp(
                    Expr::Repeat {
                        source: Box::new(source),
                        count,
                    },
                    signal.bit_width(),
                )
            }
            graph::SignalData::Concat { lhs, rhs } => {
                let lhs = self.compile_signal(lhs);
                let rhs = self.compile_signal(rhs);
                self.gen_temp(
                    Expr::Concat {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    signal.bit_width(),
                )
            }

            graph::SignalData::Mux {
                cond,
                when_true,
                when_false,
                ..
            } => {
                let cond = self.compile_signal(cond);
                let when_true = self.compile_signal(when_true);
                let when_false = self.compile_signal(when_false);
                self.gen_temp(
                    Expr::Ternary {
                        cond: Box::new(cond),
                        when_true: Box::new(when_true),
                        when_false: Box::new(when_false),
                    },
                    signal.bit_width(),
                )
            }

            graph::SignalData::Extend {
                source,
                bit_width,
                signed,
            } => {
                let source_bit_width = source.bit_width();
                let padding = bit_width - source_bit_width;
                let source = self.compile_signal(source);
                let extended = if signed {
                    let source = self.as_ref(source, source_bit_width);
                    Expr::Concat {
                        lhs: Box::new(Expr::Repeat {
                            source: Box::new(Expr::Bits {
                                source: Box::new(source.clone()),
                                range_high: source_bit_width - 1,
                                range_low: source_bit_width - 1,
                            }),
                            count: padding,
                        }),
                        rhs: Box::new(source),
                    }
                } else {
                    Expr::Concat {
                        lhs: Box::new(Expr::Constant {
                            value: Value::zero(padding),
                        }),
                        rhs: Box::new(source),
                    }
                };
                self.gen_temp(extended, bit_width)
            }

            graph::SignalData::InstanceOutput {
                instance, ref name, ..
            } => {
                let index = self
                    .m
                    .instances
                    .borrow()
                    .iter()
                    .position(|candidate| ptr::eq(*candidate, instance))
                    .unwrap_or_else(|| {
                        panic!(
                            "instance \"{}\" does not belong to module \"{}\"",
                            instance.name, self.m.name
                        )
                    });
                Expr::Ref {
                    name: self.module_decls.instances[index].output_names[name].clone(),
                }
            }
        };
        self.signal_exprs.insert(signal.id, expr.clone());
        expr
    }

    /// Writes everything after `module <name>(`.
    pub fn write<W: Write>(&self, w: &mut code_writer::CodeWriter<W>) -> io::Result<()> {
        let m = self.m;

        w.indent();
        let ports = m
            .inputs
            .borrow()
            .iter()
            .map(|signal| ("input", *signal))
            .chain(m.outputs.borrow().iter().map(|signal| ("output", *signal)))
            .collect::<Vec<_>>();
        for (i, (direction, signal)) in ports.iter().enumerate() {
            w.append_indent()?;
            w.append(&format!(
                "{} logic {}{}",
                direction,
                range(signal.bit_width()),
                self.module_decls.signal_names[&signal.id]
            ))?;
            if i < ports.len() - 1 {
                w.append(",")?;
            }
            w.append_newline()?;
        }
        w.unindent();
        w.append_line(");")?;
        w.indent();

        let wires = m.wires.borrow();
        if !wires.is_empty() || !self.module_decls.instance_nets.is_empty() || self.a.num_temps() > 0
        {
            w.append_newline()?;
            for wire in wires.iter() {
                NodeDecl {
                    name: self.module_decls.signal_names[&wire.id].clone(),
                    bit_width: wire.bit_width(),
                }
                .write(w)?;
            }
            for net in self.module_decls.instance_nets.iter() {
                net.write(w)?;
            }
            self.a.write_decls(w)?;
        }

        if self.a.num_temps() > 0 || !self.drivers.is_empty() {
            w.append_newline()?;
            self.a.write_assignments(w)?;
            for driver in self.drivers.iter() {
                driver.write(w)?;
            }
        }

        for (instance, port_map) in self.module_decls.instances.iter().zip(self.port_maps.iter()) {
            w.append_newline()?;
            w.append_line(&format!("{} {} (", instance.module_name, instance.name))?;
            w.indent();
            for (i, (port_name, expr)) in port_map.iter().enumerate() {
                w.append_indent()?;
                w.append(&format!(".{}(", port_name))?;
                expr.write(w)?;
                w.append(")")?;
                if i < port_map.len() - 1 {
                    w.append(",")?;
                }
                w.append_newline()?;
            }
            w.unindent();
            w.append_line(");")?;
        }

        for (sensitivity, blocking, body) in self.blocks.iter() {
            w.append_newline()?;
            w.append_line(&format!("{} begin", sensitivity))?;
            write_body(w, body, *blocking)?;
            w.append_line("end")?;
        }

        w.unindent();
        w.append_newline()?;
        w.append_line("endmodule")?;
        w.append_newline()?;

        Ok(())
    }
}
