use crate::code_writer;
use crate::value::Value;

use std::io::{Result, Write};

pub struct NodeDecl {
    pub name: String,
    pub bit_width: u32,
}

impl NodeDecl {
    pub fn write<W: Write>(&self, w: &mut code_writer::CodeWriter<W>) -> Result<()> {
        w.append_indent()?;
        w.append("logic ")?;
        w.append(&range(self.bit_width))?;
        w.append(&format!("{};", self.name))?;
        w.append_newline()?;

        Ok(())
    }
}

/// Returns the packed range prefix for a declaration, eg. `[3:0] `, or nothing for a single bit.
pub fn range(bit_width: u32) -> String {
    if bit_width > 1 {
        format!("[{}:{}] ", bit_width - 1, 0)
    } else {
        String::new()
    }
}

/// Temporaries and the continuous assignments that compute them.
pub struct AssignmentContext {
    assignments: Vec<Assignment>,
    local_decls: Vec<NodeDecl>,
}

impl AssignmentContext {
    pub fn new() -> AssignmentContext {
        AssignmentContext {
            assignments: Vec::new(),
            local_decls: Vec::new(),
        }
    }

    /// Materializes `expr` into a new `bit_width`-bit temporary and returns a reference to it.
    pub fn gen_temp(&mut self, name: String, expr: Expr, bit_width: u32) -> Expr {
        self.local_decls.push(NodeDecl {
            name: name.clone(),
            bit_width,
        });

        self.assignments.push(Assignment {
            target_name: name.clone(),
            expr,
        });

        Expr::Ref { name }
    }

    pub fn num_temps(&self) -> usize {
        self.local_decls.len()
    }

    pub fn write_decls<W: Write>(&self, w: &mut code_writer::CodeWriter<W>) -> Result<()> {
        for node_decl in self.local_decls.iter() {
            node_decl.write(w)?;
        }

        Ok(())
    }

    pub fn write_assignments<W: Write>(&self, w: &mut code_writer::CodeWriter<W>) -> Result<()> {
        for assignment in self.assignments.iter() {
            assignment.write(w)?;
        }

        Ok(())
    }
}

pub struct Assignment {
    pub target_name: String,
    pub expr: Expr,
}

impl Assignment {
    pub fn write<W: Write>(&self, w: &mut code_writer::CodeWriter<W>) -> Result<()> {
        w.append_indent()?;
        w.append(&format!("assign {}", self.target_name))?;
        w.append(" = ")?;
        self.expr.write(w)?;
        w.append(";")?;
        w.append_newline()?;

        Ok(())
    }
}

#[derive(Clone)]
pub enum Expr {
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
    Concat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Constant {
        value: Value,
    },
    Ref {
        name: String,
    },
    Repeat {
        source: Box<Expr>,
        count: u32,
    },
    Signed {
        source: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    UnOp {
        source: Box<Expr>,
        op: UnOp,
    },
}

impl Expr {
    pub fn write<W: Write>(&self, w: &mut code_writer::CodeWriter<W>) -> Result<()> {
        match self {
            Expr::BinOp { lhs, rhs, op } => {
                lhs.write(w)?;
                w.append(&format!(
                    " {} ",
                    match op {
                        BinOp::Add => "+",
                        BinOp::BitAnd => "&",
                        BinOp::BitOr => "|",
                        BinOp::BitXor => "^",
                        BinOp::Equal => "==",
                        BinOp::NotEqual => "!=",
                        BinOp::LessThan => "<",
                        BinOp::LessThanEqual => "<=",
                        BinOp::GreaterThan => ">",
                        BinOp::GreaterThanEqual => ">=",
                        BinOp::Mul => "*",
                        BinOp::Shl => "<<",
                        BinOp::Shr => ">>",
                        BinOp::ShrArithmetic => ">>>",
                        BinOp::Sub => "-",
                    }
                ))?;
                rhs.write(w)?;
            }
            Expr::Bits {
                source,
                range_high,
                range_low,
            } => {
                source.write(w)?;
                if range_high != range_low {
                    w.append(&format!("[{}:{}]", range_high, range_low))?;
                } else {
                    w.append(&format!("[{}]", range_high))?;
                }
            }
            Expr::Concat { lhs, rhs } => {
                w.append("{")?;
                lhs.write(w)?;
                w.append(", ")?;
                rhs.write(w)?;
                w.append("}")?;
            }
            Expr::Constant { value } => {
                w.append(&literal(value))?;
            }
            Expr::Ref { name } => {
                w.append(name)?;
            }
            Expr::Repeat { source, count } => {
                w.append(&format!("{{{}{{", count))?;
                source.write(w)?;
                w.append("}}")?;
            }
            Expr::Signed { source } => {
                w.append("$signed(")?;
                source.write(w)?;
                w.append(")")?;
            }
            Expr::Ternary {
                cond,
                when_true,
                when_false,
            } => {
                cond.write(w)?;
                w.append(" ? ")?;
                when_true.write(w)?;
                w.append(" : ")?;
                when_false.write(w)?;
            }
            Expr::UnOp { source, op } => {
                w.append(match op {
                    UnOp::Not => "~",
                })?;
                source.write(w)?;
            }
        }

        Ok(())
    }
}

/// Formats a sized literal; hex when every bit is known, binary otherwise.
pub fn literal(value: &Value) -> String {
    match value.to_u128() {
        Some(bits) => format!("{}'h{:x}", value.width(), bits),
        None => format!("{}'b{}", value.width(), value),
    }
}

#[derive(Clone, Copy)]
pub enum BinOp {
    Add,
    BitAnd,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Mul,
    Shl,
    Shr,
    ShrArithmetic,
    Sub,
}

#[derive(Clone, Copy)]
pub enum UnOp {
    Not,
}

pub enum Stmt {
    Assign {
        target_name: String,
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
    /// Writes the statement with blocking (`=`) or non-blocking (`<=`) assignments.
    pub fn write<W: Write>(
        &self,
        w: &mut code_writer::CodeWriter<W>,
        blocking: bool,
    ) -> Result<()> {
        match self {
            Stmt::Assign { target_name, expr } => {
                w.append_indent()?;
                w.append(&format!(
                    "{} {} ",
                    target_name,
                    if blocking { "=" } else { "<=" }
                ))?;
                expr.write(w)?;
                w.append(";")?;
                w.append_newline()?;
            }
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (i, (cond, body)) in branches.iter().enumerate() {
                    if i == 0 {
                        w.append_indent()?;
                        w.append("if (")?;
                    } else {
                        w.append(" else if (")?;
                    }
                    cond.write(w)?;
                    w.append(") begin")?;
                    w.append_newline()?;
                    write_body(w, body, blocking)?;
                    w.append_indent()?;
                    w.append("end")?;
                }
                if !otherwise.is_empty() {
                    w.append(" else begin")?;
                    w.append_newline()?;
                    write_body(w, otherwise, blocking)?;
                    w.append_indent()?;
                    w.append("end")?;
                }
                w.append_newline()?;
            }
            Stmt::Case {
                selector,
                items,
                default,
            } => {
                w.append_indent()?;
                w.append("case (")?;
                selector.write(w)?;
                w.append(")")?;
                w.append_newline()?;
                w.indent();
                for (value, body) in items.iter() {
                    w.append_line(&format!("{}: begin", literal(value)))?;
                    write_body(w, body, blocking)?;
                    w.append_line("end")?;
                }
                w.append_line("default: begin")?;
                write_body(w, default, blocking)?;
                w.append_line("end")?;
                w.unindent();
                w.append_line("endcase")?;
            }
        }

        Ok(())
    }
}

pub fn write_body<W: Write>(
    w: &mut code_writer::CodeWriter<W>,
    body: &[Stmt],
    blocking: bool,
) -> Result<()> {
    w.indent();
    for stmt in body.iter() {
        stmt.write(w, blocking)?;
    }
    w.unindent();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut code_writer::CodeWriter<Vec<u8>>) -> Result<()>) -> String {
        let mut w = code_writer::CodeWriter::new(Vec::new());
        f(&mut w).unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn literals() {
        assert_eq!(literal(&Value::from_u128(0xab, 8)), "8'hab");
        assert_eq!(literal(&Value::from_bool(true)), "1'h1");
        assert_eq!(literal(&Value::from_binary_str("1x0z").unwrap()), "4'b1x0z");
        assert_eq!(literal(&Value::z(3)), "3'bzzz");
    }

    #[test]
    fn declarations() {
        let text = render(|w| {
            NodeDecl {
                name: "a".into(),
                bit_width: 1,
            }
            .write(w)?;
            NodeDecl {
                name: "b".into(),
                bit_width: 4,
            }
            .write(w)
        });
        assert_eq!(text, "logic a;\nlogic [3:0] b;\n");
    }

    #[test]
    fn if_chains() {
        let assign = |name: &str, value: u128| Stmt::Assign {
            target_name: name.into(),
            expr: Expr::Constant {
                value: Value::from_u128(value, 2),
            },
        };
        let stmt = Stmt::If {
            branches: vec![
                (
                    Expr::Ref { name: "a".into() },
                    vec![assign("y", 1)],
                ),
                (
                    Expr::Ref { name: "b".into() },
                    vec![assign("y", 2)],
                ),
            ],
            otherwise: vec![assign("y", 0)],
        };

        let text = render(|w| stmt.write(w, false));
        assert_eq!(
            text,
            "if (a) begin\n    y <= 2'h1;\nend else if (b) begin\n    y <= 2'h2;\nend else begin\n    y <= 2'h0;\nend\n"
        );
    }
}
