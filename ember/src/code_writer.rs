use std::io::{Result, Write};

pub struct CodeWriter<W: Write> {
    w: W,
    indent_level: u32,
}

impl<W: Write> CodeWriter<W> {
    pub fn new(w: W) -> CodeWriter<W> {
        CodeWriter { w, indent_level: 0 }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn unindent(&mut self) {
        debug_assert!(self.indent_level > 0, "indent underflow");
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    pub fn append_indent(&mut self) -> Result<()> {
        for _ in 0..self.indent_level {
            write!(self.w, "    ")?;
        }
        Ok(())
    }

    pub fn append_newline(&mut self) -> Result<()> {
        writeln!(self.w)
    }

    pub fn append(&mut self, s: &str) -> Result<()> {
        write!(self.w, "{}", s)
    }

    pub fn append_line(&mut self, s: &str) -> Result<()> {
        self.append_indent()?;
        self.append(s)?;
        self.append_newline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation() {
        let mut w = CodeWriter::new(Vec::new());
        w.append_line("module A;").unwrap();
        w.indent();
        w.append_line("logic a;").unwrap();
        w.unindent();
        w.append_line("endmodule").unwrap();

        assert_eq!(
            String::from_utf8(w.into_inner()).unwrap(),
            "module A;\n    logic a;\nendmodule\n"
        );
    }
}
