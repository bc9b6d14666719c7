//! SystemVerilog code generation.
//!
//! Definitions are emitted children first. Definitions that generate identical bodies are emitted once, and every emitted definition gets a unique, legal identifier derived from its module name.

mod compiler;
mod ir;
mod module_decls;

use compiler::*;

use crate::code_writer;
use crate::error::Error;
use crate::graph;
use crate::names::*;

use log::debug;

use std::collections::HashMap;
use std::io::Write;

/// Writes SystemVerilog for `m` and every module it instantiates to `w`.
///
/// # Errors
///
/// Returns [`Error::NotBuilt`] if `m` hasn't been built, and [`Error::Io`] if writing fails.
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let c = Context::new();
///
/// let inverter = c.module("Inverter");
/// let i = inverter.input("i", 1).unwrap();
/// inverter.output("o", 1).unwrap().drive(!i).unwrap();
/// inverter.build().unwrap();
///
/// system_verilog::generate(inverter, std::io::stdout()).unwrap();
/// ```
pub fn generate<'a, W: Write>(m: &'a graph::Module<'a>, w: W) -> Result<(), Error> {
    if !m.is_built() {
        return Err(Error::NotBuilt {
            module: m.name.clone(),
            purpose: "synthesized".into(),
        });
    }

    let mut w = code_writer::CodeWriter::new(w);

    let mut module_names = HashMap::new();
    let mut emitted_bodies: HashMap<String, String> = HashMap::new();
    let mut names = Uniquifier::new();

    for definition in m.definitions_post_order() {
        let mut c = Compiler::new(definition, &module_names);
        c.compile()?;
        let mut body = code_writer::CodeWriter::new(Vec::new());
        c.write(&mut body)?;
        let body = String::from_utf8_lossy(&body.into_inner()).into_owned();

        let name = match emitted_bodies.get(&body) {
            Some(name) => {
                debug!(
                    "module \"{}\" is identical to \"{}\"; reusing it",
                    definition.name, name
                );
                name.clone()
            }
            None => {
                let name = names.unique(&sanitize(&definition.name));
                debug!("emitting module \"{}\" as \"{}\"", definition.name, name);
                w.append_line(&format!("module {}(", name))?;
                w.append(&body)?;
                emitted_bodies.insert(body, name.clone());
                name
            }
        };
        module_names.insert(definition.id, name);
    }

    Ok(())
}

/// Generates SystemVerilog for `m` and every module it instantiates, returning it as a `String`.
///
/// Generation is deterministic: the same hierarchy always produces byte-identical text.
pub fn synthesize<'a>(m: &'a graph::Module<'a>) -> Result<String, Error> {
    let mut buffer = Vec::new();
    generate(m, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::*;

    #[test]
    fn unbuilt_module_error() {
        let c = Context::new();

        let a = c.module("A");
        let b = c.module("B");
        let _ = a.instance("b", b).unwrap();

        assert!(matches!(
            synthesize(a),
            Err(Error::NotBuilt { ref module, ref purpose }) if module == "A" && purpose == "synthesized"
        ));
    }

    #[test]
    fn combinational_and_sequential_blocks() {
        let c = Context::new();

        let m = c.module("Toggle");
        let clk = m.input("clk", 1).unwrap();
        let en = m.input("en", 1).unwrap();
        let q = m.output("q", 1).unwrap();
        let next = m.wire("next", 1).unwrap();
        m.combinational(vec![If::new(en, vec![assign(next, !q)])
            .otherwise(vec![assign(next, q)])
            .into()])
            .unwrap();
        m.sequential(clk, Edge::Falling, vec![assign(q, next)]).unwrap();
        m.build().unwrap();

        assert_eq!(
            synthesize(m).unwrap(),
            "module Toggle(
    input logic clk,
    input logic en,
    output logic q
);

    logic next;
    logic __temp_0;

    assign __temp_0 = ~q;

    always_comb begin
        if (en) begin
            next = __temp_0;
        end else begin
            next = q;
        end
    end

    always_ff @(negedge clk) begin
        q <= next;
    end

endmodule

"
        );
    }

    #[test]
    fn derived_clocks_are_named_before_use() {
        let c = Context::new();

        let m = c.module("Clocks");
        let clk = m.input("clk", 1).unwrap();
        let d = m.input("d", 1).unwrap();
        let q = m.output("q", 1).unwrap();
        let r = m.output("r", 1).unwrap();
        m.sequential(!clk, Edge::Rising, vec![assign(q, d)]).unwrap();
        m.sequential(m.high(), Edge::Rising, vec![assign(r, d)]).unwrap();
        m.build().unwrap();

        let text = synthesize(m).unwrap();
        assert!(text.contains("    assign __temp_0 = ~clk;
"));
        assert!(text.contains("    always_ff @(posedge __temp_0) begin
        q <= d;
"));
        assert!(text.contains("    assign __temp_1 = 1'h1;
"));
        assert!(text.contains("    always_ff @(posedge __temp_1) begin
        r <= d;
"));
    }

    #[test]
    fn case_statements() {
        let c = Context::new();

        let m = c.module("Decoder");
        let sel = m.input("sel", 2).unwrap();
        let y = m.output("y", 4).unwrap();
        m.combinational(vec![Case::new(sel)
            .item(0u32, vec![assign(y, m.lit(1u32, 4).unwrap())])
            .item(1u32, vec![assign(y, m.lit(2u32, 4).unwrap())])
            .default(vec![assign(y, m.lit(0u32, 4).unwrap())])
            .into()])
            .unwrap();
        m.build().unwrap();

        let text = synthesize(m).unwrap();
        assert!(text.contains(
            "        case (sel)
            2'h0: begin
                y = 4'h1;
            end
            2'h1: begin
                y = 4'h2;
            end
            default: begin
                y = 4'h0;
            end
        endcase
"
        ));
    }

    #[test]
    fn names_are_sanitized_and_unique() {
        let c = Context::new();

        let leaf = c.module("my leaf");
        let i = leaf.input("input", 1).unwrap();
        leaf.output("o", 1).unwrap().drive(i).unwrap();

        let other = c.module("my_leaf");
        let j = other.input("i", 2).unwrap();
        other.output("o", 2).unwrap().drive(j).unwrap();

        let top = c.module("Top");
        let a = top.input("a", 1).unwrap();
        let b = top.input("b", 2).unwrap();
        let u = top.instance("a", leaf).unwrap();
        u.drive_input("input", a).unwrap();
        let v = top.instance("a", other).unwrap();
        v.drive_input("i", b).unwrap();
        top.output("x", 1).unwrap().drive(u.output("o").unwrap()).unwrap();
        top.output("y", 2).unwrap().drive(v.output("o").unwrap()).unwrap();
        top.build().unwrap();

        let text = synthesize(top).unwrap();
        assert!(text.contains("module my_leaf(\n    input logic input_,\n"));
        assert!(text.contains("module my_leaf_0(\n    input logic [1:0] i,\n"));
        assert!(text.contains("    my_leaf a_0 (\n        .input_(a),\n        .o(a_0_o)\n    );\n"));
        assert!(text.contains("    my_leaf_0 a_1 (\n        .i(b),\n        .o(a_1_o)\n    );\n"));
        assert!(text.contains("    assign x = a_0_o;\n"));
    }

    #[test]
    fn identical_definitions_are_emitted_once() {
        let c = Context::new();

        let make_buffer = |name: &str| {
            let m = c.module(name);
            let i = m.input("i", 8).unwrap();
            m.output("o", 8).unwrap().drive(i).unwrap();
            m
        };
        let first = make_buffer("Buffer");
        let second = make_buffer("Buffer");

        let top = c.module("Top");
        let i = top.input("i", 8).unwrap();
        let u0 = top.instance("u0", first).unwrap();
        u0.drive_input("i", i).unwrap();
        let u1 = top.instance("u1", second).unwrap();
        u1.drive_input("i", u0.output("o").unwrap()).unwrap();
        top.output("o", 8).unwrap().drive(u1.output("o").unwrap()).unwrap();
        top.build().unwrap();

        let text = synthesize(top).unwrap();
        assert_eq!(text.matches("module Buffer(").count(), 1);
        assert!(!text.contains("Buffer_0"));
        assert!(text.contains("    Buffer u1 (\n"));
        // Children come first
        assert!(text.find("module Buffer(").unwrap() < text.find("module Top(").unwrap());
    }

    #[test]
    fn expressions_are_width_exact() {
        let c = Context::new();

        let m = c.module("Ops");
        let a = m.input("a", 4).unwrap();
        let b = m.input("b", 2).unwrap();
        m.output("sext", 8).unwrap().drive(a.sign_extend(8).unwrap()).unwrap();
        m.output("zext", 6).unwrap().drive(b.zero_extend(6).unwrap()).unwrap();
        m.output("lt", 1).unwrap().drive(a.lt_signed(a)).unwrap();
        m.output("sra", 4).unwrap().drive(a.shr_arithmetic(b)).unwrap();
        m.output("hi", 2).unwrap().drive(m.lit(0b1100u32, 4).unwrap().bits(3, 2).unwrap()).unwrap();
        m.output("u", 3).unwrap();
        m.build().unwrap();

        let text = synthesize(m).unwrap();
        assert!(text.contains("assign __temp_0 = {{4{a[3]}}, a};"));
        assert!(text.contains("assign __temp_1 = {4'h0, b};"));
        assert!(text.contains("assign __temp_2 = $signed(a) < $signed(a);"));
        assert!(text.contains("assign __temp_3 = $signed(a) >>> b;"));
        assert!(text.contains("assign __temp_4 = 4'hc;"));
        assert!(text.contains("assign __temp_5 = __temp_4[3:2];"));
        assert!(text.contains("assign u = 3'bzzz;"));
    }

    #[test]
    fn generation_is_deterministic() {
        let c = Context::new();

        let leaf = c.module("Leaf");
        let i = leaf.input("i", 3).unwrap();
        leaf.output("o", 3).unwrap().drive(i + i).unwrap();

        let top = c.module("Top");
        let x = top.input("x", 3).unwrap();
        let mut prev = x;
        for n in 0..4 {
            let inst = top.instance(format!("leaf{}", n), leaf).unwrap();
            inst.drive_input("i", prev).unwrap();
            prev = inst.output("o").unwrap();
        }
        top.output("y", 3).unwrap().drive(prev).unwrap();
        top.build().unwrap();

        assert_eq!(synthesize(top).unwrap(), synthesize(top).unwrap());
    }
}
