use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Reserved words of IEEE 1800-2017 (SystemVerilog), sorted.
const KEYWORDS: &[&str] = &[
    "accept_on", "alias", "always", "always_comb", "always_ff", "always_latch", "and", "assert",
    "assign", "assume", "automatic", "before", "begin", "bind", "bins", "binsof", "bit", "break",
    "buf", "bufif0", "bufif1", "byte", "case", "casex", "casez", "cell", "chandle", "checker",
    "class", "clocking", "cmos", "config", "const", "constraint", "context", "continue", "cover",
    "covergroup", "coverpoint", "cross", "deassign", "default", "defparam", "design", "disable",
    "dist", "do", "edge", "else", "end", "endcase", "endchecker", "endclass", "endclocking",
    "endconfig", "endfunction", "endgenerate", "endgroup", "endinterface", "endmodule",
    "endpackage", "endprimitive", "endprogram", "endproperty", "endsequence", "endspecify",
    "endtable", "endtask", "enum", "event", "eventually", "expect", "export", "extends", "extern",
    "final", "first_match", "for", "force", "foreach", "forever", "fork", "function",
    "generate", "genvar", "global", "highz0", "highz1", "if", "iff", "ifnone", "ignore_bins",
    "illegal_bins", "implements", "implies", "import", "incdir", "include", "initial", "inout",
    "input", "inside", "instance", "int", "integer", "interconnect", "interface", "intersect",
    "join", "join_any", "join_none", "large", "let", "liblist", "library", "local", "localparam",
    "logic", "longint", "macromodule", "matches", "medium", "modport", "module", "nand", "negedge",
    "nettype", "new", "nexttime", "nmos", "nor", "noshowcancelled", "not", "notif0", "notif1",
    "null", "or", "output", "package", "packed", "parameter", "pmos", "posedge", "primitive",
    "priority", "program", "property", "protected", "pull0", "pull1", "pulldown", "pullup",
    "pulsestyle_ondetect", "pulsestyle_onevent", "pure", "rand", "randc", "randcase",
    "randsequence", "rcmos", "real", "realtime", "ref", "reg", "reject_on", "release", "repeat",
    "restrict", "return", "rnmos", "rpmos", "rtran", "rtranif0", "rtranif1", "s_always",
    "s_eventually", "s_nexttime", "s_until", "s_until_with", "scalared", "sequence", "shortint",
    "shortreal", "showcancelled", "signed", "small", "soft", "solve", "specify", "specparam",
    "static", "string", "strong", "strong0", "strong1", "struct", "super", "supply0", "supply1",
    "sync_accept_on", "sync_reject_on", "table", "tagged", "task", "this", "throughout", "time",
    "timeprecision", "timeunit", "tran", "tranif0", "tranif1", "tri", "tri0", "tri1", "triand",
    "trior", "trireg", "type", "typedef", "union", "unique", "unique0", "unsigned", "until",
    "until_with", "untyped", "use", "uwire", "var", "vectored", "virtual", "void", "wait",
    "wait_order", "wand", "weak", "weak0", "weak1", "while", "wildcard", "wire", "with", "within",
    "wor", "xnor", "xor",
];

/// Turns an arbitrary user-given name into a legal SystemVerilog identifier.
pub fn sanitize(name: &str) -> String {
    let mut ret: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if ret.is_empty() || ret.starts_with(|c: char| c.is_ascii_digit()) {
        ret.insert(0, '_');
    }
    if KEYWORDS.binary_search(&ret.as_str()).is_ok() {
        ret.push('_');
    }
    ret
}

/// Hands out unique names within one scope: the first request for `name` gets `name`, later ones get `name_0`, `name_1`, ...
#[derive(Default)]
pub struct Uniquifier {
    taken: BTreeSet<String>,
    next_suffix: BTreeMap<String, u32>,
}

impl Uniquifier {
    pub fn new() -> Uniquifier {
        Uniquifier::default()
    }

    /// Reserves `name` exactly, so later requests are disambiguated around it.
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    pub fn unique(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_string()) {
            return name.to_string();
        }
        let suffix = self.next_suffix.entry(name.to_string()).or_insert(0);
        loop {
            let candidate = format!("{}_{}", name, suffix);
            *suffix += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_names() {
        assert_eq!(sanitize("counter"), "counter");
        assert_eq!(sanitize("my module"), "my_module");
        assert_eq!(sanitize("4bit"), "_4bit");
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize("output"), "output_");
        assert_eq!(sanitize("a.b-c"), "a_b_c");
    }

    #[test]
    fn every_reserved_word_is_escaped() {
        for word in [
            "real", "type", "string", "static", "final", "ref", "import", "assert", "property",
            "bind", "config", "pullup", "priority",
        ] {
            assert_eq!(sanitize(word), format!("{}_", word));
        }
        assert_eq!(sanitize("realistic"), "realistic");
        assert!(KEYWORDS.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn unique_names() {
        let mut u = Uniquifier::new();
        u.reserve("clk");

        assert_eq!(u.unique("Adder"), "Adder");
        assert_eq!(u.unique("Adder"), "Adder_0");
        assert_eq!(u.unique("Adder"), "Adder_1");
        assert_eq!(u.unique("clk"), "clk_0");
        assert_eq!(u.unique("Adder_0"), "Adder_0_0");
    }
}
