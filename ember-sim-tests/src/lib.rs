use ember::*;

pub fn and_gate<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("AndGate");

    let a = m.input("a", 1)?;
    let b = m.input("b", 1)?;
    m.output("o", 1)?.drive(a & b)?;

    Ok(m)
}

pub fn counter<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("Counter");

    let clk = m.input("clk", 1)?;
    let reset = m.input("reset", 1)?;
    let en = m.input("en", 1)?;
    let count = m.output("count", 4)?;

    m.sequential(
        clk,
        Edge::Rising,
        vec![If::new(reset, vec![assign(count, m.lit(0u32, 4)?)])
            .else_if(en, vec![assign(count, count + m.lit(1u32, 4)?)])
            .into()],
    )?;

    Ok(m)
}

pub fn half_adder<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("HalfAdder");

    let a = m.input("a", 1)?;
    let b = m.input("b", 1)?;
    m.output("sum", 1)?.drive(a ^ b)?;
    m.output("carry", 1)?.drive(a & b)?;

    Ok(m)
}

pub fn adder_top<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let ha = half_adder(c)?;

    let m = c.module("AdderTop");

    let x = m.input("x", 1)?;
    let y = m.input("y", 1)?;
    let inst = m.instance("ha", ha)?;
    inst.drive_input("a", x)?;
    inst.drive_input("b", y)?;
    m.output("s", 1)?.drive(inst.output("sum")?)?;
    m.output("c", 1)?.drive(inst.output("carry")?)?;

    Ok(m)
}

/// An inverter fed back onto itself through an enable; oscillates forever once enabled.
pub fn gated_loop<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("GatedLoop");

    let en = m.input("en", 1)?;
    let a = m.output("a", 1)?;
    a.drive(en.mux(!a, m.low()))?;

    Ok(m)
}

pub fn ring<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("Ring");

    let a = m.output("a", 1)?;
    a.drive(!a)?;

    Ok(m)
}

/// A flop that captures `d` when `clk` falls, written as a rising edge of `!clk`.
pub fn inverted_clock_flop<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("NegFlop");

    let clk = m.input("clk", 1)?;
    let d = m.input("d", 1)?;
    let q = m.output("q", 1)?;
    m.sequential(!clk, Edge::Rising, vec![assign(q, d)])?;

    Ok(m)
}

pub fn clock_gate<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let m = c.module("ClockGate");

    let clk = m.input("clk", 1)?;
    let en = m.input("en", 1)?;
    m.output("gclk", 1)?.drive(clk & en)?;

    Ok(m)
}

/// A counter clocked by the output of a `ClockGate` instance.
pub fn gated_counter<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let gate = clock_gate(c)?;

    let m = c.module("GatedCounter");

    let clk = m.input("clk", 1)?;
    let en = m.input("en", 1)?;
    let reset = m.input("reset", 1)?;
    let count = m.output("count", 4)?;

    let inst = m.instance("gate", gate)?;
    inst.drive_input("clk", clk)?;
    inst.drive_input("en", en)?;
    m.sequential(
        inst.output("gclk")?,
        Edge::Rising,
        vec![If::new(reset, vec![assign(count, m.lit(0u32, 4)?)])
            .otherwise(vec![assign(count, count + m.lit(1u32, 4)?)])
            .into()],
    )?;

    Ok(m)
}

pub fn width_mismatch<'a>(c: &'a Context<'a>) -> Result<&'a Module<'a>, Error> {
    let narrow = c.module("Narrow");
    let i = narrow.input("i", 3)?;
    narrow.output("o", 3)?.drive(i)?;

    let m = c.module("Wide");
    let x = m.input("x", 4)?;
    let inst = m.instance("u0", narrow)?;
    inst.drive_input("i", x)?;
    m.output("y", 3)?.drive(inst.output("o")?)?;

    Ok(m)
}
