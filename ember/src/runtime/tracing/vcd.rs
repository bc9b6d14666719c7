//! [VCD](https://en.wikipedia.org/wiki/Value_change_dump) format tracing implementation.

extern crate vcd;

use super::*;

use crate::value::Logic;

use std::io;

pub enum TimeScaleUnit {
    S,
    Ms,
    Us,
    Ns,
    Ps,
    Fs,
}

impl From<TimeScaleUnit> for vcd::TimescaleUnit {
    fn from(time_scale_unit: TimeScaleUnit) -> Self {
        match time_scale_unit {
            TimeScaleUnit::S => vcd::TimescaleUnit::S,
            TimeScaleUnit::Ms => vcd::TimescaleUnit::MS,
            TimeScaleUnit::Us => vcd::TimescaleUnit::US,
            TimeScaleUnit::Ns => vcd::TimescaleUnit::NS,
            TimeScaleUnit::Ps => vcd::TimescaleUnit::PS,
            TimeScaleUnit::Fs => vcd::TimescaleUnit::FS,
        }
    }
}

impl From<Logic> for vcd::Value {
    fn from(logic: Logic) -> Self {
        match logic {
            Logic::Zero => vcd::Value::V0,
            Logic::One => vcd::Value::V1,
            Logic::X => vcd::Value::X,
            Logic::Z => vcd::Value::Z,
        }
    }
}

/// Writes four-state value changes in VCD format.
///
/// # Examples
///
/// ```
/// use ember::*;
/// use ember::runtime::tracing::vcd::*;
/// use ember::sim::*;
///
/// let c = Context::new();
///
/// let m = c.module("Inverter");
/// let i = m.input("i", 1).unwrap();
/// m.output("o", 1).unwrap().drive(!i).unwrap();
/// m.build().unwrap();
///
/// let mut sim = Simulator::new(m, SimConfig::default()).unwrap();
/// sim.trace(VcdTrace::new(Vec::new(), 1, TimeScaleUnit::Ns).unwrap()).unwrap();
/// sim.put(i, false).unwrap();
/// sim.settle().unwrap();
/// ```
pub struct VcdTrace<W: io::Write> {
    module_hierarchy_depth: u32,

    signals: Vec<VcdTraceSignal>,

    w: vcd::Writer<W>,
}

impl<W: io::Write> VcdTrace<W> {
    pub fn new(w: W, time_scale: u32, time_scale_unit: TimeScaleUnit) -> io::Result<VcdTrace<W>> {
        let mut w = vcd::Writer::new(w);

        w.timescale(time_scale, time_scale_unit.into())?;

        Ok(VcdTrace {
            module_hierarchy_depth: 0,

            signals: Vec::new(),

            w,
        })
    }
}

impl<W: io::Write> Trace for VcdTrace<W> {
    type SignalId = usize;

    fn push_module(&mut self, name: &str) -> io::Result<()> {
        self.w.add_module(name)?;

        self.module_hierarchy_depth += 1;

        Ok(())
    }

    fn pop_module(&mut self) -> io::Result<()> {
        self.w.upscope()?;

        self.module_hierarchy_depth -= 1;

        if self.module_hierarchy_depth == 0 {
            self.w.enddefinitions()?;
        }

        Ok(())
    }

    fn add_signal(&mut self, name: &str, bit_width: u32) -> io::Result<Self::SignalId> {
        let ret = self.signals.len();

        self.signals.push(VcdTraceSignal {
            bit_width,
            id: self.w.add_wire(bit_width, name)?,
        });

        Ok(ret)
    }

    fn update_time_stamp(&mut self, time_stamp: u64) -> io::Result<()> {
        self.w.timestamp(time_stamp)
    }

    fn update_signal(&mut self, signal_id: &Self::SignalId, value: &Value) -> io::Result<()> {
        let signal = &self.signals[*signal_id];
        if value.width() != signal.bit_width {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "expected a {}-bit value, got {} bit(s)",
                    signal.bit_width,
                    value.width()
                ),
            ));
        }

        // MSB first
        let mut scalar_values = [vcd::Value::V0; 128];
        for (i, scalar_value) in scalar_values[..signal.bit_width as usize]
            .iter_mut()
            .enumerate()
        {
            let index = signal.bit_width - 1 - i as u32;
            if let Ok(logic) = value.get(index) {
                *scalar_value = logic.into();
            }
        }

        if signal.bit_width == 1 {
            self.w.change_scalar(signal.id, scalar_values[0])
        } else {
            self.w
                .change_vector(signal.id, &scalar_values[..signal.bit_width as usize])
        }
    }
}

struct VcdTraceSignal {
    bit_width: u32,
    id: vcd::IdCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_four_state_changes() {
        let mut buffer = Vec::new();
        {
            let mut trace = VcdTrace::new(&mut buffer, 1, TimeScaleUnit::Ns).unwrap();
            trace.push_module("Top").unwrap();
            let a = trace.add_signal("a", 1).unwrap();
            let b = trace.add_signal("b", 4).unwrap();
            trace.pop_module().unwrap();

            trace.update_time_stamp(0).unwrap();
            trace.update_signal(&a, &Value::z(1)).unwrap();
            trace
                .update_signal(&b, &Value::from_binary_str("10x1").unwrap())
                .unwrap();
            trace.update_time_stamp(5).unwrap();
            trace.update_signal(&a, &Value::from_bool(true)).unwrap();

            assert!(trace.update_signal(&b, &Value::zero(3)).is_err());
        }

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("$scope module Top $end"));
        assert!(text.contains("$enddefinitions $end"));
        assert!(text.contains("#0"));
        assert!(text.contains("b10x1 "));
        assert!(text.contains("#5"));
    }
}
