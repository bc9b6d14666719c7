use super::conditional::*;
use super::context::*;
use super::instance::*;
use super::module::*;

use crate::error::Error;
use crate::value::*;

use std::cell::RefCell;
use std::cmp::max;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Sub};
use std::ptr;

/// A stable identifier for a [`Signal`], unique within its [`Context`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(pub(crate) u32);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// The single component allowed to write an output or wire [`Signal`].
#[derive(Clone, Copy)]
pub enum Driver<'a> {
    /// A continuous assignment from another signal, created by [`Signal::drive`].
    Assign(&'a Signal<'a>),
    /// A [`ConditionalBlock`] that assigns the signal on at least one of its paths.
    Block(&'a ConditionalBlock<'a>),
}

impl<'a> Driver<'a> {
    pub(crate) fn describe(&self) -> String {
        match self {
            Driver::Assign(source) => format!("a continuous assignment from \"{}\"", source),
            Driver::Block(block) => block.describe(),
        }
    }
}

/// Represents a collection of 1 or more bits driven by some source.
///
/// A `Signal` can be created by several [`Module`] methods (eg. [`lit`], [`input`], [`wire`]) or as a result of combining existing `Signal`s (eg. [`concat`]). `Signal`s are local to their respective [`Module`]s.
///
/// Outputs and wires are state-holding: they keep their value until their single [`Driver`] writes them. Every other `Signal` is an expression over other signals.
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let c = Context::new();
///
/// let m = c.module("MyModule");
/// let a = m.lit(0xffu8, 8).unwrap(); // 8-bit signal
/// let b = m.input("my_input", 27).unwrap(); // 27-bit signal
/// let c = b.bits(7, 0).unwrap(); // 8-bit signal
/// let d = a + c; // 8-bit signal
/// let o = m.output("my_output", 8).unwrap();
/// o.drive(d).unwrap(); // 8-bit output driven by d
/// ```
///
/// [`concat`]: #method.concat
/// [`input`]: ./struct.Module.html#method.input
/// [`lit`]: ./struct.Module.html#method.lit
/// [`wire`]: ./struct.Module.html#method.wire
#[must_use]
pub struct Signal<'a> {
    pub(super) context: &'a Context<'a>,
    pub(crate) module: &'a Module<'a>,
    pub(crate) id: SignalId,

    pub(crate) data: SignalData<'a>,
}

impl<'a> Signal<'a> {
    /// Returns the bit width of the given `Signal`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// assert_eq!(m.lit(42u32, 7).unwrap().bit_width(), 7);
    /// assert_eq!(m.input("i", 27).unwrap().bit_width(), 27);
    /// assert_eq!((!m.low()).bit_width(), 1);
    /// assert_eq!((m.lit(25u8, 8).unwrap() + m.lit(42u8, 6).unwrap()).bit_width(), 8);
    /// assert_eq!(m.high().repeat(35).unwrap().bit_width(), 35);
    /// assert_eq!(m.lit(1u32, 20).unwrap().concat(m.high()).unwrap().bit_width(), 21);
    /// assert_eq!(m.lit(0xaau32, 8).unwrap().lt(m.lit(0xaau32, 8).unwrap()).bit_width(), 1);
    /// ```
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        match &self.data {
            SignalData::Lit { value } => value.width(),
            SignalData::Input { bit_width, .. } => *bit_width,
            SignalData::Output { bit_width, .. } => *bit_width,
            SignalData::Wire { bit_width, .. } => *bit_width,
            SignalData::UnOp { source, .. } => source.bit_width(),
            SignalData::BinOp { bit_width, .. } => *bit_width,
            SignalData::Bits {
                range_high,
                range_low,
                ..
            } => range_high - range_low + 1,
            SignalData::Repeat { source, count } => source.bit_width() * count,
            SignalData::Concat { lhs, rhs } => lhs.bit_width() + rhs.bit_width(),
            SignalData::Mux { bit_width, .. } => *bit_width,
            SignalData::Extend { bit_width, .. } => *bit_width,
            SignalData::InstanceOutput { bit_width, .. } => *bit_width,
        }
    }

    /// Returns this `Signal`'s stable identifier.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Returns the [`Module`] this `Signal` belongs to.
    pub fn module(&self) -> &'a Module<'a> {
        self.module
    }

    /// Returns the user-given name of an input, output or named wire.
    pub fn name(&self) -> Option<&str> {
        match &self.data {
            SignalData::Input { name, .. } | SignalData::Output { name, .. } => Some(name),
            SignalData::Wire { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for inputs, outputs and wires, which hold a value between updates.
    pub fn is_state_holding(&self) -> bool {
        matches!(
            self.data,
            SignalData::Input { .. } | SignalData::Output { .. } | SignalData::Wire { .. }
        )
    }

    pub(crate) fn driver_slot(&self) -> Option<&RefCell<Option<Driver<'a>>>> {
        match &self.data {
            SignalData::Output { driver, .. } | SignalData::Wire { driver, .. } => Some(driver),
            _ => None,
        }
    }

    /// Returns this `Signal`'s [`Driver`], if it has one.
    pub fn driver(&self) -> Option<Driver<'a>> {
        self.driver_slot().and_then(|slot| *slot.borrow())
    }

    /// Drives this output or wire continuously with `source`.
    ///
    /// Width compatibility is checked when the enclosing [`Module`] is [`build`](./struct.Module.html#method.build)t.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleAlreadyBuilt`] after the module was built, [`Error::SignalFromOtherModule`] if `source` belongs to another module, [`Error::NotAssignable`] if this `Signal` is not an output or wire, and [`Error::MultipleDriver`] if it is already driven.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    /// let w = m.wire("w", 1).unwrap();
    /// w.drive(m.high()).unwrap();
    ///
    /// assert!(matches!(w.drive(m.low()), Err(Error::MultipleDriver { .. })));
    /// ```
    pub fn drive(&'a self, source: &'a Signal<'a>) -> Result<(), Error> {
        self.module.check_not_built("drive a signal")?;
        self.module.check_owns(source)?;
        let slot = self.driver_slot().ok_or_else(|| Error::NotAssignable {
            module: self.module.name.clone(),
            signal: self.to_string(),
        })?;
        let requested = Driver::Assign(source);
        if let Some(existing) = *slot.borrow() {
            return Err(Error::MultipleDriver {
                module: self.module.name.clone(),
                signal: self.to_string(),
                existing: existing.describe(),
                requested: requested.describe(),
            });
        }
        *slot.borrow_mut() = Some(requested);
        Ok(())
    }

    fn alloc(&'a self, data: SignalData<'a>) -> &'a Signal<'a> {
        self.context.alloc_signal(self.module, data)
    }

    fn check_same_module(&self, other: &Signal<'a>) {
        if !ptr::eq(self.module, other.module) {
            panic!("Attempted to combine signals from different modules.");
        }
    }

    fn bin_op(&'a self, rhs: &'a Signal<'a>, op: BinOp) -> &'a Signal<'a> {
        self.check_same_module(rhs);
        let bit_width = match op {
            BinOp::Equal
            | BinOp::NotEqual
            | BinOp::LessThan
            | BinOp::LessThanEqual
            | BinOp::GreaterThan
            | BinOp::GreaterThanEqual
            | BinOp::LessThanSigned
            | BinOp::LessThanEqualSigned
            | BinOp::GreaterThanSigned
            | BinOp::GreaterThanEqualSigned => 1,
            BinOp::Shl | BinOp::Shr | BinOp::ShrArithmetic => self.bit_width(),
            _ => max(self.bit_width(), rhs.bit_width()),
        };
        self.alloc(SignalData::BinOp {
            lhs: self,
            rhs,
            op,
            bit_width,
        })
    }

    /// Creates a `Signal` that represents the value of the single bit of this `Signal` at index `index`, where `index` equal to `0` represents this `Signal`'s least significant bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is greater than or equal to this `Signal`'s `bit_width`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let lit = m.lit(0b0110u32, 4).unwrap();
    /// let bit_0 = lit.bit(0).unwrap(); // Represents 0
    /// let bit_1 = lit.bit(1).unwrap(); // Represents 1
    /// assert!(lit.bit(4).is_err());
    /// ```
    pub fn bit(&'a self, index: u32) -> Result<&'a Signal<'a>, Error> {
        self.bits(index, index)
    }

    /// Creates a `Signal` that represents the inclusive bit range `[range_high:range_low]` of this `Signal`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `range_high` is not a valid bit index, and [`Error::InvalidRange`] if `range_low` is greater than `range_high`.
    pub fn bits(&'a self, range_high: u32, range_low: u32) -> Result<&'a Signal<'a>, Error> {
        if range_high < range_low {
            return Err(Error::InvalidRange {
                high: range_high,
                low: range_low,
            });
        }
        if range_high >= self.bit_width() {
            return Err(Error::IndexOutOfRange {
                index: range_high,
                width: self.bit_width(),
            });
        }
        Ok(self.alloc(SignalData::Bits {
            source: self,
            range_high,
            range_low,
        }))
    }

    /// Creates a `Signal` that represents this `Signal` repeated `count` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitWidth`] if `count` is zero or the result would exceed [`MAX_SIGNAL_BIT_WIDTH`].
    pub fn repeat(&'a self, count: u32) -> Result<&'a Signal<'a>, Error> {
        check_bit_width("repetition", self.bit_width().saturating_mul(count))?;
        Ok(self.alloc(SignalData::Repeat {
            source: self,
            count,
        }))
    }

    /// Creates a `Signal` that represents this `Signal` (most significant part) concatenated with `rhs` (least significant part).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitWidth`] if the result would exceed [`MAX_SIGNAL_BIT_WIDTH`].
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    pub fn concat(&'a self, rhs: &'a Signal<'a>) -> Result<&'a Signal<'a>, Error> {
        self.check_same_module(rhs);
        check_bit_width("concatenation", self.bit_width() + rhs.bit_width())?;
        Ok(self.alloc(SignalData::Concat { lhs: self, rhs }))
    }

    fn extend(&'a self, bit_width: u32, signed: bool) -> Result<&'a Signal<'a>, Error> {
        check_bit_width("extension", bit_width)?;
        if bit_width < self.bit_width() {
            return Err(Error::WidthMismatch {
                context: format!(
                    "cannot extend the {}-bit signal \"{}\" to {} bit(s)",
                    self.bit_width(),
                    self,
                    bit_width
                ),
                expected: bit_width,
                actual: self.bit_width(),
            });
        }
        if bit_width == self.bit_width() {
            return Ok(self);
        }
        Ok(self.alloc(SignalData::Extend {
            source: self,
            bit_width,
            signed,
        }))
    }

    /// Creates a `Signal` that represents this `Signal` zero-extended to `bit_width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WidthMismatch`] if `bit_width` is narrower than this `Signal`.
    pub fn zero_extend(&'a self, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        self.extend(bit_width, false)
    }

    /// Creates a `Signal` that represents this `Signal` sign-extended to `bit_width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WidthMismatch`] if `bit_width` is narrower than this `Signal`.
    pub fn sign_extend(&'a self, bit_width: u32) -> Result<&'a Signal<'a>, Error> {
        self.extend(bit_width, true)
    }

    /// Creates a 1-bit `Signal` that is high when this `Signal` equals `rhs`.
    ///
    /// Operands of different widths are zero-extended to the wider width. The result is X if unknown bits make the comparison ambiguous.
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    pub fn eq(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::Equal)
    }

    /// Creates a 1-bit `Signal` that is high when this `Signal` differs from `rhs`.
    pub fn ne(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::NotEqual)
    }

    /// Unsigned `<`.
    pub fn lt(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::LessThan)
    }

    /// Unsigned `<=`.
    pub fn le(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::LessThanEqual)
    }

    /// Unsigned `>`.
    pub fn gt(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::GreaterThan)
    }

    /// Unsigned `>=`.
    pub fn ge(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::GreaterThanEqual)
    }

    /// Two's complement `<`.
    pub fn lt_signed(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::LessThanSigned)
    }

    /// Two's complement `<=`.
    pub fn le_signed(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::LessThanEqualSigned)
    }

    /// Two's complement `>`.
    pub fn gt_signed(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::GreaterThanSigned)
    }

    /// Two's complement `>=`.
    pub fn ge_signed(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::GreaterThanEqualSigned)
    }

    /// Creates a `Signal` that represents the product of this `Signal` and `rhs`, truncated to the wider operand's width.
    pub fn mul(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::Mul)
    }

    /// Like [`mul`](#method.mul), but both operands are interpreted as two's complement numbers.
    pub fn mul_signed(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::MulSigned)
    }

    /// Logical left shift by `rhs` bits; the result is as wide as this `Signal`.
    pub fn shl(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::Shl)
    }

    /// Logical right shift by `rhs` bits; the result is as wide as this `Signal`.
    pub fn shr(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::Shr)
    }

    /// Arithmetic right shift by `rhs` bits; the result is as wide as this `Signal`.
    pub fn shr_arithmetic(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::ShrArithmetic)
    }

    /// Creates a `Signal` that selects `when_true` while this 1-bit `Signal` is high and `when_false` otherwise.
    ///
    /// The narrower candidate is zero-extended to the wider width.
    ///
    /// # Panics
    ///
    /// Panics if the signals belong to different [`Module`]s, or if this `Signal` isn't 1 bit wide.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let cond = m.input("cond", 1).unwrap();
    /// let a = m.input("a", 8).unwrap();
    /// let b = m.input("b", 8).unwrap();
    /// let o = m.output("o", 8).unwrap();
    /// o.drive(cond.mux(a, b)).unwrap(); // Outputs a when cond is high, b otherwise
    /// ```
    pub fn mux(&'a self, when_true: &'a Signal<'a>, when_false: &'a Signal<'a>) -> &'a Signal<'a> {
        self.check_same_module(when_true);
        self.check_same_module(when_false);
        if self.bit_width() != 1 {
            panic!(
                "Multiplexer conditionals can only be 1 bit wide, but the given condition is {} bits wide.",
                self.bit_width()
            );
        }
        self.alloc(SignalData::Mux {
            cond: self,
            when_true,
            when_false,
            bit_width: max(when_true.bit_width(), when_false.bit_width()),
        })
    }
}

impl<'a> fmt::Display for Signal<'a> {
    /// Formats the signal's user-given name, or a generated `s<id>` name for anonymous signals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.id),
        }
    }
}

impl<'a> Add for &'a Signal<'a> {
    type Output = Self;

    /// Combines two `Signal`s, producing a new `Signal` that represents the sum of the original two `Signal`s.
    ///
    /// The sum is truncated to the wider operand's width. If a carry bit is desired, the operands can be [`concat`]enated with a `0` bit before the operation.
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let lhs = m.lit(1u32, 32).unwrap();
    /// let rhs = m.lit(2u32, 32).unwrap();
    /// let sum = lhs + rhs; // Equivalent to m.lit(3u32, 32)
    /// ```
    ///
    /// [`concat`]: ./struct.Signal.html#method.concat
    fn add(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::Add)
    }
}

impl<'a> Sub for &'a Signal<'a> {
    type Output = Self;

    /// Wrapping difference, truncated to the wider operand's width.
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    fn sub(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::Sub)
    }
}

impl<'a> BitAnd for &'a Signal<'a> {
    type Output = Self;

    /// Combines two `Signal`s, producing a new `Signal` whose bits represent the bitwise `&` of each of the bits of the original two `Signal`s.
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("MyModule");
    ///
    /// let single_bitand = m.low() & m.high();
    /// let multi_bitand = m.lit(0b1100u32, 4).unwrap() & m.lit(0b1010u32, 4).unwrap(); // 0b1000
    /// ```
    fn bitand(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::BitAnd)
    }
}

impl<'a> BitOr for &'a Signal<'a> {
    type Output = Self;

    /// Combines two `Signal`s, producing a new `Signal` whose bits represent the bitwise `|` of each of the bits of the original two `Signal`s.
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    fn bitor(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::BitOr)
    }
}

impl<'a> BitXor for &'a Signal<'a> {
    type Output = Self;

    /// Combines two `Signal`s, producing a new `Signal` whose bits represent the bitwise `^` of each of the bits of the original two `Signal`s.
    ///
    /// # Panics
    ///
    /// Panics if `lhs` and `rhs` belong to different [`Module`]s.
    fn bitxor(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::BitXor)
    }
}

impl<'a> Not for &'a Signal<'a> {
    type Output = Self;

    /// Produces a new `Signal` whose bits represent the bitwise `!` of each of the bits of the original `Signal`.
    fn not(self) -> Self {
        self.alloc(SignalData::UnOp {
            source: self,
            op: UnOp::Not,
        })
    }
}

pub(crate) enum SignalData<'a> {
    Lit {
        value: Value,
    },

    Input {
        name: String,
        bit_width: u32,
    },
    Output {
        name: String,
        bit_width: u32,
        driver: RefCell<Option<Driver<'a>>>,
    },
    Wire {
        name: Option<String>,
        bit_width: u32,
        driver: RefCell<Option<Driver<'a>>>,
    },

    UnOp {
        source: &'a Signal<'a>,
        op: UnOp,
    },
    BinOp {
        lhs: &'a Signal<'a>,
        rhs: &'a Signal<'a>,
        op: BinOp,
        bit_width: u32,
    },

    Bits {
        source: &'a Signal<'a>,
        range_high: u32,
        range_low: u32,
    },

    Repeat {
        source: &'a Signal<'a>,
        count: u32,
    },
    Concat {
        lhs: &'a Signal<'a>,
        rhs: &'a Signal<'a>,
    },

    Mux {
        cond: &'a Signal<'a>,
        when_true: &'a Signal<'a>,
        when_false: &'a Signal<'a>,
        bit_width: u32,
    },

    Extend {
        source: &'a Signal<'a>,
        bit_width: u32,
        signed: bool,
    },

    InstanceOutput {
        instance: &'a Instance<'a>,
        name: String,
        bit_width: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnOp {
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    MulSigned,
    BitAnd,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThanSigned,
    LessThanEqualSigned,
    GreaterThanSigned,
    GreaterThanEqualSigned,
    Shl,
    Shr,
    ShrArithmetic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_index_oob_error() {
        let c = Context::new();

        let m = c.module("A");
        let i = m.input("i", 3).unwrap();

        assert!(i.bit(0).is_ok());
        assert!(i.bit(2).is_ok());

        assert!(matches!(
            i.bit(3),
            Err(Error::IndexOutOfRange { index: 3, width: 3 })
        ));
    }

    #[test]
    fn bits_range_errors() {
        let c = Context::new();

        let m = c.module("A");
        let i = m.input("i", 3).unwrap();

        assert_eq!(i.bits(2, 1).unwrap().bit_width(), 2);
        assert!(matches!(
            i.bits(3, 0),
            Err(Error::IndexOutOfRange { index: 3, width: 3 })
        ));
        assert!(matches!(
            i.bits(0, 1),
            Err(Error::InvalidRange { high: 0, low: 1 })
        ));
    }

    #[test]
    fn repeat_and_concat_width_errors() {
        let c = Context::new();

        let m = c.module("A");
        let i = m.input("i", 64).unwrap();

        assert!(matches!(
            i.repeat(0),
            Err(Error::InvalidBitWidth { width: 0, .. })
        ));
        assert!(matches!(
            i.repeat(3),
            Err(Error::InvalidBitWidth { width: 192, .. })
        ));
        assert_eq!(i.concat(i).unwrap().bit_width(), 128);
        assert!(i.concat(i).unwrap().concat(m.high()).is_err());
    }

    #[test]
    fn mixed_width_operands_take_the_wider_width() {
        let c = Context::new();

        let m = c.module("A");
        let a = m.input("a", 3).unwrap();
        let b = m.input("b", 5).unwrap();

        assert_eq!((a + b).bit_width(), 5);
        assert_eq!((a & b).bit_width(), 5);
        assert_eq!(a.mul(b).bit_width(), 5);
        assert_eq!(a.shl(b).bit_width(), 3);
        assert_eq!(a.eq(b).bit_width(), 1);
        assert_eq!(m.high().mux(a, b).bit_width(), 5);
    }

    #[test]
    fn extension() {
        let c = Context::new();

        let m = c.module("A");
        let a = m.input("a", 3).unwrap();

        assert_eq!(a.zero_extend(8).unwrap().bit_width(), 8);
        assert_eq!(a.sign_extend(3).unwrap().id(), a.id());
        assert!(matches!(
            a.zero_extend(2),
            Err(Error::WidthMismatch {
                expected: 2,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn names() {
        let c = Context::new();

        let m = c.module("A");
        let a = m.input("a", 3).unwrap();
        let w = m.anonymous_wire(3).unwrap();

        assert_eq!(a.name(), Some("a"));
        assert_eq!(a.to_string(), "a");
        assert_eq!(w.name(), None);
        assert_eq!(w.to_string(), format!("s{}", w.id().0));
        assert_eq!((!a).name(), None);
    }

    #[test]
    fn drive_errors() {
        let c = Context::new();

        let m = c.module("A");
        let n = c.module("B");
        let a = m.input("a", 1).unwrap();
        let o = m.output("o", 1).unwrap();

        assert!(matches!(
            a.drive(m.high()),
            Err(Error::NotAssignable { .. })
        ));
        assert!(matches!(
            o.drive(n.high()),
            Err(Error::SignalFromOtherModule { .. })
        ));
        o.drive(a).unwrap();
        assert!(matches!(o.driver(), Some(Driver::Assign(_))));
        assert!(matches!(
            o.drive(!a),
            Err(Error::MultipleDriver { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "Attempted to combine signals from different modules.")]
    fn add_separate_module_error() {
        let c = Context::new();

        let a = c.module("A");
        let b = c.module("B");

        // Panic
        let _ = a.high() + b.high();
    }

    #[test]
    #[should_panic(
        expected = "Multiplexer conditionals can only be 1 bit wide, but the given condition is 2 bits wide."
    )]
    fn mux_cond_bit_width_error() {
        let c = Context::new();

        let m = c.module("A");
        let cond = m.input("cond", 2).unwrap();

        // Panic
        let _ = cond.mux(m.high(), m.low());
    }
}
