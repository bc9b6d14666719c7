//! Four-state logic values.
//!
//! A [`Value`] is an immutable, fixed-width vector of [`Logic`] bits. Operators follow
//! IEEE 1364 semantics: bitwise operators use the standard truth tables, while any X or Z
//! operand bit makes an arithmetic or relational result entirely X. Z reads as X in
//! every operator.

use crate::error::Error;

use serde::{Serialize, Serializer};

use std::cmp::{max, Ordering};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// The minimum allowed bit width for any given [`Value`] or [`Signal`](crate::Signal).
pub const MIN_SIGNAL_BIT_WIDTH: u32 = 1;
/// The maximum allowed bit width for any given [`Value`] or [`Signal`](crate::Signal).
///
/// This is set to `128` so that both value planes fit into native integers.
pub const MAX_SIGNAL_BIT_WIDTH: u32 = 128;

pub(crate) fn check_bit_width(context: &str, bit_width: u32) -> Result<(), Error> {
    if !(MIN_SIGNAL_BIT_WIDTH..=MAX_SIGNAL_BIT_WIDTH).contains(&bit_width) {
        return Err(Error::InvalidBitWidth {
            context: context.into(),
            width: bit_width,
            min: MIN_SIGNAL_BIT_WIDTH,
            max: MAX_SIGNAL_BIT_WIDTH,
        });
    }
    Ok(())
}

fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// A single four-state bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Logic {
    /// Logic low.
    Zero,
    /// Logic high.
    One,
    /// Unknown.
    X,
    /// High impedance.
    Z,
}

impl Logic {
    /// Parses `0`, `1`, `x`/`X` or `z`/`Z`.
    pub fn from_char(c: char) -> Option<Logic> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Returns the lowercase digit for this bit.
    pub fn to_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }

    /// Returns `true` for 0 and 1.
    pub fn is_known(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A container for different types of integer constant values.
///
/// This type isn't typically used explicitly, as the graph and simulator APIs take `Constant` parameters as `Into<Constant>`, and `Constant` implements `From` for Rust's unsigned integer types. Prefer passing integer values/literals directly.
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
/// let a = m.lit(true, 16).unwrap();
/// let b = m.lit(0xdeadbeefu32, 47).unwrap();
/// let d = m.lit(42u8, 8).unwrap();
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constant {
    /// Contains a boolean value
    Bool(bool),
    /// Contains an unsigned, 32-bit value
    U32(u32),
    /// Contains an unsigned, 64-bit value
    U64(u64),
    /// Contains an unsigned, 128-bit value
    U128(u128),
}

impl Constant {
    pub(crate) fn required_bits(&self) -> u32 {
        128 - self.numeric_value().leading_zeros()
    }

    pub(crate) fn numeric_value(&self) -> u128 {
        match *self {
            Constant::Bool(value) => value.into(),
            Constant::U32(value) => value.into(),
            Constant::U64(value) => value.into(),
            Constant::U128(value) => value,
        }
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Bool(value)
    }
}

impl From<u8> for Constant {
    fn from(value: u8) -> Self {
        Constant::U32(value.into())
    }
}

impl From<u16> for Constant {
    fn from(value: u16) -> Self {
        Constant::U32(value.into())
    }
}

impl From<u32> for Constant {
    fn from(value: u32) -> Self {
        Constant::U32(value)
    }
}

impl From<u64> for Constant {
    fn from(value: u64) -> Self {
        Constant::U64(value)
    }
}

impl From<u128> for Constant {
    fn from(value: u128) -> Self {
        Constant::U128(value)
    }
}

/// An immutable four-state bit vector with a fixed width between [`MIN_SIGNAL_BIT_WIDTH`] and [`MAX_SIGNAL_BIT_WIDTH`] bits.
///
/// Width is part of a value's identity: `PartialEq` compares width and every bit. Use [`equals_extended`](#method.equals_extended) to compare values of different widths.
///
/// Binary operations accept operands of different widths; the narrower operand is zero-extended (sign-extended for signed operations) to the wider operand's width, which is also the width of the result unless stated otherwise.
///
/// # Examples
///
/// ```
/// use ember::*;
///
/// let a = Value::from_u128(0b1010, 4);
/// let b = Value::from_binary_str("01x1").unwrap();
///
/// assert_eq!((&a & &b).to_string(), "00x0");
/// assert_eq!(a.add(&b), Value::x(4));
/// assert_eq!(a.bits(3, 2).unwrap().to_u64(), Some(0b10));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Value {
    width: u32,
    // Each bit is encoded by one bit of both planes: (unknown, bits) =
    // (0, 0) -> 0, (0, 1) -> 1, (1, 0) -> X, (1, 1) -> Z.
    bits: u128,
    unknown: u128,
}

impl Value {
    fn assert_width(width: u32) {
        if !(MIN_SIGNAL_BIT_WIDTH..=MAX_SIGNAL_BIT_WIDTH).contains(&width) {
            panic!(
                "Cannot create a value with {} bit(s). Values must be between {} and {} bit(s) wide.",
                width, MIN_SIGNAL_BIT_WIDTH, MAX_SIGNAL_BIT_WIDTH
            );
        }
    }

    /// Creates a fully-known value from the low `width` bits of `value`. Higher bits are discarded.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside of [`MIN_SIGNAL_BIT_WIDTH`]..=[`MAX_SIGNAL_BIT_WIDTH`].
    pub fn from_u128(value: u128, width: u32) -> Value {
        Value::assert_width(width);
        Value {
            width,
            bits: value & mask(width),
            unknown: 0,
        }
    }

    /// Creates a 1-bit value.
    pub fn from_bool(value: bool) -> Value {
        Value::from_u128(value.into(), 1)
    }

    /// Converts `value` into a `width`-bit value, failing if it doesn't fit.
    ///
    /// ```
    /// use ember::*;
    ///
    /// assert_eq!(Value::from_constant(5u32, 3).unwrap().to_u64(), Some(5));
    /// assert!(Value::from_constant(8u32, 3).is_err());
    /// ```
    pub fn from_constant(value: impl Into<Constant>, width: u32) -> Result<Value, Error> {
        check_bit_width("value", width)?;
        let value = value.into();
        let required = value.required_bits();
        if required > width {
            return Err(Error::ValueOverflow {
                value: value.numeric_value(),
                width,
                required,
            });
        }
        Ok(Value::from_u128(value.numeric_value(), width))
    }

    /// Creates a value whose bits are all 0.
    pub fn zero(width: u32) -> Value {
        Value::from_u128(0, width)
    }

    /// Creates a value whose bits are all 1.
    pub fn ones(width: u32) -> Value {
        Value::from_u128(u128::MAX, width)
    }

    /// Creates a value whose bits are all X.
    pub fn x(width: u32) -> Value {
        Value::assert_width(width);
        Value {
            width,
            bits: 0,
            unknown: mask(width),
        }
    }

    /// Creates a value whose bits are all Z.
    pub fn z(width: u32) -> Value {
        Value::assert_width(width);
        Value {
            width,
            bits: mask(width),
            unknown: mask(width),
        }
    }

    /// Parses a string of `0`, `1`, `x` and `z` digits, most significant bit first. Underscores are ignored.
    ///
    /// Returns `None` for other characters or an unsupported number of digits.
    pub fn from_binary_str(s: &str) -> Option<Value> {
        let mut width = 0;
        let mut bits = 0u128;
        let mut unknown = 0u128;
        for c in s.chars().filter(|&c| c != '_') {
            let logic = Logic::from_char(c)?;
            width += 1;
            if width > MAX_SIGNAL_BIT_WIDTH {
                return None;
            }
            bits <<= 1;
            unknown <<= 1;
            match logic {
                Logic::Zero => {}
                Logic::One => bits |= 1,
                Logic::X => unknown |= 1,
                Logic::Z => {
                    bits |= 1;
                    unknown |= 1;
                }
            }
        }
        if width < MIN_SIGNAL_BIT_WIDTH {
            return None;
        }
        Some(Value {
            width,
            bits,
            unknown,
        })
    }

    /// Returns the number of bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `true` if no bit is X or Z.
    pub fn is_known(&self) -> bool {
        self.unknown == 0
    }

    /// Returns the numeric value, or `None` if any bit is X or Z.
    pub fn to_u128(&self) -> Option<u128> {
        if self.is_known() {
            Some(self.bits)
        } else {
            None
        }
    }

    /// Returns the numeric value, or `None` if any bit is X or Z or the value doesn't fit into a `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|value| u64::try_from(value).ok())
    }

    /// Returns `true` if the value is known and non-zero.
    pub(crate) fn is_true(&self) -> bool {
        self.is_known() && self.bits != 0
    }

    fn to_i128(&self) -> i128 {
        let shift = 128 - self.width;
        ((self.bits << shift) as i128) >> shift
    }

    /// Returns the bit at `index`, where `0` is the least significant bit.
    pub fn get(&self, index: u32) -> Result<Logic, Error> {
        if index >= self.width {
            return Err(Error::IndexOutOfRange {
                index,
                width: self.width,
            });
        }
        let bit = (self.bits >> index) & 1 != 0;
        let unknown = (self.unknown >> index) & 1 != 0;
        Ok(match (unknown, bit) {
            (false, false) => Logic::Zero,
            (false, true) => Logic::One,
            (true, false) => Logic::X,
            (true, true) => Logic::Z,
        })
    }

    /// Returns a 1-bit value holding the bit at `index`.
    pub fn bit(&self, index: u32) -> Result<Value, Error> {
        self.bits(index, index)
    }

    /// Returns the inclusive bit range `[high:low]`.
    pub fn bits(&self, high: u32, low: u32) -> Result<Value, Error> {
        if high < low {
            return Err(Error::InvalidRange { high, low });
        }
        if high >= self.width {
            return Err(Error::IndexOutOfRange {
                index: high,
                width: self.width,
            });
        }
        let width = high - low + 1;
        Ok(Value {
            width,
            bits: (self.bits >> low) & mask(width),
            unknown: (self.unknown >> low) & mask(width),
        })
    }

    /// Concatenates `self` (most significant part) with `lower` (least significant part).
    pub fn concat(&self, lower: &Value) -> Result<Value, Error> {
        let width = self.width + lower.width;
        check_bit_width("concatenation", width)?;
        Ok(Value {
            width,
            bits: (self.bits << lower.width) | lower.bits,
            unknown: (self.unknown << lower.width) | lower.unknown,
        })
    }

    /// Concatenates `values`, the first element becoming the most significant part.
    pub fn concat_all(values: &[Value]) -> Result<Value, Error> {
        let (first, rest) = values.split_first().ok_or_else(|| Error::InvalidBitWidth {
            context: "concatenation".into(),
            width: 0,
            min: MIN_SIGNAL_BIT_WIDTH,
            max: MAX_SIGNAL_BIT_WIDTH,
        })?;
        rest.iter()
            .try_fold(first.clone(), |acc, value| acc.concat(value))
    }

    /// Concatenates `count` copies of `self`.
    pub fn repeat(&self, count: u32) -> Result<Value, Error> {
        check_bit_width("repetition", self.width.saturating_mul(count))?;
        let mut ret = self.clone();
        for _ in 1..count {
            ret = ret.concat(self)?;
        }
        Ok(ret)
    }

    fn extended(&self, width: u32, signed: bool) -> Value {
        if width <= self.width {
            return self.clone();
        }
        let fill = mask(width) & !mask(self.width);
        let sign = self.width - 1;
        let mut ret = Value {
            width,
            ..self.clone()
        };
        if signed {
            if (self.bits >> sign) & 1 != 0 {
                ret.bits |= fill;
            }
            if (self.unknown >> sign) & 1 != 0 {
                ret.unknown |= fill;
            }
        }
        ret
    }

    fn checked_extension(&self, width: u32, signed: bool, what: &str) -> Result<Value, Error> {
        check_bit_width(what, width)?;
        if width < self.width {
            return Err(Error::WidthMismatch {
                context: format!("cannot {} a {}-bit value to {} bit(s)", what, self.width, width),
                expected: width,
                actual: self.width,
            });
        }
        Ok(self.extended(width, signed))
    }

    /// Extends to `width` bits with zeros. Fails if `width` is narrower than this value.
    pub fn zero_extend(&self, width: u32) -> Result<Value, Error> {
        self.checked_extension(width, false, "zero-extend")
    }

    /// Extends to `width` bits by replicating the most significant bit. Fails if `width` is narrower than this value.
    pub fn sign_extend(&self, width: u32) -> Result<Value, Error> {
        self.checked_extension(width, true, "sign-extend")
    }

    /// Truncates or zero-extends to exactly `width` bits.
    pub fn resize(&self, width: u32) -> Result<Value, Error> {
        check_bit_width("resize", width)?;
        if width >= self.width {
            return Ok(self.extended(width, false));
        }
        self.bits(width - 1, 0)
    }

    /// Compares two values after zero-extending the narrower one, so `4'b0011` equals `2'b11`.
    pub fn equals_extended(&self, other: &Value) -> bool {
        let (a, b) = Value::widen(self, other, false);
        a == b
    }

    fn widen(lhs: &Value, rhs: &Value, signed: bool) -> (Value, Value) {
        let width = max(lhs.width, rhs.width);
        (lhs.extended(width, signed), rhs.extended(width, signed))
    }

    fn known_zeros(&self) -> u128 {
        !self.bits & !self.unknown & mask(self.width)
    }

    fn known_ones(&self) -> u128 {
        self.bits & !self.unknown
    }

    /// Bitwise AND. A known 0 on either side wins over X and Z.
    pub fn and(&self, rhs: &Value) -> Value {
        let (a, b) = Value::widen(self, rhs, false);
        let zeros = a.known_zeros() | b.known_zeros();
        let ones = a.known_ones() & b.known_ones();
        Value {
            width: a.width,
            bits: ones,
            unknown: mask(a.width) & !(zeros | ones),
        }
    }

    /// Bitwise OR. A known 1 on either side wins over X and Z.
    pub fn or(&self, rhs: &Value) -> Value {
        let (a, b) = Value::widen(self, rhs, false);
        let ones = a.known_ones() | b.known_ones();
        let zeros = a.known_zeros() & b.known_zeros();
        Value {
            width: a.width,
            bits: ones,
            unknown: mask(a.width) & !(zeros | ones),
        }
    }

    /// Bitwise XOR. Any X or Z operand bit yields X.
    pub fn xor(&self, rhs: &Value) -> Value {
        let (a, b) = Value::widen(self, rhs, false);
        let unknown = a.unknown | b.unknown;
        Value {
            width: a.width,
            bits: (a.bits ^ b.bits) & !unknown,
            unknown,
        }
    }

    /// Bitwise NOT. X and Z bits become X.
    pub fn not(&self) -> Value {
        Value {
            width: self.width,
            bits: !self.bits & !self.unknown & mask(self.width),
            unknown: self.unknown,
        }
    }

    fn arithmetic(&self, rhs: &Value, signed: bool, op: impl FnOnce(u128, u128) -> Option<u128>) -> Value {
        let (a, b) = Value::widen(self, rhs, signed);
        if !a.is_known() || !b.is_known() {
            return Value::x(a.width);
        }
        match op(a.bits, b.bits) {
            Some(result) => Value::from_u128(result, a.width),
            None => Value::x(a.width),
        }
    }

    /// Wrapping addition.
    pub fn add(&self, rhs: &Value) -> Value {
        self.arithmetic(rhs, false, |a, b| Some(a.wrapping_add(b)))
    }

    /// Wrapping subtraction.
    pub fn sub(&self, rhs: &Value) -> Value {
        self.arithmetic(rhs, false, |a, b| Some(a.wrapping_sub(b)))
    }

    /// Wrapping multiplication, truncated to the wider operand's width.
    pub fn mul(&self, rhs: &Value) -> Value {
        self.arithmetic(rhs, false, |a, b| Some(a.wrapping_mul(b)))
    }

    /// Two's complement multiplication; operands are sign-extended to the wider width.
    pub fn mul_signed(&self, rhs: &Value) -> Value {
        // The low bits of a product are the same for signed and unsigned operands once
        // both are sign-extended to the result width.
        self.arithmetic(rhs, true, |a, b| Some(a.wrapping_mul(b)))
    }

    /// Unsigned division. A divisor of zero, or any X/Z operand bit, yields all X.
    pub fn div(&self, rhs: &Value) -> Value {
        self.arithmetic(rhs, false, |a, b| a.checked_div(b))
    }

    /// Unsigned remainder. A divisor of zero, or any X/Z operand bit, yields all X.
    pub fn rem(&self, rhs: &Value) -> Value {
        self.arithmetic(rhs, false, |a, b| a.checked_rem(b))
    }

    fn shift_amount(&self, amount: &Value) -> Option<u32> {
        let amount = amount.to_u128()?;
        Some(if amount >= u128::from(self.width) {
            self.width
        } else {
            amount as u32
        })
    }

    /// Logical left shift. The result has the width of `self`.
    pub fn shl(&self, amount: &Value) -> Value {
        match self.shift_amount(amount) {
            Some(shift) if shift >= self.width => Value::zero(self.width),
            Some(shift) => Value {
                width: self.width,
                bits: (self.bits << shift) & mask(self.width),
                unknown: (self.unknown << shift) & mask(self.width),
            },
            None => Value::x(self.width),
        }
    }

    /// Logical right shift. The result has the width of `self`.
    pub fn shr(&self, amount: &Value) -> Value {
        match self.shift_amount(amount) {
            Some(shift) if shift >= self.width => Value::zero(self.width),
            Some(shift) => Value {
                width: self.width,
                bits: self.bits >> shift,
                unknown: self.unknown >> shift,
            },
            None => Value::x(self.width),
        }
    }

    /// Arithmetic right shift, filling with the sign bit. The result has the width of `self`.
    pub fn shr_arithmetic(&self, amount: &Value) -> Value {
        let shift = match self.shift_amount(amount) {
            Some(shift) => shift.min(127),
            None => return Value::x(self.width),
        };
        let wide = self.extended(128, true);
        Value {
            width: self.width,
            bits: (((wide.bits as i128) >> shift) as u128) & mask(self.width),
            unknown: (((wide.unknown as i128) >> shift) as u128) & mask(self.width),
        }
    }

    /// `==` with IEEE 1364 semantics: X only when unknown bits make the result ambiguous.
    pub fn logical_eq(&self, rhs: &Value) -> Value {
        let (a, b) = Value::widen(self, rhs, false);
        let known = !a.unknown & !b.unknown & mask(a.width);
        if (a.bits ^ b.bits) & known != 0 {
            Value::from_bool(false)
        } else if !a.is_known() || !b.is_known() {
            Value::x(1)
        } else {
            Value::from_bool(true)
        }
    }

    /// `!=` with IEEE 1364 semantics.
    pub fn logical_ne(&self, rhs: &Value) -> Value {
        self.logical_eq(rhs).not()
    }

    /// `===`: exact four-state comparison after zero-extension.
    pub fn case_eq(&self, rhs: &Value) -> bool {
        self.equals_extended(rhs)
    }

    fn compare(&self, rhs: &Value, signed: bool, pred: impl FnOnce(Ordering) -> bool) -> Value {
        let (a, b) = Value::widen(self, rhs, signed);
        if !a.is_known() || !b.is_known() {
            return Value::x(1);
        }
        let ordering = if signed {
            a.to_i128().cmp(&b.to_i128())
        } else {
            a.bits.cmp(&b.bits)
        };
        Value::from_bool(pred(ordering))
    }

    /// Unsigned `<`; X if either operand has an X or Z bit.
    pub fn lt(&self, rhs: &Value) -> Value {
        self.compare(rhs, false, Ordering::is_lt)
    }

    /// Unsigned `<=`.
    pub fn le(&self, rhs: &Value) -> Value {
        self.compare(rhs, false, Ordering::is_le)
    }

    /// Unsigned `>`.
    pub fn gt(&self, rhs: &Value) -> Value {
        self.compare(rhs, false, Ordering::is_gt)
    }

    /// Unsigned `>=`.
    pub fn ge(&self, rhs: &Value) -> Value {
        self.compare(rhs, false, Ordering::is_ge)
    }

    /// Two's complement `<`; operands are sign-extended to the wider width.
    pub fn lt_signed(&self, rhs: &Value) -> Value {
        self.compare(rhs, true, Ordering::is_lt)
    }

    /// Two's complement `<=`.
    pub fn le_signed(&self, rhs: &Value) -> Value {
        self.compare(rhs, true, Ordering::is_le)
    }

    /// Two's complement `>`.
    pub fn gt_signed(&self, rhs: &Value) -> Value {
        self.compare(rhs, true, Ordering::is_gt)
    }

    /// Two's complement `>=`.
    pub fn ge_signed(&self, rhs: &Value) -> Value {
        self.compare(rhs, true, Ordering::is_ge)
    }

    /// Selects `when_true` if `cond` is non-zero and `when_false` if it's zero.
    ///
    /// If `cond` is ambiguous, bits on which both candidates agree are kept and all others become X.
    pub fn mux(cond: &Value, when_true: &Value, when_false: &Value) -> Value {
        let (t, f) = Value::widen(when_true, when_false, false);
        if cond.known_ones() != 0 {
            return t;
        }
        if cond.is_known() {
            return f;
        }
        let unknown = t.unknown | f.unknown | (t.bits ^ f.bits);
        Value {
            width: t.width,
            bits: t.bits & !unknown,
            unknown,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::from_bool(value)
    }
}

impl<'a> BitAnd for &'a Value {
    type Output = Value;

    fn bitand(self, rhs: Self) -> Value {
        self.and(rhs)
    }
}

impl<'a> BitOr for &'a Value {
    type Output = Value;

    fn bitor(self, rhs: Self) -> Value {
        self.or(rhs)
    }
}

impl<'a> BitXor for &'a Value {
    type Output = Value;

    fn bitxor(self, rhs: Self) -> Value {
        self.xor(rhs)
    }
}

impl<'a> Not for &'a Value {
    type Output = Value;

    fn not(self) -> Value {
        Value::not(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            let logic = self.get(i).map_err(|_| fmt::Error)?;
            write!(f, "{}", logic)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{}", self.width, self)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Value {
        Value::from_binary_str(s).unwrap()
    }

    #[test]
    fn and_truth_table() {
        assert_eq!((&v("0000") & &v("01xz")).to_string(), "0000");
        assert_eq!((&v("1111") & &v("01xz")).to_string(), "01xx");
        assert_eq!((&v("xxxx") & &v("01xz")).to_string(), "0xxx");
    }

    #[test]
    fn or_truth_table() {
        assert_eq!((&v("0000") | &v("01xz")).to_string(), "01xx");
        assert_eq!((&v("1111") | &v("01xz")).to_string(), "1111");
        assert_eq!((&v("zzzz") | &v("01xz")).to_string(), "x1xx");
    }

    #[test]
    fn xor_and_not_propagate_unknowns() {
        assert_eq!((&v("0101") ^ &v("0x1z")).to_string(), "0x1x");
        assert_eq!((!&v("01xz")).to_string(), "10xx");
    }

    #[test]
    fn mixed_width_operands_are_zero_extended() {
        let r = &v("1111") & &v("11");
        assert_eq!(r.width(), 4);
        assert_eq!(r.to_u64(), Some(0b0011));
    }

    #[test]
    fn addition_wraps() {
        let r = Value::from_u128(0xf, 4).add(&Value::from_u128(1, 4));
        assert_eq!(r, Value::zero(4));
        let r = Value::from_u128(u128::MAX, 128).add(&Value::from_u128(2, 128));
        assert_eq!(r.to_u128(), Some(1));
    }

    #[test]
    fn arithmetic_with_unknown_is_all_x() {
        assert_eq!(v("0001").add(&v("000x")), Value::x(4));
        assert_eq!(v("0011").sub(&v("z000")), Value::x(4));
        assert_eq!(v("0011").mul(&v("x000")), Value::x(4));
    }

    #[test]
    fn division_by_unknown_or_zero_is_all_x() {
        assert_eq!(v("1000").div(&v("00x1")), Value::x(4));
        assert_eq!(v("1000").div(&Value::zero(4)), Value::x(4));
        assert_eq!(v("1000").rem(&Value::zero(4)), Value::x(4));
        assert_eq!(v("1001").div(&v("0010")).to_u64(), Some(4));
        assert_eq!(v("1001").rem(&v("0010")).to_u64(), Some(1));
    }

    #[test]
    fn signed_multiplication_wraps() {
        // -2 * 3 = -6
        let r = Value::from_u128(0b1110, 4).mul_signed(&Value::from_u128(0b11, 3));
        assert_eq!(r.width(), 4);
        assert_eq!(r.to_u64(), Some(0b1010));
    }

    #[test]
    fn comparisons() {
        let a = Value::from_u128(3, 4);
        let b = Value::from_u128(12, 4);
        assert_eq!(a.lt(&b), Value::from_bool(true));
        assert_eq!(a.ge(&b), Value::from_bool(false));
        // 12 is -4 when signed
        assert_eq!(a.lt_signed(&b), Value::from_bool(false));
        assert_eq!(b.le_signed(&a), Value::from_bool(true));
        assert_eq!(a.gt(&v("x000")), Value::x(1));
    }

    #[test]
    fn logical_eq_is_x_only_when_ambiguous() {
        assert_eq!(v("10").logical_eq(&v("1x")), Value::x(1));
        assert_eq!(v("10").logical_eq(&v("0x")), Value::from_bool(false));
        assert_eq!(v("10").logical_eq(&v("10")), Value::from_bool(true));
        assert_eq!(v("10").logical_ne(&v("11")), Value::from_bool(true));
        assert!(v("1x").case_eq(&v("1x")));
        assert!(!v("1x").case_eq(&v("1z")));
    }

    #[test]
    fn equality_includes_width() {
        assert_ne!(Value::from_u128(3, 2), Value::from_u128(3, 4));
        assert!(Value::from_u128(3, 2).equals_extended(&Value::from_u128(3, 4)));
        assert!(!Value::from_u128(3, 2).equals_extended(&Value::from_u128(7, 4)));
    }

    #[test]
    fn concat_is_msb_first() {
        let r = v("10").concat(&v("0x1")).unwrap();
        assert_eq!(r.to_string(), "100x1");
        let r = Value::concat_all(&[v("1"), v("00"), v("z")]).unwrap();
        assert_eq!(r.to_string(), "100z");
        assert!(Value::concat_all(&[]).is_err());
        assert!(Value::zero(100).concat(&Value::zero(29)).is_err());
    }

    #[test]
    fn repeat() {
        assert_eq!(v("10").repeat(3).unwrap().to_string(), "101010");
        assert!(v("10").repeat(0).is_err());
        assert!(v("10").repeat(65).is_err());
    }

    #[test]
    fn slicing() {
        let a = v("1x0z1");
        assert_eq!(a.get(0).unwrap(), Logic::One);
        assert_eq!(a.get(1).unwrap(), Logic::Z);
        assert_eq!(a.get(3).unwrap(), Logic::X);
        assert_eq!(a.bits(3, 1).unwrap().to_string(), "x0z");
        assert_eq!(a.bit(4).unwrap(), Value::from_bool(true));
    }

    #[test]
    fn slicing_out_of_range() {
        let a = Value::zero(4);
        assert!(matches!(
            a.get(4),
            Err(Error::IndexOutOfRange { index: 4, width: 4 })
        ));
        assert!(matches!(
            a.bits(4, 0),
            Err(Error::IndexOutOfRange { index: 4, width: 4 })
        ));
        assert!(matches!(
            a.bits(1, 2),
            Err(Error::InvalidRange { high: 1, low: 2 })
        ));
    }

    #[test]
    fn extension() {
        assert_eq!(v("10").zero_extend(4).unwrap().to_string(), "0010");
        assert_eq!(v("10").sign_extend(4).unwrap().to_string(), "1110");
        assert_eq!(v("x0").sign_extend(4).unwrap().to_string(), "xxx0");
        assert!(matches!(
            v("1010").zero_extend(2),
            Err(Error::WidthMismatch {
                expected: 2,
                actual: 4,
                ..
            })
        ));
        assert_eq!(v("1011").resize(2).unwrap().to_string(), "11");
        assert_eq!(v("11").resize(3).unwrap().to_string(), "011");
    }

    #[test]
    fn shifts() {
        let a = v("1001");
        assert_eq!(a.shl(&Value::from_u128(1, 2)).to_string(), "0010");
        assert_eq!(a.shr(&Value::from_u128(1, 2)).to_string(), "0100");
        assert_eq!(a.shr_arithmetic(&Value::from_u128(2, 2)).to_string(), "1110");
        assert_eq!(a.shr_arithmetic(&Value::from_u128(9, 8)).to_string(), "1111");
        assert_eq!(a.shl(&Value::from_u128(4, 3)), Value::zero(4));
        assert_eq!(a.shl(&v("x")), Value::x(4));
    }

    #[test]
    fn mux_merges_on_unknown_condition() {
        let t = v("1100");
        let f = v("1010");
        assert_eq!(Value::mux(&v("1"), &t, &f), t);
        assert_eq!(Value::mux(&v("0"), &t, &f), f);
        assert_eq!(Value::mux(&v("x"), &t, &f).to_string(), "1xx0");
    }

    #[test]
    fn from_constant_checks_fit() {
        assert!(matches!(
            Value::from_constant(128u32, 7),
            Err(Error::ValueOverflow {
                value: 128,
                width: 7,
                required: 8
            })
        ));
        assert!(matches!(
            Value::from_constant(0u32, 0),
            Err(Error::InvalidBitWidth { width: 0, .. })
        ));
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(v("10_xz").to_string(), "10xz");
        assert_eq!(format!("{:?}", v("10xz")), "4'b10xz");
        assert!(Value::from_binary_str("").is_none());
        assert!(Value::from_binary_str("102").is_none());
        assert_eq!(Value::z(3).to_string(), "zzz");
    }

    #[test]
    #[should_panic(
        expected = "Cannot create a value with 129 bit(s). Values must be between 1 and 128 bit(s) wide."
    )]
    fn value_too_wide_error() {
        let _ = Value::zero(129);
    }
}
