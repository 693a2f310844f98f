//! Integer range arithmetic
//!
//! Every integer-valued expression carries a [`RangeType`]: a closed interval
//! over `i64` that contains every value the expression can produce at runtime.
//! The operators below compute sound (possibly loose) result intervals. Scalar
//! endpoint math saturates instead of wrapping, so an overflowing bound clamps
//! to `i64::MIN`/`i64::MAX` and the interval stays a superset.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::ErrorKind;

/// Saturating scalar primitives used on interval endpoints
pub mod saturating {
    pub fn neg(a: i64) -> i64 {
        a.saturating_neg()
    }

    pub fn add(a: i64, b: i64) -> i64 {
        a.saturating_add(b)
    }

    pub fn sub(a: i64, b: i64) -> i64 {
        a.saturating_sub(b)
    }

    pub fn mul(a: i64, b: i64) -> i64 {
        a.saturating_mul(b)
    }

    /// `b` must not be zero
    pub fn div(a: i64, b: i64) -> i64 {
        a.saturating_div(b)
    }

    pub fn shift_left(a: i64, b: i64) -> i64 {
        if a == 0 || b == 0 {
            return a;
        }
        if !(0..=63).contains(&b) {
            return if a < 0 { i64::MIN } else { i64::MAX };
        }
        let b = b as u32;
        if a > i64::MAX >> b {
            i64::MAX
        } else if a < i64::MIN >> b {
            i64::MIN
        } else {
            a << b
        }
    }

    pub fn shift_right(a: i64, b: i64) -> i64 {
        let b = if (0..63).contains(&b) { b as u32 } else { 63 };
        a >> b
    }
}

/// Integer operators with interval semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

impl IntOp {
    /// Exact scalar evaluation; `None` on overflow, zero divisor or an
    /// out-of-domain shift
    pub fn eval(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Self::Add => a.checked_add(b),
            Self::Sub => a.checked_sub(b),
            Self::Mul => a.checked_mul(b),
            Self::Div => a.checked_div(b),
            Self::Mod => a.checked_rem(b),
            Self::And => Some(a & b),
            Self::Or => Some(a | b),
            Self::Xor => Some(a ^ b),
            Self::ShiftLeft => {
                if !(0..64).contains(&b) {
                    return None;
                }
                let shifted = a << b;
                (shifted >> b == a).then_some(shifted)
            }
            Self::ShiftRight => (0..64).contains(&b).then(|| a >> b),
        }
    }
}

/// Narrowest integer storage able to hold every value of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntStorage {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
}

/// Closed interval `[min, max]`, always `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeType {
    pub min: i64,
    pub max: i64,
}

impl RangeType {
    pub const FULL: Self = Self { min: i64::MIN, max: i64::MAX };

    pub fn new(min: i64, max: i64) -> Self {
        debug_assert!(min <= max, "empty range {min}..{max}");
        Self { min, max }
    }

    pub fn point(value: i64) -> Self {
        Self { min: value, max: value }
    }

    /// Smallest range covering all the given values
    pub fn hull(values: &[i64]) -> Self {
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        Self::new(min, max)
    }

    /// The single value of a collapsed range
    pub fn as_point(&self) -> Option<i64> {
        (self.min == self.max).then_some(self.min)
    }

    pub fn contains(&self, other: &RangeType) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn contains_value(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn fits_i32(&self) -> bool {
        self.min >= i32::MIN as i64 && self.max <= i32::MAX as i64
    }

    pub fn union(self, other: RangeType) -> RangeType {
        RangeType::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Split at the -1/0 boundary into (negative, non-negative) parts
    pub fn split_by_sign(&self) -> (Option<RangeType>, Option<RangeType>) {
        let negative = (self.min < 0).then(|| RangeType::new(self.min, self.max.min(-1)));
        let positive = (self.max >= 0).then(|| RangeType::new(self.min.max(0), self.max));
        (negative, positive)
    }

    pub fn storage(&self) -> IntStorage {
        if self.min >= 0 {
            match self.max {
                m if m <= u8::MAX as i64 => IntStorage::U8,
                m if m <= u16::MAX as i64 => IntStorage::U16,
                m if m <= i32::MAX as i64 => IntStorage::I32,
                m if m <= u32::MAX as i64 => IntStorage::U32,
                _ => IntStorage::I64,
            }
        } else if self.min >= i8::MIN as i64 && self.max <= i8::MAX as i64 {
            IntStorage::I8
        } else if self.min >= i16::MIN as i64 && self.max <= i16::MAX as i64 {
            IntStorage::I16
        } else if self.fits_i32() {
            IntStorage::I32
        } else {
            IntStorage::I64
        }
    }

    // ==================== Unary ====================

    pub fn neg(self) -> RangeType {
        RangeType::new(saturating::neg(self.max), saturating::neg(self.min))
    }

    pub fn complement(self) -> RangeType {
        RangeType::new(!self.max, !self.min)
    }

    pub fn offset(self, delta: i64) -> RangeType {
        RangeType::new(saturating::add(self.min, delta), saturating::add(self.max, delta))
    }

    // ==================== Binary ====================

    /// Apply `op`; collapsed operands evaluate exactly when the scalar
    /// result is representable
    pub fn apply(op: IntOp, left: RangeType, right: RangeType) -> Result<RangeType, ErrorKind> {
        if let (Some(a), Some(b)) = (left.as_point(), right.as_point()) {
            if let Some(value) = op.eval(a, b) {
                return Ok(RangeType::point(value));
            }
        }
        Ok(match op {
            IntOp::Add => left.add(right),
            IntOp::Sub => left.sub(right),
            IntOp::Mul => left.mul(right),
            IntOp::Div => left.div(right)?,
            IntOp::Mod => left.rem(right)?,
            IntOp::And => bitwise(left, right, unsigned_and),
            IntOp::Or => bitwise(left, right, unsigned_or),
            IntOp::Xor => bitwise(left, right, unsigned_xor),
            IntOp::ShiftLeft => left.shift_left(right),
            IntOp::ShiftRight => left.shift_right(right),
        })
    }

    pub fn add(self, right: RangeType) -> RangeType {
        RangeType::new(
            saturating::add(self.min, right.min),
            saturating::add(self.max, right.max),
        )
    }

    pub fn sub(self, right: RangeType) -> RangeType {
        RangeType::new(
            saturating::sub(self.min, right.max),
            saturating::sub(self.max, right.min),
        )
    }

    pub fn mul(self, right: RangeType) -> RangeType {
        RangeType::hull(&[
            saturating::mul(self.min, right.min),
            saturating::mul(self.min, right.max),
            saturating::mul(self.max, right.min),
            saturating::mul(self.max, right.max),
        ])
    }

    /// Zero is never a divisor: each sign side of the divisor contributes its
    /// endpoints, with a zero endpoint replaced by +1 or -1
    pub fn div(self, right: RangeType) -> Result<RangeType, ErrorKind> {
        let (negative, positive) = right.split_by_sign();
        let positive = positive.filter(|r| r.max > 0).map(|r| RangeType::new(r.min.max(1), r.max));
        let mut corners = Vec::with_capacity(8);
        for den in [negative, positive].into_iter().flatten() {
            for num in [self.min, self.max] {
                corners.push(saturating::div(num, den.min));
                corners.push(saturating::div(num, den.max));
            }
        }
        if corners.is_empty() {
            return Err(ErrorKind::DivisionByZero);
        }
        Ok(RangeType::hull(&corners))
    }

    pub fn rem(self, right: RangeType) -> Result<RangeType, ErrorKind> {
        // max(|divisor|) - 1
        let den = !right.min.min(saturating::neg(right.max));
        if den < 0 {
            return Err(ErrorKind::ModuloByZero);
        }
        let min = if self.min >= 0 { 0 } else { self.min.max(-den) };
        let max = if self.max < 0 { 0 } else { self.max.min(den) };
        Ok(RangeType::new(min, max))
    }

    pub fn shift_left(self, right: RangeType) -> RangeType {
        if right.min < 0 || right.max > 63 {
            return RangeType::FULL;
        }
        RangeType::new(
            saturating::shift_left(self.min, if self.min < 0 { right.max } else { right.min }),
            saturating::shift_left(self.max, if self.max < 0 { right.min } else { right.max }),
        )
    }

    pub fn shift_right(self, right: RangeType) -> RangeType {
        let right = if right.min < 0 || right.max > 63 { RangeType::new(0, 63) } else { right };
        RangeType::new(
            saturating::shift_right(self.min, if self.min < 0 { right.min } else { right.max }),
            saturating::shift_right(self.max, if self.max < 0 { right.max } else { right.min }),
        )
    }
}

impl fmt::Display for RangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

// ==================== Bitwise ====================

/// A sign-homogeneous interval viewed as unsigned 64-bit
type Unsigned = (u64, u64);

/// All bits at and below the highest set bit
fn smear(mut v: u64) -> u64 {
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    v
}

fn variable_bits((min, max): Unsigned) -> u64 {
    smear(min ^ max)
}

fn unsigned_and(left: Unsigned, right: Unsigned) -> Unsigned {
    let lv = variable_bits(left);
    let rv = variable_bits(right);
    // Digitwise minimum: variable bits can all be zero
    let min = (left.0 & !lv) & (right.0 & !rv);
    // ...or all be one, but never more than either input
    let max = ((left.1 | lv) & (right.1 | rv)).min(left.1).min(right.1);
    (min, max)
}

fn unsigned_or(left: Unsigned, right: Unsigned) -> Unsigned {
    let lv = variable_bits(left);
    let rv = variable_bits(right);
    let min = ((left.0 & !lv) | (right.0 & !rv)).max(left.0).max(right.0);
    let max = left.1 | right.1 | smear(left.1 & right.1);
    (min, max)
}

fn unsigned_xor(left: Unsigned, right: Unsigned) -> Unsigned {
    let variable = variable_bits(left) | variable_bits(right);
    let min = (left.0 ^ right.0) & !variable;
    let max = (left.1 ^ right.1) | variable;
    (min, max)
}

/// Bit patterns ignore arithmetic order, so each operand is split by sign and
/// every pairing is bounded in the unsigned domain. Within one pairing the
/// sign of the result is fixed, so the unsigned bounds map back to an ordered
/// signed interval.
fn bitwise(left: RangeType, right: RangeType, op: fn(Unsigned, Unsigned) -> Unsigned) -> RangeType {
    let (ln, lp) = left.split_by_sign();
    let (rn, rp) = right.split_by_sign();
    let mut result: Option<RangeType> = None;
    for l in [ln, lp].into_iter().flatten() {
        for r in [rn, rp].into_iter().flatten() {
            let (min, max) = op((l.min as u64, l.max as u64), (r.min as u64, r.max as u64));
            let part = RangeType::new(min as i64, max as i64);
            result = Some(match result {
                Some(acc) => acc.union(part),
                None => part,
            });
        }
    }
    result.unwrap_or(RangeType::FULL)
}
