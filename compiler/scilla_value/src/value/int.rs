//! Fixed-width integer values.
//!
//! `IntValue` pairs an arbitrary-precision magnitude with its declared width.
//! It does not implement the arithmetic operator traits: every operation goes
//! through a checked method that returns `None` when the result does not fit
//! the width, so an overflow can never be silently wrapped.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use scilla_ir::IntTy;

/// An integer of a fixed Scilla width.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IntValue {
    ty: IntTy,
    value: BigInt,
}

impl IntValue {
    /// Create a value, or `None` if it does not fit `ty`.
    pub fn new(ty: IntTy, value: BigInt) -> Option<Self> {
        ty.contains(&value).then_some(IntValue { ty, value })
    }

    #[inline]
    pub fn ty(&self) -> IntTy {
        self.ty
    }

    #[inline]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Magnitude as `u64`, if non-negative and small enough.
    pub fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    pub fn to_u128(&self) -> Option<u128> {
        self.value.to_u128()
    }

    /// Re-check the same magnitude at another width.
    pub fn convert(&self, ty: IntTy) -> Option<Self> {
        IntValue::new(ty, self.value.clone())
    }

    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        IntValue::new(self.ty, &self.value + &rhs.value)
    }

    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        IntValue::new(self.ty, &self.value - &rhs.value)
    }

    pub fn checked_mul(&self, rhs: &Self) -> Option<Self> {
        IntValue::new(self.ty, &self.value * &rhs.value)
    }

    /// Truncating division; `None` on division by zero or overflow
    /// (`Int32::MIN / -1`).
    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        IntValue::new(self.ty, &self.value / &rhs.value)
    }

    /// Remainder with the sign of the dividend; `None` on division by zero.
    pub fn checked_rem(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        IntValue::new(self.ty, &self.value % &rhs.value)
    }

    pub fn checked_pow(&self, exp: u32) -> Option<Self> {
        // Anything with magnitude > 1 overflows 256 bits well before this.
        if exp > 256 && self.value.magnitude() > &num_bigint::BigUint::from(1u8) {
            return None;
        }
        IntValue::new(self.ty, num_traits::pow::pow(self.value.clone(), exp as usize))
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

macro_rules! lossless_ctor {
    ($($name:ident($prim:ty) => $ty:expr;)*) => {
        impl IntValue {
            $(
                #[inline]
                pub fn $name(value: $prim) -> Self {
                    IntValue {
                        ty: $ty,
                        value: BigInt::from(value),
                    }
                }
            )*
        }
    };
}

lossless_ctor! {
    int32(i32) => IntTy::INT32;
    int64(i64) => IntTy::INT64;
    uint32(u32) => IntTy::UINT32;
    uint64(u64) => IntTy::UINT64;
    uint128(u128) => IntTy::UINT128;
}
