//! Source literals.

use num_bigint::{BigInt, BigUint};

use crate::types::{IntTy, Type, ADDRESS_WIDTH};

/// A literal as written in source (or supplied as an init/message argument
/// by the front end).
///
/// `Address` literals exist only in the AST: the evaluator normalizes them to
/// `ByStr20` byte strings.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Literal {
    Int { ty: IntTy, value: BigInt },
    Str(String),
    BNum(BigUint),
    ByStrX(Vec<u8>),
    ByStr(Vec<u8>),
    Address(Vec<u8>),
    /// `Emp kt vt`: the empty map with declared key and value types.
    EmptyMap { key: Type, value: Type },
}

impl Literal {
    pub fn int(ty: IntTy, value: impl Into<BigInt>) -> Self {
        Literal::Int {
            ty,
            value: value.into(),
        }
    }

    pub fn uint32(value: u32) -> Self {
        Literal::int(IntTy::UINT32, value)
    }

    pub fn uint128(value: u128) -> Self {
        Literal::int(IntTy::UINT128, value)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Literal::Str(s.into())
    }

    pub fn bnum(n: u64) -> Self {
        Literal::BNum(BigUint::from(n))
    }

    /// A 20-byte address literal with every byte set to `fill`.
    pub fn address_filled(fill: u8) -> Self {
        Literal::Address(vec![fill; ADDRESS_WIDTH as usize])
    }

    pub fn empty_map(key: Type, value: Type) -> Self {
        Literal::EmptyMap { key, value }
    }
}
