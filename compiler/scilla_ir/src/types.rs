//! Declared types.
//!
//! The evaluator never infers types, but it needs declared types in a few
//! places: parameter validation, empty map literals, constructor type
//! arguments, the inferred types of message entries and type-directed builtin
//! dispatch.

use std::fmt;

use num_bigint::BigInt;
use num_traits::One;

use crate::Name;

/// Byte width of a contract address.
pub const ADDRESS_WIDTH: u32 = 20;

/// Bit width of a fixed-size integer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum IntWidth {
    W32,
    W64,
    W128,
    W256,
}

impl IntWidth {
    /// Number of bits.
    pub const fn bits(self) -> u32 {
        match self {
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
            IntWidth::W256 => 256,
        }
    }

    /// Number of bytes.
    pub const fn bytes(self) -> u64 {
        (self.bits() / 8) as u64
    }
}

/// A fixed-width integer type: `Int32`..`Int256`, `Uint32`..`Uint256`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IntTy {
    pub signed: bool,
    pub width: IntWidth,
}

impl IntTy {
    pub const INT32: IntTy = IntTy::int(IntWidth::W32);
    pub const INT64: IntTy = IntTy::int(IntWidth::W64);
    pub const INT128: IntTy = IntTy::int(IntWidth::W128);
    pub const INT256: IntTy = IntTy::int(IntWidth::W256);
    pub const UINT32: IntTy = IntTy::uint(IntWidth::W32);
    pub const UINT64: IntTy = IntTy::uint(IntWidth::W64);
    pub const UINT128: IntTy = IntTy::uint(IntWidth::W128);
    pub const UINT256: IntTy = IntTy::uint(IntWidth::W256);

    /// Signed integer of the given width.
    pub const fn int(width: IntWidth) -> Self {
        IntTy {
            signed: true,
            width,
        }
    }

    /// Unsigned integer of the given width.
    pub const fn uint(width: IntWidth) -> Self {
        IntTy {
            signed: false,
            width,
        }
    }

    /// Smallest representable value.
    pub fn min_value(self) -> BigInt {
        if self.signed {
            -(BigInt::one() << (self.width.bits() - 1))
        } else {
            BigInt::default()
        }
    }

    /// Largest representable value.
    pub fn max_value(self) -> BigInt {
        let bits = if self.signed {
            self.width.bits() - 1
        } else {
            self.width.bits()
        };
        (BigInt::one() << bits) - 1
    }

    /// Whether `value` fits in this type.
    pub fn contains(self, value: &BigInt) -> bool {
        *value >= self.min_value() && *value <= self.max_value()
    }

    /// Source-level type name, e.g. `Uint128`.
    pub fn name(self) -> &'static str {
        match (self.signed, self.width) {
            (true, IntWidth::W32) => "Int32",
            (true, IntWidth::W64) => "Int64",
            (true, IntWidth::W128) => "Int128",
            (true, IntWidth::W256) => "Int256",
            (false, IntWidth::W32) => "Uint32",
            (false, IntWidth::W64) => "Uint64",
            (false, IntWidth::W128) => "Uint128",
            (false, IntWidth::W256) => "Uint256",
        }
    }

    /// Parse a source-level type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Int32" => IntTy::INT32,
            "Int64" => IntTy::INT64,
            "Int128" => IntTy::INT128,
            "Int256" => IntTy::INT256,
            "Uint32" => IntTy::UINT32,
            "Uint64" => IntTy::UINT64,
            "Uint128" => IntTy::UINT128,
            "Uint256" => IntTy::UINT256,
            _ => return None,
        })
    }
}

/// Primitive types.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum PrimType {
    Int(IntTy),
    String,
    BNum,
    /// Variable-length byte string.
    ByStr,
    /// Fixed-width byte string (`ByStr20`, `ByStr32`, ...).
    ByStrX(u32),
    Msg,
    Event,
    Exception,
}

/// Flavor of an address type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AddressKind {
    /// `ByStr20 with end`: any address in use.
    Any,
    /// `ByStr20 with library end`.
    Library,
    /// `ByStr20 with contract field ... end`.
    Contract,
}

/// An address type: a `ByStr20` with a contract-shape contract attached.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AddressType {
    pub kind: AddressKind,
    /// Fields the remote contract must declare (only for `Contract`).
    pub fields: Vec<(Name, Type)>,
}

/// A declared type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Type {
    Prim(PrimType),
    Map(Box<Type>, Box<Type>),
    Fun(Box<Type>, Box<Type>),
    Adt(Name, Vec<Type>),
    TypeVar(Name),
    PolyFun(Name, Box<Type>),
    Unit,
    Address(AddressType),
}

impl Type {
    pub fn int(ty: IntTy) -> Type {
        Type::Prim(PrimType::Int(ty))
    }

    pub fn uint32() -> Type {
        Type::int(IntTy::UINT32)
    }

    pub fn uint64() -> Type {
        Type::int(IntTy::UINT64)
    }

    pub fn uint128() -> Type {
        Type::int(IntTy::UINT128)
    }

    pub fn string() -> Type {
        Type::Prim(PrimType::String)
    }

    pub fn bnum() -> Type {
        Type::Prim(PrimType::BNum)
    }

    pub fn bystrx(width: u32) -> Type {
        Type::Prim(PrimType::ByStrX(width))
    }

    /// `ByStr20`, the runtime representation of every address type.
    pub fn bystr20() -> Type {
        Type::bystrx(ADDRESS_WIDTH)
    }

    pub fn msg() -> Type {
        Type::Prim(PrimType::Msg)
    }

    pub fn bool() -> Type {
        Type::Adt(Name::new("Bool"), Vec::new())
    }

    pub fn option(inner: Type) -> Type {
        Type::Adt(Name::new("Option"), vec![inner])
    }

    pub fn list(inner: Type) -> Type {
        Type::Adt(Name::new("List"), vec![inner])
    }

    pub fn pair(a: Type, b: Type) -> Type {
        Type::Adt(Name::new("Pair"), vec![a, b])
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    /// Address type accepting any address in use.
    pub fn address() -> Type {
        Type::Address(AddressType {
            kind: AddressKind::Any,
            fields: Vec::new(),
        })
    }

    /// Contract address type with the given required fields.
    pub fn contract_address(fields: Vec<(Name, Type)>) -> Type {
        Type::Address(AddressType {
            kind: AddressKind::Contract,
            fields,
        })
    }

    /// Strip address contracts: every address type becomes `ByStr20`.
    ///
    /// Runtime values never carry address types, so comparisons between a
    /// declared type and a value's inferred type go through this.
    #[must_use]
    pub fn erase_addresses(&self) -> Type {
        match self {
            Type::Address(_) => Type::bystr20(),
            Type::Map(k, v) => Type::map(k.erase_addresses(), v.erase_addresses()),
            Type::Fun(a, r) => Type::Fun(Box::new(a.erase_addresses()), Box::new(r.erase_addresses())),
            Type::Adt(name, args) => {
                Type::Adt(name.clone(), args.iter().map(Type::erase_addresses).collect())
            }
            Type::PolyFun(tv, body) => Type::PolyFun(tv.clone(), Box::new(body.erase_addresses())),
            Type::Prim(_) | Type::TypeVar(_) | Type::Unit => self.clone(),
        }
    }

    /// Replace free type variables using `lookup`.
    ///
    /// Variables for which `lookup` returns `None` are left in place, and
    /// variables bound by an inner `forall` are never replaced.
    #[must_use]
    pub fn resolve(&self, lookup: &dyn Fn(&Name) -> Option<Type>) -> Type {
        match self {
            Type::TypeVar(tv) => lookup(tv).unwrap_or_else(|| self.clone()),
            Type::Map(k, v) => Type::map(k.resolve(lookup), v.resolve(lookup)),
            Type::Fun(a, r) => Type::Fun(Box::new(a.resolve(lookup)), Box::new(r.resolve(lookup))),
            Type::Adt(name, args) => {
                Type::Adt(name.clone(), args.iter().map(|t| t.resolve(lookup)).collect())
            }
            Type::PolyFun(bound, body) => {
                let inner = |tv: &Name| if tv == bound { None } else { lookup(tv) };
                Type::PolyFun(bound.clone(), Box::new(body.resolve(&inner)))
            }
            Type::Address(addr) => Type::Address(AddressType {
                kind: addr.kind,
                fields: addr
                    .fields
                    .iter()
                    .map(|(n, t)| (n.clone(), t.resolve(lookup)))
                    .collect(),
            }),
            Type::Prim(_) | Type::Unit => self.clone(),
        }
    }

    /// Whether the type mentions a type variable that is not bound by an
    /// enclosing `forall`.
    pub fn has_free_type_vars(&self) -> bool {
        fn go(ty: &Type, bound: &mut Vec<Name>) -> bool {
            match ty {
                Type::TypeVar(tv) => !bound.contains(tv),
                Type::Map(k, v) => go(k, bound) || go(v, bound),
                Type::Fun(a, r) => go(a, bound) || go(r, bound),
                Type::Adt(_, args) => args.iter().any(|t| go(t, bound)),
                Type::PolyFun(tv, body) => {
                    bound.push(tv.clone());
                    let free = go(body, bound);
                    bound.pop();
                    free
                }
                Type::Address(addr) => addr.fields.iter().any(|(_, t)| go(t, bound)),
                Type::Prim(_) | Type::Unit => false,
            }
        }
        go(self, &mut Vec::new())
    }

    /// Whether the type is an address type.
    pub fn is_address(&self) -> bool {
        matches!(self, Type::Address(_))
    }
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimType::Int(ty) => f.write_str(ty.name()),
            PrimType::String => f.write_str("String"),
            PrimType::BNum => f.write_str("BNum"),
            PrimType::ByStr => f.write_str("ByStr"),
            PrimType::ByStrX(w) => write!(f, "ByStr{w}"),
            PrimType::Msg => f.write_str("Message"),
            PrimType::Event => f.write_str("Event"),
            PrimType::Exception => f.write_str("Exception"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(p) => write!(f, "{p}"),
            Type::Map(k, v) => write!(f, "Map ({k}) ({v})"),
            Type::Fun(a, r) => write!(f, "({a}) -> ({r})"),
            Type::Adt(name, args) => {
                write!(f, "{name}")?;
                for arg in args {
                    write!(f, " ({arg})")?;
                }
                Ok(())
            }
            Type::TypeVar(tv) => write!(f, "{tv}"),
            Type::PolyFun(tv, body) => write!(f, "forall {tv}. {body}"),
            Type::Unit => f.write_str("Unit"),
            Type::Address(addr) => match addr.kind {
                AddressKind::Any => f.write_str("ByStr20 with end"),
                AddressKind::Library => f.write_str("ByStr20 with library end"),
                AddressKind::Contract => {
                    f.write_str("ByStr20 with contract ")?;
                    for (i, (name, ty)) in addr.fields.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "field {name} : {ty}")?;
                    }
                    f.write_str(" end")
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_bounds() {
        assert_eq!(IntTy::UINT32.max_value(), BigInt::from(u32::MAX));
        assert_eq!(IntTy::INT64.min_value(), BigInt::from(i64::MIN));
        assert_eq!(IntTy::UINT128.max_value(), BigInt::from(u128::MAX));
        assert!(!IntTy::UINT32.contains(&BigInt::from(-1)));
        assert!(IntTy::INT32.contains(&BigInt::from(-1)));
        assert!(IntTy::UINT256.contains(&(BigInt::one() << 255)));
    }

    #[test]
    fn int_names_round_trip_through_from_name() {
        for ty in [IntTy::INT32, IntTy::UINT64, IntTy::INT128, IntTy::UINT256] {
            assert_eq!(IntTy::from_name(ty.name()), Some(ty));
        }
        assert_eq!(IntTy::from_name("Uint8"), None);
    }

    #[test]
    fn resolve_replaces_free_vars_only() {
        let a = Name::new("'A");
        let ty = Type::Adt(
            Name::new("Pair"),
            vec![
                Type::TypeVar(a.clone()),
                Type::PolyFun(a.clone(), Box::new(Type::TypeVar(a.clone()))),
            ],
        );
        let resolved = ty.resolve(&|tv: &Name| (tv == &a).then(Type::uint32));
        assert_eq!(
            resolved,
            Type::Adt(
                Name::new("Pair"),
                vec![
                    Type::uint32(),
                    Type::PolyFun(a.clone(), Box::new(Type::TypeVar(a))),
                ],
            )
        );
        assert!(!resolved.has_free_type_vars());
    }

    #[test]
    fn erase_addresses_nested() {
        let ty = Type::map(Type::address(), Type::option(Type::contract_address(vec![])));
        assert_eq!(
            ty.erase_addresses(),
            Type::map(Type::bystr20(), Type::option(Type::bystr20()))
        );
    }

    #[test]
    fn display_is_source_like() {
        let ty = Type::map(Type::bystr20(), Type::option(Type::uint128()));
        assert_eq!(ty.to_string(), "Map (ByStr20) (Option (Uint128))");
    }
}
