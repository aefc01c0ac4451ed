//! Builtin operations.
//!
//! Builtins are overloaded on their argument types: `concat` joins strings or
//! byte strings, `eq` compares any primitive, `add` works at every integer
//! width. A [`BuiltinRegistry`] resolves a name plus the runtime types of the
//! arguments to a result type and a plain function; the standard registry
//! caches resolutions per `(name, argument types)` signature.

mod ops;

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use scilla_ir::{IntTy, Name, PrimType, Type};
use scilla_value::errors::builtin_failure;
use scilla_value::{EvalResult, Value};
use smallvec::SmallVec;

/// A resolved builtin: `(type arguments, argument values, result type)`.
pub type BuiltinOp = fn(&[Type], &[Value], &Type) -> EvalResult<Value>;

/// Looks up builtin operations by name and argument types.
pub trait BuiltinRegistry {
    fn find_op(
        &self,
        name: &str,
        targs: &[Type],
        arg_types: &[Type],
    ) -> EvalResult<(Type, BuiltinOp)>;
}

/// Matches one builtin name against a signature.
type Resolver = fn(&[Type], &[Type]) -> Option<(Type, BuiltinOp)>;

type Signature = (Name, SmallVec<[Type; 3]>);

/// The standard builtin set.
pub struct StdBuiltins {
    table: FxHashMap<&'static str, Resolver>,
    resolved: RefCell<FxHashMap<Signature, (Type, BuiltinOp)>>,
}

impl Default for StdBuiltins {
    fn default() -> Self {
        Self::new()
    }
}

fn is_int(ty: &Type) -> Option<IntTy> {
    match ty {
        Type::Prim(PrimType::Int(i)) => Some(*i),
        _ => None,
    }
}

/// Primitive types `eq` is defined on.
fn is_comparable(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Prim(
            PrimType::Int(_)
                | PrimType::String
                | PrimType::BNum
                | PrimType::ByStrX(_)
                | PrimType::ByStr
        )
    )
}

fn is_prim(ty: &Type, p: &PrimType) -> bool {
    matches!(ty, Type::Prim(q) if q == p)
}

/// Both integer arguments of the same width.
fn same_int(arg_types: &[Type]) -> Option<IntTy> {
    match arg_types {
        [a, b] => {
            let a = is_int(a)?;
            (is_int(b)? == a).then_some(a)
        }
        _ => None,
    }
}

fn int_binop(arg_types: &[Type], op: BuiltinOp) -> Option<(Type, BuiltinOp)> {
    same_int(arg_types).map(|ty| (Type::int(ty), op))
}

/// Map and key (and value) types line up, modulo address contracts.
fn map_access(arg_types: &[Type], with_value: bool) -> Option<(Type, Type)> {
    let (Type::Map(k, v), rest) = arg_types.split_first()? else {
        return None;
    };
    let (k, v) = (k.as_ref().clone(), v.as_ref().clone());
    let key_ok = rest.first()?.erase_addresses() == k.erase_addresses();
    let val_ok = !with_value || rest.get(1)?.erase_addresses() == v.erase_addresses();
    let arity_ok = rest.len() == if with_value { 2 } else { 1 };
    (key_ok && val_ok && arity_ok).then_some((k, v))
}

impl StdBuiltins {
    pub fn new() -> Self {
        let mut table: FxHashMap<&'static str, Resolver> = FxHashMap::default();
        table.insert("eq", |_, a| match a {
            [x, y] if x == y && is_comparable(x) => Some((Type::bool(), ops::eq as BuiltinOp)),
            _ => None,
        });
        table.insert("add", |_, a| int_binop(a, ops::add as BuiltinOp));
        table.insert("sub", |_, a| int_binop(a, ops::sub as BuiltinOp));
        table.insert("mul", |_, a| int_binop(a, ops::mul as BuiltinOp));
        table.insert("div", |_, a| int_binop(a, ops::div as BuiltinOp));
        table.insert("rem", |_, a| int_binop(a, ops::rem as BuiltinOp));
        table.insert("lt", |_, a| same_int(a).map(|_| (Type::bool(), ops::lt as BuiltinOp)));
        table.insert("pow", |_, a| match a {
            [base, exp] if is_int(exp) == Some(IntTy::UINT32) => {
                is_int(base).map(|ty| (Type::int(ty), ops::pow as BuiltinOp))
            }
            _ => None,
        });
        table.insert("concat", |_, a| match a {
            [x, y] if is_prim(x, &PrimType::String) && is_prim(y, &PrimType::String) => {
                Some((Type::string(), ops::concat as BuiltinOp))
            }
            [x, y] if is_prim(x, &PrimType::ByStr) && is_prim(y, &PrimType::ByStr) => {
                Some((Type::Prim(PrimType::ByStr), ops::concat as BuiltinOp))
            }
            [Type::Prim(PrimType::ByStrX(m)), Type::Prim(PrimType::ByStrX(n))] => {
                Some((Type::bystrx(m.checked_add(*n)?), ops::concat as BuiltinOp))
            }
            _ => None,
        });
        table.insert("strlen", |_, a| match a {
            [x] if is_prim(x, &PrimType::String) || is_prim(x, &PrimType::ByStr) => {
                Some((Type::uint32(), ops::strlen as BuiltinOp))
            }
            _ => None,
        });
        table.insert("substr", |_, a| match a {
            [s, i, n]
                if is_prim(s, &PrimType::String)
                    && is_int(i) == Some(IntTy::UINT32)
                    && is_int(n) == Some(IntTy::UINT32) =>
            {
                Some((Type::string(), ops::substr as BuiltinOp))
            }
            _ => None,
        });
        table.insert("to_string", |_, a| match a {
            [Type::Prim(PrimType::Int(_) | PrimType::ByStrX(_) | PrimType::ByStr)] => {
                Some((Type::string(), ops::to_string as BuiltinOp))
            }
            _ => None,
        });
        table.insert("blt", |_, a| match a {
            [x, y] if is_prim(x, &PrimType::BNum) && is_prim(y, &PrimType::BNum) => {
                Some((Type::bool(), ops::blt as BuiltinOp))
            }
            _ => None,
        });
        table.insert("badd", |_, a| match a {
            [x, y] if is_prim(x, &PrimType::BNum) && is_int(y).is_some_and(|i| !i.signed) => {
                Some((Type::bnum(), ops::badd as BuiltinOp))
            }
            _ => None,
        });
        table.insert("bsub", |_, a| match a {
            [x, y] if is_prim(x, &PrimType::BNum) && is_prim(y, &PrimType::BNum) => {
                Some((Type::int(IntTy::INT256), ops::bsub as BuiltinOp))
            }
            _ => None,
        });
        table.insert("put", |_, a| {
            map_access(a, true).map(|(k, v)| (Type::map(k, v), ops::put as BuiltinOp))
        });
        table.insert("get", |_, a| {
            map_access(a, false).map(|(_, v)| (Type::option(v), ops::get as BuiltinOp))
        });
        table.insert("remove", |_, a| {
            map_access(a, false).map(|(k, v)| (Type::map(k, v), ops::remove as BuiltinOp))
        });
        table.insert("contains", |_, a| {
            map_access(a, false).map(|_| (Type::bool(), ops::contains as BuiltinOp))
        });
        table.insert("size", |_, a| match a {
            [Type::Map(..)] => Some((Type::uint32(), ops::size as BuiltinOp)),
            _ => None,
        });
        table.insert("to_int32", |_, a| ops::conversion(a, IntTy::INT32));
        table.insert("to_int64", |_, a| ops::conversion(a, IntTy::INT64));
        table.insert("to_int128", |_, a| ops::conversion(a, IntTy::INT128));
        table.insert("to_int256", |_, a| ops::conversion(a, IntTy::INT256));
        table.insert("to_uint32", |_, a| ops::conversion(a, IntTy::UINT32));
        table.insert("to_uint64", |_, a| ops::conversion(a, IntTy::UINT64));
        table.insert("to_uint128", |_, a| ops::conversion(a, IntTy::UINT128));
        table.insert("to_uint256", |_, a| ops::conversion(a, IntTy::UINT256));

        StdBuiltins {
            table,
            resolved: RefCell::new(FxHashMap::default()),
        }
    }
}

impl BuiltinRegistry for StdBuiltins {
    fn find_op(
        &self,
        name: &str,
        targs: &[Type],
        arg_types: &[Type],
    ) -> EvalResult<(Type, BuiltinOp)> {
        let key: Signature = (Name::new(name), arg_types.iter().cloned().collect());
        if let Some(hit) = self.resolved.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let resolver = self
            .table
            .get(name)
            .ok_or_else(|| builtin_failure(name, "unknown builtin"))?;
        let found = resolver(targs, arg_types).ok_or_else(|| {
            let sig: Vec<String> = arg_types.iter().map(ToString::to_string).collect();
            builtin_failure(name, format!("no overload for ({})", sig.join(", ")))
        })?;
        self.resolved.borrow_mut().insert(key, found.clone());
        Ok(found)
    }
}

#[cfg(test)]
mod tests;
