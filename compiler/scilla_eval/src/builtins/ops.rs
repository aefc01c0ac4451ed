//! Implementations of the standard builtins.
//!
//! Argument shapes were checked when the operation was resolved, so a shape
//! mismatch here means a registry bug; it is still reported as a
//! `BuiltinFailure` rather than a panic.

use std::fmt::Write as _;

use num_bigint::BigInt;
use scilla_ir::{IntTy, PrimType, Type};
use scilla_value::errors::{builtin_failure, integer_overflow};
use scilla_value::{EvalResult, IntValue, Value};

use super::BuiltinOp;

fn shape(op: &str) -> scilla_value::EvalError {
    builtin_failure(op, "arguments do not match the resolved signature")
}

fn two_ints<'v>(op: &str, args: &'v [Value]) -> EvalResult<(&'v IntValue, &'v IntValue)> {
    match args {
        [Value::Int(a), Value::Int(b)] => Ok((a, b)),
        _ => Err(shape(op)),
    }
}

fn int_result(op: &str, r: Option<IntValue>) -> EvalResult<Value> {
    r.map(Value::Int).ok_or_else(|| integer_overflow(op))
}

pub(super) fn eq(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [a, b] => Ok(Value::bool(a == b)),
        _ => Err(shape("eq")),
    }
}

pub(super) fn add(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (a, b) = two_ints("add", args)?;
    int_result("add", a.checked_add(b))
}

pub(super) fn sub(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (a, b) = two_ints("sub", args)?;
    int_result("sub", a.checked_sub(b))
}

pub(super) fn mul(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (a, b) = two_ints("mul", args)?;
    int_result("mul", a.checked_mul(b))
}

pub(super) fn div(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (a, b) = two_ints("div", args)?;
    if b.is_zero() {
        return Err(builtin_failure("div", "division by zero"));
    }
    int_result("div", a.checked_div(b))
}

pub(super) fn rem(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (a, b) = two_ints("rem", args)?;
    if b.is_zero() {
        return Err(builtin_failure("rem", "division by zero"));
    }
    int_result("rem", a.checked_rem(b))
}

pub(super) fn lt(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (a, b) = two_ints("lt", args)?;
    Ok(Value::bool(a.value() < b.value()))
}

pub(super) fn pow(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let (base, exp) = two_ints("pow", args)?;
    let exp = exp
        .to_u64()
        .and_then(|e| u32::try_from(e).ok())
        .ok_or_else(|| shape("pow"))?;
    int_result("pow", base.checked_pow(exp))
}

pub(super) fn concat(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Str(a), Value::Str(b)] => Ok(Value::string(format!("{a}{b}"))),
        [Value::ByStrX(a), Value::ByStrX(b)] => Ok(Value::bystrx([&a[..], &b[..]].concat())),
        [Value::ByStr(a), Value::ByStr(b)] => Ok(Value::bystr([&a[..], &b[..]].concat())),
        _ => Err(shape("concat")),
    }
}

fn len_u32(op: &str, len: usize) -> EvalResult<Value> {
    u32::try_from(len)
        .map(Value::uint32)
        .map_err(|_| integer_overflow(op))
}

pub(super) fn strlen(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Str(s)] => len_u32("strlen", s.len()),
        [Value::ByStr(b)] => len_u32("strlen", b.len()),
        _ => Err(shape("strlen")),
    }
}

/// `substr s start len`, in bytes.
pub(super) fn substr(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    let [Value::Str(s), Value::Int(start), Value::Int(len)] = args else {
        return Err(shape("substr"));
    };
    let range = start
        .to_u64()
        .zip(len.to_u64())
        .and_then(|(start, len)| {
            let start = usize::try_from(start).ok()?;
            let end = start.checked_add(usize::try_from(len).ok()?)?;
            s.get(start..end)
        })
        .ok_or_else(|| builtin_failure("substr", "range out of bounds"))?;
    Ok(Value::string(range))
}

pub(super) fn to_string(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Int(i)] => Ok(Value::string(i.to_string())),
        [Value::ByStrX(b) | Value::ByStr(b)] => {
            let mut out = String::with_capacity(2 + b.len() * 2);
            out.push_str("0x");
            for byte in b.iter() {
                let _ = write!(out, "{byte:02x}");
            }
            Ok(Value::string(out))
        }
        _ => Err(shape("to_string")),
    }
}

pub(super) fn blt(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::BNum(a), Value::BNum(b)] => Ok(Value::bool(a < b)),
        _ => Err(shape("blt")),
    }
}

pub(super) fn badd(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::BNum(a), Value::Int(b)] => {
            let delta = b
                .value()
                .to_biguint()
                .ok_or_else(|| builtin_failure("badd", "negative increment"))?;
            Ok(Value::BNum(a + delta))
        }
        _ => Err(shape("badd")),
    }
}

pub(super) fn bsub(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::BNum(a), Value::BNum(b)] => {
            let diff = BigInt::from(a.clone()) - BigInt::from(b.clone());
            int_result("bsub", IntValue::new(IntTy::INT256, diff))
        }
        _ => Err(shape("bsub")),
    }
}

pub(super) fn put(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Map(m), k, v] => Ok(Value::Map(m.insert(k.clone(), v.clone()))),
        _ => Err(shape("put")),
    }
}

/// Value type of an `Option t` result type.
fn option_payload(ret: &Type) -> Type {
    match ret {
        Type::Adt(_, targs) => targs.first().cloned().unwrap_or(Type::Unit),
        _ => Type::Unit,
    }
}

pub(super) fn get(_: &[Type], args: &[Value], ret: &Type) -> EvalResult<Value> {
    match args {
        [Value::Map(m), k] => {
            let ty = option_payload(ret);
            Ok(match m.get(k) {
                Some(v) => Value::some(ty, v.clone()),
                None => Value::none(ty),
            })
        }
        _ => Err(shape("get")),
    }
}

pub(super) fn remove(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Map(m), k] => Ok(Value::Map(m.remove(k))),
        _ => Err(shape("remove")),
    }
}

pub(super) fn contains(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Map(m), k] => Ok(Value::bool(m.get(k).is_some())),
        _ => Err(shape("contains")),
    }
}

pub(super) fn size(_: &[Type], args: &[Value], _: &Type) -> EvalResult<Value> {
    match args {
        [Value::Map(m)] => len_u32("size", m.len()),
        _ => Err(shape("size")),
    }
}

/// Resolver shared by the `to_intN`/`to_uintN` family.
pub(super) fn conversion(arg_types: &[Type], target: IntTy) -> Option<(Type, BuiltinOp)> {
    match arg_types {
        [Type::Prim(PrimType::Int(_) | PrimType::String)] => {
            Some((Type::option(Type::int(target)), convert as BuiltinOp))
        }
        _ => None,
    }
}

/// `Some` of the converted integer, `None` if it does not fit or parse.
fn convert(_: &[Type], args: &[Value], ret: &Type) -> EvalResult<Value> {
    let target_ty = option_payload(ret);
    let Type::Prim(PrimType::Int(target)) = target_ty else {
        return Err(shape("to_int"));
    };
    let converted = match args {
        [Value::Int(i)] => i.convert(target),
        [Value::Str(s)] => s
            .parse::<BigInt>()
            .ok()
            .and_then(|m| IntValue::new(target, m)),
        _ => return Err(shape("to_int")),
    };
    Ok(match converted {
        Some(v) => Value::some(target_ty, Value::Int(v)),
        None => Value::none(target_ty),
    })
}
