#![allow(clippy::unwrap_used)]

use super::*;
use pretty_assertions::assert_eq;
use scilla_value::{EvalErrorKind, IntValue, MapValue};

fn call(name: &str, args: &[Value]) -> EvalResult<Value> {
    let reg = StdBuiltins::new();
    let types: Vec<Type> = args.iter().map(|v| v.type_of().unwrap()).collect();
    let (ret, op) = reg.find_op(name, &[], &types)?;
    op(&[], args, &ret)
}

#[test]
fn arithmetic_is_width_checked() {
    assert_eq!(
        call("add", &[Value::uint32(2), Value::uint32(3)]).unwrap(),
        Value::uint32(5)
    );
    let err = call("add", &[Value::uint32(u32::MAX), Value::uint32(1)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
    let err = call("sub", &[Value::uint32(0), Value::uint32(1)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::IntegerOverflow { .. }));
    assert_eq!(
        call("sub", &[Value::int32(0), Value::int32(1)]).unwrap(),
        Value::int32(-1)
    );
}

#[test]
fn division_by_zero_fails() {
    let err = call("div", &[Value::uint64(1), Value::uint64(0)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::BuiltinFailure { .. }));
    assert_eq!(
        call("rem", &[Value::uint64(7), Value::uint64(3)]).unwrap(),
        Value::uint64(1)
    );
}

#[test]
fn mixed_widths_have_no_overload() {
    let err = call("add", &[Value::uint32(1), Value::uint64(1)]).unwrap_err();
    assert!(err.message.contains("no overload"));
    let err = call("frobnicate", &[]).unwrap_err();
    assert!(err.message.contains("unknown builtin"));
}

#[test]
fn concat_is_overloaded() {
    assert_eq!(
        call("concat", &[Value::string("ab"), Value::string("cd")]).unwrap(),
        Value::string("abcd")
    );
    let joined = call("concat", &[Value::bystrx([1u8, 2]), Value::bystrx([3u8])]).unwrap();
    assert_eq!(joined, Value::bystrx([1u8, 2, 3]));
    assert_eq!(joined.type_of(), Some(Type::bystrx(3)));
}

#[test]
fn eq_compares_primitives_only() {
    assert_eq!(
        call("eq", &[Value::string("a"), Value::string("a")]).unwrap(),
        Value::bool(true)
    );
    let reg = StdBuiltins::new();
    assert!(reg
        .find_op("eq", &[], &[Type::bool(), Type::bool()])
        .is_err());
}

#[test]
fn strings_and_substr() {
    assert_eq!(
        call("strlen", &[Value::string("hello")]).unwrap(),
        Value::uint32(5)
    );
    assert_eq!(
        call(
            "substr",
            &[Value::string("hello"), Value::uint32(1), Value::uint32(3)]
        )
        .unwrap(),
        Value::string("ell")
    );
    let err = call(
        "substr",
        &[Value::string("hello"), Value::uint32(4), Value::uint32(3)],
    )
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::BuiltinFailure { .. }));
    assert_eq!(
        call("to_string", &[Value::bystrx([0xde, 0xad])]).unwrap(),
        Value::string("0xdead")
    );
}

#[test]
fn block_numbers() {
    assert_eq!(
        call("badd", &[Value::bnum(10u32), Value::uint32(5)]).unwrap(),
        Value::bnum(15u32)
    );
    assert_eq!(
        call("blt", &[Value::bnum(1u32), Value::bnum(2u32)]).unwrap(),
        Value::bool(true)
    );
    let diff = call("bsub", &[Value::bnum(1u32), Value::bnum(4u32)]).unwrap();
    assert_eq!(
        diff,
        Value::Int(IntValue::new(IntTy::INT256, (-3).into()).unwrap())
    );
}

#[test]
fn map_builtins_are_functional() {
    let m = Value::Map(MapValue::empty(Type::string(), Type::uint32()));
    let m1 = call("put", &[m.clone(), Value::string("a"), Value::uint32(1)]).unwrap();
    assert_eq!(call("size", &[m.clone()]).unwrap(), Value::uint32(0));
    assert_eq!(call("size", &[m1.clone()]).unwrap(), Value::uint32(1));
    assert_eq!(
        call("get", &[m1.clone(), Value::string("a")]).unwrap(),
        Value::some(Type::uint32(), Value::uint32(1))
    );
    assert_eq!(
        call("get", &[m1.clone(), Value::string("b")]).unwrap(),
        Value::none(Type::uint32())
    );
    assert_eq!(
        call("contains", &[m1.clone(), Value::string("a")]).unwrap(),
        Value::bool(true)
    );
    let m2 = call("remove", &[m1, Value::string("a")]).unwrap();
    assert_eq!(m2, m);
}

#[test]
fn map_key_type_must_match() {
    let m = Value::Map(MapValue::empty(Type::string(), Type::uint32()));
    let err = call("get", &[m, Value::uint32(1)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::BuiltinFailure { .. }));
}

#[test]
fn conversions_return_options() {
    assert_eq!(
        call("to_uint32", &[Value::int32(7)]).unwrap(),
        Value::some(Type::uint32(), Value::uint32(7))
    );
    assert_eq!(
        call("to_uint32", &[Value::int32(-1)]).unwrap(),
        Value::none(Type::uint32())
    );
    assert_eq!(
        call("to_uint64", &[Value::string("42")]).unwrap(),
        Value::some(Type::uint64(), Value::uint64(42))
    );
    assert_eq!(
        call("to_uint64", &[Value::string("forty")]).unwrap(),
        Value::none(Type::uint64())
    );
}

#[test]
fn resolutions_are_cached_per_signature() {
    let reg = StdBuiltins::new();
    reg.find_op("add", &[], &[Type::uint32(), Type::uint32()])
        .unwrap();
    reg.find_op("add", &[], &[Type::uint32(), Type::uint32()])
        .unwrap();
    reg.find_op("add", &[], &[Type::uint64(), Type::uint64()])
        .unwrap();
    assert_eq!(reg.resolved.borrow().len(), 2);
}
