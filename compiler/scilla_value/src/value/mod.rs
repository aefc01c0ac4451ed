//! Runtime values.
//!
//! Heap payloads are reference counted so values can be shared freely
//! between environments, map entries and messages. Address-typed values are
//! plain `ByStrX` byte strings at runtime; no address variant exists.
//!
//! # Purity
//!
//! Values stored in fields or sent in messages must be *pure*: no closure or
//! type closure anywhere inside them. See [`Value::is_pure`].

mod composite;
mod int;

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use scilla_ir::{Literal, Name, PrimType, Type};

pub use composite::{
    AdtValue, Closure, Env, FrameId, MapValue, Message, MsgEntry, TypeClosure,
};
pub use int::IntValue;

/// Names of the built-in algebraic datatypes and their constructors.
pub mod adt_names {
    pub const BOOL: &str = "Bool";
    pub const TRUE: &str = "True";
    pub const FALSE: &str = "False";
    pub const OPTION: &str = "Option";
    pub const SOME: &str = "Some";
    pub const NONE: &str = "None";
    pub const LIST: &str = "List";
    pub const CONS: &str = "Cons";
    pub const NIL: &str = "Nil";
    pub const PAIR: &str = "Pair";
    pub const NAT: &str = "Nat";
    pub const ZERO: &str = "Zero";
    pub const SUCC: &str = "Succ";
}

use adt_names as adt;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Int(IntValue),
    Str(Rc<str>),
    BNum(BigUint),
    /// Fixed-width byte string; addresses are `ByStrX` of width 20.
    ByStrX(Rc<[u8]>),
    ByStr(Rc<[u8]>),
    Closure(Rc<Closure>),
    TypeClosure(Rc<TypeClosure>),
    Adt(Rc<AdtValue>),
    Map(MapValue),
    Msg(Rc<Message>),
}

impl Value {
    // Primitive factories

    #[inline]
    pub fn uint32(v: u32) -> Value {
        Value::Int(IntValue::uint32(v))
    }

    #[inline]
    pub fn uint64(v: u64) -> Value {
        Value::Int(IntValue::uint64(v))
    }

    #[inline]
    pub fn uint128(v: u128) -> Value {
        Value::Int(IntValue::uint128(v))
    }

    #[inline]
    pub fn int32(v: i32) -> Value {
        Value::Int(IntValue::int32(v))
    }

    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn bnum(n: impl Into<BigUint>) -> Value {
        Value::BNum(n.into())
    }

    pub fn bystrx(bytes: impl AsRef<[u8]>) -> Value {
        Value::ByStrX(Rc::from(bytes.as_ref()))
    }

    pub fn bystr(bytes: impl AsRef<[u8]>) -> Value {
        Value::ByStr(Rc::from(bytes.as_ref()))
    }

    /// Convert a literal, normalizing address literals to `ByStr20`.
    ///
    /// Returns `None` for an integer outside its declared width. Empty-map
    /// literals are converted with their types as written; the caller
    /// resolves type variables first.
    pub fn from_literal(lit: &Literal) -> Option<Value> {
        Some(match lit {
            Literal::Int { ty, value } => Value::Int(IntValue::new(*ty, value.clone())?),
            Literal::Str(s) => Value::string(s),
            Literal::BNum(n) => Value::BNum(n.clone()),
            Literal::ByStrX(b) | Literal::Address(b) => Value::bystrx(b),
            Literal::ByStr(b) => Value::bystr(b),
            Literal::EmptyMap { key, value } => {
                Value::Map(MapValue::empty(key.clone(), value.clone()))
            }
        })
    }

    // ADT factories

    pub fn adt(type_name: &str, constructor: &str, targs: Vec<Type>, args: Vec<Value>) -> Value {
        Value::Adt(Rc::new(AdtValue {
            type_name: Name::new(type_name),
            constructor: Name::new(constructor),
            targs,
            args,
        }))
    }

    pub fn bool(b: bool) -> Value {
        let ctor = if b { adt::TRUE } else { adt::FALSE };
        Value::adt(adt::BOOL, ctor, Vec::new(), Vec::new())
    }

    pub fn some(ty: Type, v: Value) -> Value {
        Value::adt(adt::OPTION, adt::SOME, vec![ty], vec![v])
    }

    pub fn none(ty: Type) -> Value {
        Value::adt(adt::OPTION, adt::NONE, vec![ty], Vec::new())
    }

    pub fn nil(ty: Type) -> Value {
        Value::adt(adt::LIST, adt::NIL, vec![ty], Vec::new())
    }

    pub fn cons(ty: Type, head: Value, tail: Value) -> Value {
        Value::adt(adt::LIST, adt::CONS, vec![ty], vec![head, tail])
    }

    /// Build a `List ty` from elements, first element at the head.
    pub fn list(ty: &Type, items: Vec<Value>) -> Value {
        items
            .into_iter()
            .rev()
            .fold(Value::nil(ty.clone()), |tail, head| {
                Value::cons(ty.clone(), head, tail)
            })
    }

    pub fn pair(t1: Type, t2: Type, a: Value, b: Value) -> Value {
        Value::adt(adt::PAIR, adt::PAIR, vec![t1, t2], vec![a, b])
    }

    pub fn msg(entries: Vec<MsgEntry>) -> Value {
        Value::Msg(Rc::new(Message::new(entries)))
    }

    // Accessors

    pub fn as_int(&self) -> Option<&IntValue> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bystrx(&self) -> Option<&[u8]> {
        match self {
            Value::ByStrX(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_adt(&self) -> Option<&AdtValue> {
        match self {
            Value::Adt(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_msg(&self) -> Option<&Message> {
        match self {
            Value::Msg(m) => Some(m),
            _ => None,
        }
    }

    /// `Some(true)` for `True`, `Some(false)` for `False`, `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        let a = self.as_adt()?;
        if a.type_name != adt::BOOL {
            return None;
        }
        match a.constructor.as_str() {
            adt::TRUE => Some(true),
            adt::FALSE => Some(false),
            _ => None,
        }
    }

    /// Elements of a `Cons`/`Nil` list, head first.
    pub fn as_list(&self) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut cur = self;
        loop {
            let a = cur.as_adt()?;
            if a.type_name != adt::LIST {
                return None;
            }
            match (a.constructor.as_str(), a.args.as_slice()) {
                (adt::NIL, []) => return Some(items),
                (adt::CONS, [head, tail]) => {
                    items.push(head.clone());
                    cur = tail;
                }
                _ => return None,
            }
        }
    }

    /// Numeric magnitude of an integer or block number, if it fits `u64`.
    pub fn magnitude(&self) -> Option<u64> {
        match self {
            Value::Int(i) => i.to_u64(),
            Value::BNum(n) => n.to_u64(),
            _ => None,
        }
    }

    /// Whether the value contains no closure or type closure.
    pub fn is_pure(&self) -> bool {
        match self {
            Value::Closure(_) | Value::TypeClosure(_) => false,
            Value::Adt(a) => a.args.iter().all(Value::is_pure),
            Value::Map(m) => m.entries.iter().all(|(k, v)| k.is_pure() && v.is_pure()),
            Value::Msg(m) => m.entries.iter().all(|e| e.value.is_pure()),
            Value::Int(_) | Value::Str(_) | Value::BNum(_) | Value::ByStrX(_) | Value::ByStr(_) => {
                true
            }
        }
    }

    /// Whether the value may appear as an entry of a message, event or
    /// exception: pure, and no maps or nested messages.
    pub fn is_sendable(&self) -> bool {
        match self {
            Value::Closure(_) | Value::TypeClosure(_) | Value::Map(_) | Value::Msg(_) => false,
            Value::Adt(a) => a.args.iter().all(Value::is_sendable),
            Value::Int(_) | Value::Str(_) | Value::BNum(_) | Value::ByStrX(_) | Value::ByStr(_) => {
                true
            }
        }
    }

    /// The type of a pure value; `None` for closures.
    pub fn type_of(&self) -> Option<Type> {
        Some(match self {
            Value::Int(i) => Type::int(i.ty()),
            Value::Str(_) => Type::string(),
            Value::BNum(_) => Type::bnum(),
            Value::ByStrX(b) => Type::bystrx(u32::try_from(b.len()).ok()?),
            Value::ByStr(_) => Type::Prim(PrimType::ByStr),
            Value::Adt(a) => Type::Adt(a.type_name.clone(), a.targs.clone()),
            Value::Map(m) => m.ty(),
            Value::Msg(_) => Type::msg(),
            Value::Closure(_) | Value::TypeClosure(_) => return None,
        })
    }

    /// Short description of the value's kind for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::BNum(_) => "block number",
            Value::ByStrX(_) => "fixed-width byte string",
            Value::ByStr(_) => "byte string",
            Value::Closure(_) => "closure",
            Value::TypeClosure(_) => "type closure",
            Value::Adt(_) => "constructor value",
            Value::Map(_) => "map",
            Value::Msg(_) => "message",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) => 0,
            Value::Str(_) => 1,
            Value::BNum(_) => 2,
            Value::ByStrX(_) => 3,
            Value::ByStr(_) => 4,
            Value::Closure(_) => 5,
            Value::TypeClosure(_) => 6,
            Value::Adt(_) => 7,
            Value::Map(_) => 8,
            Value::Msg(_) => 9,
        }
    }
}

// Closures compare by identity; they never appear as map keys because map
// keys are always pure.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::BNum(a), Value::BNum(b)) => a.cmp(b),
            (Value::ByStrX(a), Value::ByStrX(b)) | (Value::ByStr(a), Value::ByStr(b)) => a.cmp(b),
            (Value::Closure(a), Value::Closure(b)) => Rc::as_ptr(a).cmp(&Rc::as_ptr(b)),
            (Value::TypeClosure(a), Value::TypeClosure(b)) => Rc::as_ptr(a).cmp(&Rc::as_ptr(b)),
            (Value::Adt(a), Value::Adt(b)) => a
                .type_name
                .cmp(&b.type_name)
                .then_with(|| a.constructor.cmp(&b.constructor))
                .then_with(|| a.args.cmp(&b.args)),
            (Value::Map(a), Value::Map(b)) => a.entries.iter().cmp(b.entries.iter()),
            (Value::Msg(a), Value::Msg(b)) => a
                .entries
                .iter()
                .map(|e| (&e.name, &e.value))
                .cmp(b.entries.iter().map(|e| (&e.name, &e.value))),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::BNum(n) => write!(f, "BNum {n}"),
            Value::ByStrX(b) | Value::ByStr(b) => write_hex(f, b),
            Value::Closure(_) => f.write_str("<closure>"),
            Value::TypeClosure(_) => f.write_str("<type closure>"),
            Value::Adt(a) if a.args.is_empty() => write!(f, "{}", a.constructor),
            Value::Adt(a) => {
                write!(f, "({}", a.constructor)?;
                for arg in &a.args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Value::Map(m) => {
                f.write_str("[")?;
                for (i, (k, v)) in m.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                f.write_str("]")
            }
            Value::Msg(m) => {
                f.write_str("{")?;
                for (i, e) in m.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{} : {}", e.name, e.value)?;
                }
                f.write_str("}")
            }
        }
    }
}
