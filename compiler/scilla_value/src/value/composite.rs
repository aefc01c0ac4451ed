//! Composite value payloads: closures, ADT values, maps and messages.

use std::collections::BTreeMap;
use std::rc::Rc;

use scilla_ir::{Expr, Name, Type};

use super::Value;

/// Index of a frame in an environment arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameId(u32);

impl FrameId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        FrameId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an environment: the innermost frame of a scope chain, or the
/// empty environment.
///
/// Closures hold a handle rather than the bindings themselves, which keeps a
/// recursive closure from owning itself.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Env(Option<FrameId>);

impl Env {
    pub const EMPTY: Env = Env(None);

    #[inline]
    pub const fn at(frame: FrameId) -> Self {
        Env(Some(frame))
    }

    #[inline]
    pub const fn top(self) -> Option<FrameId> {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0.is_none()
    }
}

/// A function value: `fun (param : param_ty) => body` with its defining
/// environment.
#[derive(Clone, Debug)]
pub struct Closure {
    pub param: Name,
    pub param_ty: Type,
    pub body: Rc<Expr>,
    pub env: Env,
}

/// A type abstraction: `tfun tvar => body` with its defining environment.
#[derive(Clone, Debug)]
pub struct TypeClosure {
    pub tvar: Name,
    pub body: Rc<Expr>,
    pub env: Env,
}

/// A constructor applied to its arguments.
#[derive(Clone, Debug)]
pub struct AdtValue {
    pub type_name: Name,
    pub constructor: Name,
    pub targs: Vec<Type>,
    pub args: Vec<Value>,
}

/// A map value. Declared key and value types are kept so an empty map still
/// knows its type.
#[derive(Clone, Debug)]
pub struct MapValue {
    pub key_ty: Type,
    pub val_ty: Type,
    pub entries: Rc<BTreeMap<Value, Value>>,
}

impl MapValue {
    pub fn empty(key_ty: Type, val_ty: Type) -> Self {
        MapValue {
            key_ty,
            val_ty,
            entries: Rc::new(BTreeMap::new()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Copy-on-write insert.
    #[must_use]
    pub fn insert(&self, key: Value, value: Value) -> Self {
        let mut entries = Rc::clone(&self.entries);
        Rc::make_mut(&mut entries).insert(key, value);
        MapValue {
            key_ty: self.key_ty.clone(),
            val_ty: self.val_ty.clone(),
            entries,
        }
    }

    /// Copy-on-write removal.
    #[must_use]
    pub fn remove(&self, key: &Value) -> Self {
        let mut entries = Rc::clone(&self.entries);
        Rc::make_mut(&mut entries).remove(key);
        MapValue {
            key_ty: self.key_ty.clone(),
            val_ty: self.val_ty.clone(),
            entries,
        }
    }

    pub fn ty(&self) -> Type {
        Type::map(self.key_ty.clone(), self.val_ty.clone())
    }
}

/// One `name : type = value` entry of a message, event or exception.
#[derive(Clone, Debug)]
pub struct MsgEntry {
    pub name: Name,
    pub ty: Type,
    pub value: Value,
}

/// A message, event or exception payload.
#[derive(Clone, Debug, Default)]
pub struct Message {
    pub entries: Vec<MsgEntry>,
}

impl Message {
    pub fn new(entries: Vec<MsgEntry>) -> Self {
        Message { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}
