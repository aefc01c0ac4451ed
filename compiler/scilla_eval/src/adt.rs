//! Registry of algebraic datatypes.
//!
//! One registry value is threaded through contract initialization: it starts
//! with the built-in datatypes and grows with every `type` entry of the
//! imported and contract libraries. Nothing here is global, so repeated or
//! concurrent initializations stay isolated.

use rustc_hash::FxHashMap;
use scilla_ir::{CtrDef, Name, Type};
use scilla_value::adt_names as adt;

/// What the evaluator needs to know about a constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorInfo {
    pub type_name: Name,
    pub arity: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdtDef {
    pub name: Name,
    pub tparams: Vec<Name>,
    pub constructors: Vec<CtrDef>,
}

#[derive(Clone, Debug, Default)]
pub struct AdtRegistry {
    types: FxHashMap<Name, AdtDef>,
    constructors: FxHashMap<Name, ConstructorInfo>,
}

impl AdtRegistry {
    /// An empty registry, without even `Bool`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding `Bool`, `Option`, `List`, `Pair` and `Nat`.
    pub fn with_builtins() -> Self {
        let a = || Type::TypeVar(Name::new("'A"));
        let b = || Type::TypeVar(Name::new("'B"));
        let ctr = |name: &str, arg_types: Vec<Type>| CtrDef {
            name: Name::new(name),
            arg_types,
        };

        let mut reg = Self::empty();
        reg.register(
            Name::new(adt::BOOL),
            Vec::new(),
            vec![ctr(adt::TRUE, vec![]), ctr(adt::FALSE, vec![])],
        );
        reg.register(
            Name::new(adt::OPTION),
            vec![Name::new("'A")],
            vec![ctr(adt::SOME, vec![a()]), ctr(adt::NONE, vec![])],
        );
        reg.register(
            Name::new(adt::LIST),
            vec![Name::new("'A")],
            vec![
                ctr(adt::CONS, vec![a(), Type::list(a())]),
                ctr(adt::NIL, vec![]),
            ],
        );
        reg.register(
            Name::new(adt::PAIR),
            vec![Name::new("'A"), Name::new("'B")],
            vec![ctr(adt::PAIR, vec![a(), b()])],
        );
        reg.register(
            Name::new(adt::NAT),
            Vec::new(),
            vec![
                ctr(adt::ZERO, vec![]),
                ctr(adt::SUCC, vec![Type::Adt(Name::new(adt::NAT), Vec::new())]),
            ],
        );
        reg
    }

    /// Register a datatype, replacing any earlier one of the same name.
    pub fn register(&mut self, name: Name, tparams: Vec<Name>, constructors: Vec<CtrDef>) {
        for c in &constructors {
            self.constructors.insert(
                c.name.clone(),
                ConstructorInfo {
                    type_name: name.clone(),
                    arity: c.arg_types.len(),
                },
            );
        }
        self.types.insert(
            name.clone(),
            AdtDef {
                name,
                tparams,
                constructors,
            },
        );
    }

    pub fn constructor(&self, name: &str) -> Option<&ConstructorInfo> {
        self.constructors.get(name)
    }

    pub fn get(&self, type_name: &str) -> Option<&AdtDef> {
        self.types.get(type_name)
    }
}
