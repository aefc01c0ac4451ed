//! Contract modules: libraries, parameters, fields and components.

use std::rc::Rc;

use crate::{labels, Expr, Name, Stmt, Type};

/// A named, typed parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Name,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<Name>, ty: Type) -> Self {
        Param {
            name: name.into(),
            ty,
        }
    }
}

/// Constructor of a user-defined algebraic datatype.
#[derive(Clone, Debug, PartialEq)]
pub struct CtrDef {
    pub name: Name,
    pub arg_types: Vec<Type>,
}

/// A library entry.
#[derive(Clone, Debug, PartialEq)]
pub enum LibEntry {
    /// `let name = expr`
    Var {
        name: Name,
        ty: Option<Type>,
        expr: Expr,
    },
    /// `type name = | C1 of ... | C2 of ...`
    Type {
        name: Name,
        tparams: Vec<Name>,
        constructors: Vec<CtrDef>,
    },
}

/// A library: an ordered list of entries, each seeing the previous ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Library {
    pub name: Name,
    pub entries: Vec<LibEntry>,
}

/// A persistent field declaration with its initializer.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: Name,
    pub ty: Type,
    pub init: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Transition,
    Procedure,
}

/// A transition or procedure.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: Name,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl Component {
    pub fn transition(name: impl Into<Name>, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Component {
            kind: ComponentKind::Transition,
            name: name.into(),
            params,
            body,
        }
    }

    pub fn procedure(name: impl Into<Name>, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Component {
            kind: ComponentKind::Procedure,
            name: name.into(),
            params,
            body,
        }
    }

    /// Declared parameters preceded by the implicit `_amount`, `_origin` and
    /// `_sender`.
    pub fn params_with_implicit(&self) -> Vec<Param> {
        let mut params = labels::implicit_component_params();
        params.extend(self.params.iter().cloned());
        params
    }
}

/// The contract proper.
#[derive(Clone, Debug, PartialEq)]
pub struct Contract {
    pub name: Name,
    pub params: Vec<Param>,
    /// Contract invariant over the parameters; `None` means `True`.
    pub constraint: Option<Expr>,
    pub fields: Vec<FieldDef>,
    pub components: Vec<Rc<Component>>,
}

impl Contract {
    /// Declared parameters followed by the implicit `_this_address`,
    /// `_creation_block` and `_scilla_version`.
    pub fn params_with_implicit(&self) -> Vec<Param> {
        let mut params = self.params.clone();
        params.extend(labels::implicit_contract_params());
        params
    }
}

/// A complete, type-checked contract module.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractModule {
    pub scilla_version: u32,
    /// Imported external libraries, in dependency order.
    pub imports: Vec<Library>,
    pub library: Option<Library>,
    pub contract: Contract,
}
