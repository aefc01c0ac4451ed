//! Scilla IR - the evaluator's input representation.
//!
//! This crate contains the data structures the front end (parser,
//! disambiguation, type checker, gas instrumentation) produces and the
//! evaluator consumes:
//! - `Name` identifiers and `Span` source locations
//! - Declared `Type`s and source `Literal`s
//! - The expression and statement AST
//! - `GasCharge` cost expressions inserted by gas instrumentation
//! - Contract modules: libraries, parameters, fields, transitions, procedures
//!
//! The evaluator trusts this input to be well typed; it does not re-verify.

pub mod ast;
mod gas_charge;
pub mod labels;
mod literal;
pub mod module;
mod name;
mod span;
mod types;

pub use ast::{BlockchainQuery, Clause, Expr, ExprKind, Pattern, Payload, Stmt, StmtKind};
pub use gas_charge::GasCharge;
pub use literal::Literal;
pub use module::{
    Component, ComponentKind, Contract, ContractModule, CtrDef, FieldDef, LibEntry, Library, Param,
};
pub use name::Name;
pub use span::Span;
pub use types::{AddressKind, AddressType, IntTy, IntWidth, PrimType, Type, ADDRESS_WIDTH};
