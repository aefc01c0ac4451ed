#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental, boxing would add complexity across the evaluator"
)]
//! Scilla Eval - gas-metered evaluator for Scilla contracts.
//!
//! This crate runs type-checked, gas-instrumented contract modules.
//!
//! # Architecture
//!
//! The evaluator uses:
//! - `EnvArena`: environments as chains of frames, frozen after
//!   initialization and extended per message on a scratch layer
//! - `Interpreter`: big-step expression evaluation with an explicit gas meter
//! - `Configuration`: the mutable state of one message run, threaded through
//!   the statement evaluator
//! - `Runtime`: contract initialization and message dispatch
//!
//! Builtins, costs, type assignability and storage sit behind traits
//! (`BuiltinRegistry`, `CostModel`, `TypeOracle`, `StateStore`), each with a
//! standard implementation.
//!
//! # Re-exports
//!
//! Values and errors come from `scilla_value`:
//! - `Value`, `EvalError`, `EvalErrorKind`, `EvalResult`, `Outcome`

pub mod adt;
pub mod blockchain;
pub mod builtins;
pub mod call_stack;
pub mod contract;
pub mod cost_model;
pub mod environment;
pub mod exec;
pub mod gas;
pub mod interpreter;
pub mod options;
pub mod oracle;
mod stack;
pub mod storage;

#[cfg(test)]
mod test_helpers;

pub use scilla_value::{EvalError, EvalErrorKind, EvalResult, Outcome, Value};

pub use adt::AdtRegistry;
pub use blockchain::BlockchainState;
pub use builtins::{BuiltinRegistry, StdBuiltins};
pub use contract::{match_arguments, ContractState, InitResult, MessageResult, Runtime, RuntimeBuilder};
pub use cost_model::{CostModel, StdCostModel};
pub use environment::{EnvArena, FrozenEnv};
pub use exec::Configuration;
pub use gas::GasMeter;
pub use interpreter::{Interpreter, Services};
pub use options::EvalOptions;
pub use oracle::{PendingDynamicCheck, StdTypeOracle, TypeOracle};
pub use storage::{InMemoryState, StateStore, StoreError};
