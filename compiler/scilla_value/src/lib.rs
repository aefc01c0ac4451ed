#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental, boxing would add complexity across the evaluator"
)]
//! Scilla Value - runtime values and evaluation errors.
//!
//! This crate provides:
//! - Runtime values (`Value`, `IntValue`, closures, ADT values, maps, messages)
//! - The environment handle closures capture (`Env`, `FrameId`)
//! - Evaluation errors (`EvalError`, `EvalErrorKind`) and their factories
//! - `Outcome<T>`, a result paired with the gas remaining

pub mod errors;
mod outcome;
mod value;

pub use errors::{
    BacktraceFrame, EvalBacktrace, EvalError, EvalErrorKind, EvalNote, MismatchReason,
};
pub use outcome::Outcome;
pub use value::{
    adt_names, AdtValue, Closure, Env, FrameId, IntValue, MapValue, Message, MsgEntry,
    TypeClosure, Value,
};

/// Result of evaluating an expression.
pub type EvalResult<T = Value> = Result<T, EvalError>;
