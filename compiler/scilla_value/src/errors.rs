//! Evaluation errors.
//!
//! `EvalErrorKind` is the structured category of a failure; factory
//! functions (e.g. `unbound_identifier()`) are the public API and populate
//! both `kind` and `message`, so the message always equals
//! `kind.to_string()`.
//!
//! Every failure is terminal for the message being processed. Nothing in the
//! evaluator catches an `EvalError`; the harness decides what to persist.

use std::fmt;

use scilla_ir::Span;

use crate::value::Value;

/// Why a parameter list and an argument list do not line up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MismatchReason {
    /// A declared parameter has no argument.
    Missing,
    /// An argument names no declared parameter.
    Unexpected,
    /// Two arguments share a name.
    Duplicate,
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Environment
    UnboundIdentifier {
        name: String,
    },

    // Application
    NotAFunction {
        found: String,
    },
    NotATypeFunction {
        found: String,
    },
    ArityMismatch {
        constructor: String,
        expected: usize,
        got: usize,
    },
    UnknownConstructor {
        name: String,
    },
    CallDepthExceeded {
        limit: usize,
    },

    // Pattern
    NoMatchingPatternClause {
        scrutinee: String,
    },

    // Values
    ImpureValue {
        context: String,
    },
    NonCollection {
        operation: String,
        found: String,
    },
    BuiltinFailure {
        op: String,
        reason: String,
    },
    IntegerOverflow {
        operation: String,
    },

    // Gas
    OutOfGas {
        required: u64,
        remaining: u64,
    },
    NonIntegerGasCharge {
        charge: String,
    },

    // Contract protocol
    ConstraintViolation,
    NoMatchingTransition {
        tag: String,
    },
    ParameterArgumentMismatch {
        name: String,
        reason: MismatchReason,
    },
    TypeAssignability {
        name: String,
        expected: String,
        found: String,
    },
    InsufficientBalance {
        required: u128,
        balance: u128,
    },
    InvalidRemoteAddress {
        expected: usize,
        got: usize,
    },
    MalformedMessage {
        missing: String,
    },
    UnknownField {
        name: String,
    },
    UnknownProcedure {
        name: String,
    },
    UserThrown {
        payload: Option<String>,
    },

    // Host
    Storage {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundIdentifier { name } => write!(f, "unbound identifier: {name}"),

            Self::NotAFunction { found } => write!(f, "not a function: got a {found}"),
            Self::NotATypeFunction { found } => {
                write!(f, "not a type function: got a {found}")
            }
            Self::ArityMismatch {
                constructor,
                expected,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                write!(f, "constructor {constructor} expects {expected} {arg_word}, got {got}")
            }
            Self::UnknownConstructor { name } => write!(f, "unknown constructor: {name}"),
            Self::CallDepthExceeded { limit } => {
                write!(f, "maximum call depth exceeded (limit: {limit})")
            }

            Self::NoMatchingPatternClause { scrutinee } => {
                write!(f, "no clause matches the value of {scrutinee}")
            }

            Self::ImpureValue { context } => {
                write!(f, "{context} holds a closure or type closure")
            }
            Self::NonCollection { operation, found } => {
                write!(f, "{operation} requires a map or list, got a {found}")
            }
            Self::BuiltinFailure { op, reason } => write!(f, "builtin {op}: {reason}"),
            Self::IntegerOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }

            Self::OutOfGas {
                required,
                remaining,
            } => write!(f, "out of gas: {required} required, {remaining} remaining"),
            Self::NonIntegerGasCharge { charge } => {
                write!(f, "gas charge {charge} is not an integer")
            }

            Self::ConstraintViolation => write!(f, "contract constraint is not satisfied"),
            Self::NoMatchingTransition { tag } => {
                write!(f, "no transition named {tag}")
            }
            Self::ParameterArgumentMismatch { name, reason } => match reason {
                MismatchReason::Missing => write!(f, "no argument for parameter {name}"),
                MismatchReason::Unexpected => {
                    write!(f, "argument {name} matches no parameter")
                }
                MismatchReason::Duplicate => write!(f, "duplicate argument {name}"),
            },
            Self::TypeAssignability {
                name,
                expected,
                found,
            } => write!(f, "{name}: expected a value of type {expected}, got {found}"),
            Self::InsufficientBalance { required, balance } => {
                write!(f, "insufficient balance: {required} required, {balance} available")
            }
            Self::InvalidRemoteAddress { expected, got } => {
                write!(f, "invalid address: expected {expected} bytes, got {got}")
            }
            Self::MalformedMessage { missing } => {
                write!(f, "malformed message: missing entry {missing}")
            }
            Self::UnknownField { name } => write!(f, "unknown field: {name}"),
            Self::UnknownProcedure { name } => write!(f, "unknown procedure: {name}"),
            Self::UserThrown { payload: None } => write!(f, "exception thrown"),
            Self::UserThrown {
                payload: Some(payload),
            } => write!(f, "exception thrown: {payload}"),

            Self::Storage { message } => write!(f, "state access failed: {message}"),
        }
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug)]
pub struct EvalNote {
    pub message: String,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Transition or procedure name.
    pub name: String,
    pub span: Option<Span>,
}

/// The component call trail at an error site, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Frame names, innermost first.
    pub fn names(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.name.as_str()).collect()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "call trail:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured category.
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()`.
    pub message: String,
    /// Source location of the failing expression or statement.
    pub span: Option<Span>,
    /// Component call trail.
    ///
    /// Filled in by the statement evaluator; errors raised while evaluating
    /// library or initializer expressions have none.
    pub backtrace: Option<EvalBacktrace>,
    /// Payload of a user-thrown exception.
    pub exception: Option<Value>,
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
            exception: None,
            notes: Vec::new(),
        }
    }

    /// Attach a span unless one is already set; the innermost span wins.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    /// Attach a backtrace unless one is already set.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        if self.backtrace.is_none() {
            self.backtrace = Some(backtrace);
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Gas exhaustion is billed differently from logic errors.
    #[inline]
    pub fn is_out_of_gas(&self) -> bool {
        matches!(self.kind, EvalErrorKind::OutOfGas { .. })
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Environment

#[cold]
pub fn unbound_identifier(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnboundIdentifier {
        name: name.to_string(),
    })
}

// Application

#[cold]
pub fn not_a_function(found: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAFunction {
        found: found.kind_name().to_string(),
    })
}

#[cold]
pub fn not_a_type_function(found: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotATypeFunction {
        found: found.kind_name().to_string(),
    })
}

#[cold]
pub fn arity_mismatch(constructor: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        constructor: constructor.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn unknown_constructor(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownConstructor {
        name: name.to_string(),
    })
}

#[cold]
pub fn call_depth_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CallDepthExceeded { limit })
}

// Pattern

#[cold]
pub fn no_matching_clause(scrutinee: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMatchingPatternClause {
        scrutinee: scrutinee.to_string(),
    })
}

// Values

/// A closure reached a field or a message. `context` names where,
/// e.g. "field owner".
#[cold]
pub fn impure_value(context: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImpureValue {
        context: context.into(),
    })
}

#[cold]
pub fn non_collection(operation: &str, found: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonCollection {
        operation: operation.to_string(),
        found: found.kind_name().to_string(),
    })
}

#[cold]
pub fn builtin_failure(op: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BuiltinFailure {
        op: op.to_string(),
        reason: reason.into(),
    })
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

// Gas

#[cold]
pub fn out_of_gas(required: u64, remaining: u64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutOfGas {
        required,
        remaining,
    })
}

#[cold]
pub fn non_integer_gas_charge(charge: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonIntegerGasCharge {
        charge: charge.to_string(),
    })
}

// Contract protocol

#[cold]
pub fn constraint_violation() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstraintViolation)
}

#[cold]
pub fn no_matching_transition(tag: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMatchingTransition {
        tag: tag.to_string(),
    })
}

#[cold]
pub fn parameter_mismatch(name: &str, reason: MismatchReason) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ParameterArgumentMismatch {
        name: name.to_string(),
        reason,
    })
}

#[cold]
pub fn type_assignability(
    name: &str,
    expected: impl fmt::Display,
    found: impl fmt::Display,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeAssignability {
        name: name.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    })
}

#[cold]
pub fn insufficient_balance(required: u128, balance: u128) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InsufficientBalance { required, balance })
}

#[cold]
pub fn invalid_remote_address(expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidRemoteAddress { expected, got })
}

#[cold]
pub fn malformed_message(missing: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedMessage {
        missing: missing.to_string(),
    })
}

#[cold]
pub fn unknown_field(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownField {
        name: name.to_string(),
    })
}

#[cold]
pub fn unknown_procedure(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownProcedure {
        name: name.to_string(),
    })
}

/// `throw` with an optional exception payload.
#[cold]
pub fn user_thrown(payload: Option<Value>) -> EvalError {
    let mut err = EvalError::from_kind(EvalErrorKind::UserThrown {
        payload: payload.as_ref().map(ToString::to_string),
    });
    err.exception = payload;
    err
}

// Host

#[cold]
pub fn storage(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Storage {
        message: message.into(),
    })
}
