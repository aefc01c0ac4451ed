//! Contract entry points: initialization and message dispatch.
//!
//! A [`Runtime`] owns the collaborators shared by every run (builtin
//! registry, cost model, type oracle) and the [`EvalOptions`]. Each entry
//! point builds a fresh [`Interpreter`] with its own gas meter, runs, and
//! reports the result together with the gas left, whether it succeeded or
//! not.
//!
//! Persistent field values live in the caller's [`StateStore`]. What the
//! runtime hands back between runs is a [`ContractState`]: the frozen library
//! and parameter bindings, the field declarations, the balance and the
//! datatype registry built from the libraries.

mod dispatch;
mod init;

use std::rc::Rc;

use scilla_ir::{Expr, Name, Param, Type};
use scilla_value::errors::parameter_mismatch;
use scilla_value::{Env, EvalResult, MismatchReason, Outcome, Value};

use crate::adt::AdtRegistry;
use crate::builtins::{BuiltinRegistry, StdBuiltins};
use crate::cost_model::{CostModel, StdCostModel};
use crate::environment::{EnvArena, FrozenEnv};
use crate::gas::GasMeter;
use crate::interpreter::{Interpreter, Services};
use crate::options::EvalOptions;
use crate::oracle::{PendingDynamicCheck, StdTypeOracle, TypeOracle};

pub use dispatch::MessageResult;
pub use init::InitResult;

/// State of a deployed contract between messages.
#[derive(Clone, Debug)]
pub struct ContractState {
    /// Library and contract parameter bindings, inside `frames`.
    pub env: Env,
    pub frames: FrozenEnv,
    /// Declared fields with their types.
    pub fields: Vec<(Name, Type)>,
    pub balance: u128,
    pub adts: Rc<AdtRegistry>,
}

/// Evaluation engine for contract modules.
pub struct Runtime {
    builtins: Box<dyn BuiltinRegistry>,
    costs: Box<dyn CostModel>,
    oracle: Box<dyn TypeOracle>,
    options: EvalOptions,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::builder().build()
    }
}

impl Runtime {
    /// A runtime with the standard collaborators and default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub(crate) fn services(&self) -> Services<'_> {
        Services {
            builtins: self.builtins.as_ref(),
            costs: self.costs.as_ref(),
            oracle: self.oracle.as_ref(),
            options: &self.options,
        }
    }

    fn interpreter(&self, adts: Rc<AdtRegistry>, arena: EnvArena, gas_limit: u64) -> Interpreter<'_> {
        Interpreter::new(self.services(), adts, arena, GasMeter::new(gas_limit))
    }

    /// Evaluate a standalone expression over `bindings`.
    pub fn eval_expr(&self, bindings: &[(Name, Value)], expr: &Expr, gas_limit: u64) -> Outcome<Value> {
        let mut interp = self.interpreter(
            Rc::new(AdtRegistry::with_builtins()),
            EnvArena::new(),
            gas_limit,
        );
        let env = interp.arena_mut().bind_all(Env::EMPTY, bindings.iter().cloned());
        let result = interp.eval(env, expr);
        Outcome::new(result, interp.remaining_gas())
    }

    /// Check `args` against `params` and assert each argument's type.
    ///
    /// Returns the argument values in parameter order and the dynamic
    /// checks the oracle deferred. Arguments named in `trusted` are bound
    /// without consulting the oracle.
    fn check_arguments(
        &self,
        params: &[Param],
        args: &[(Name, Value)],
        trusted: &[&str],
    ) -> EvalResult<(Vec<Value>, Vec<PendingDynamicCheck>)> {
        let values = match_arguments(params, args)?;
        let mut pending = Vec::new();
        for (param, value) in params.iter().zip(&values) {
            if trusted.contains(&param.name.as_str()) {
                continue;
            }
            pending.extend(self.oracle.assert_literal_type(&param.name, &param.ty, value)?);
        }
        Ok((values, pending))
    }
}

/// Pair every parameter with exactly one argument of the same name.
///
/// Duplicates are reported before unexpected arguments, and those before
/// missing ones.
pub fn match_arguments(params: &[Param], args: &[(Name, Value)]) -> EvalResult<Vec<Value>> {
    for (i, (name, _)) in args.iter().enumerate() {
        if args[..i].iter().any(|(n, _)| n == name) {
            return Err(parameter_mismatch(name, MismatchReason::Duplicate));
        }
    }
    if let Some((name, _)) = args
        .iter()
        .find(|(name, _)| !params.iter().any(|p| p.name == *name))
    {
        return Err(parameter_mismatch(name, MismatchReason::Unexpected));
    }
    params
        .iter()
        .map(|p| {
            args.iter()
                .find(|(name, _)| *name == p.name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| parameter_mismatch(&p.name, MismatchReason::Missing))
        })
        .collect()
}

/// Builder for [`Runtime`]. Unset collaborators get the standard ones.
#[derive(Default)]
pub struct RuntimeBuilder {
    builtins: Option<Box<dyn BuiltinRegistry>>,
    costs: Option<Box<dyn CostModel>>,
    oracle: Option<Box<dyn TypeOracle>>,
    options: EvalOptions,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builtins(mut self, builtins: impl BuiltinRegistry + 'static) -> Self {
        self.builtins = Some(Box::new(builtins));
        self
    }

    #[must_use]
    pub fn cost_model(mut self, costs: impl CostModel + 'static) -> Self {
        self.costs = Some(Box::new(costs));
        self
    }

    #[must_use]
    pub fn type_oracle(mut self, oracle: impl TypeOracle + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    #[must_use]
    pub fn options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Runtime {
        Runtime {
            builtins: self
                .builtins
                .unwrap_or_else(|| Box::new(StdBuiltins::new())),
            costs: self.costs.unwrap_or_else(|| Box::new(StdCostModel)),
            oracle: self.oracle.unwrap_or_else(|| Box::new(StdTypeOracle)),
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use scilla_ir::Literal;
    use scilla_value::EvalErrorKind;

    fn params() -> Vec<Param> {
        vec![Param::new("a", Type::uint32()), Param::new("b", Type::string())]
    }

    fn arg(name: &str, value: Value) -> (Name, Value) {
        (Name::new(name), value)
    }

    #[test]
    fn arguments_come_back_in_parameter_order() {
        let args = vec![arg("b", Value::string("x")), arg("a", Value::uint32(1))];
        let values = match_arguments(&params(), &args).unwrap();
        assert_eq!(values, vec![Value::uint32(1), Value::string("x")]);
    }

    #[test]
    fn argument_mismatches_are_classified() {
        let reason = |args: Vec<(Name, Value)>| match match_arguments(&params(), &args)
            .unwrap_err()
            .kind
        {
            EvalErrorKind::ParameterArgumentMismatch { name, reason } => (name, reason),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            reason(vec![arg("a", Value::uint32(1))]),
            ("b".to_string(), MismatchReason::Missing)
        );
        assert_eq!(
            reason(vec![
                arg("a", Value::uint32(1)),
                arg("b", Value::string("x")),
                arg("c", Value::uint32(2)),
            ]),
            ("c".to_string(), MismatchReason::Unexpected)
        );
        assert_eq!(
            reason(vec![
                arg("a", Value::uint32(1)),
                arg("a", Value::uint32(2)),
                arg("c", Value::uint32(2)),
            ]),
            ("a".to_string(), MismatchReason::Duplicate)
        );
    }

    #[test]
    fn trusted_arguments_skip_the_oracle() {
        let rt = Runtime::new();
        let params = vec![Param::new("_sender", Type::bystr20())];
        let args = vec![arg("_sender", Value::uint32(0))];
        assert!(rt.check_arguments(&params, &args, &["_sender"]).is_ok());
        let err = rt.check_arguments(&params, &args, &[]).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::TypeAssignability { .. }));
    }

    #[test]
    fn standalone_expressions_report_gas() {
        let rt = Runtime::builder()
            .options(EvalOptions::default().with_max_call_depth(8))
            .build();
        assert_eq!(rt.options().max_call_depth, 8);

        let expr = Expr::builtin("add", &["x", "x"]);
        let out = rt.eval_expr(&[arg("x", Value::uint32(2))], &expr, 100);
        let (result, gas) = out.into_parts();
        assert_eq!(result.unwrap(), Value::uint32(4));
        assert!(gas < 100);

        let out = rt.eval_expr(&[], &Expr::lit(Literal::uint32(1)), 0);
        assert!(out.is_ok());
        assert_eq!(out.remaining_gas, 0);
    }
}
