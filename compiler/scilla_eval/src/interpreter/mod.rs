//! Gas-metered big-step evaluator for expressions.
//!
//! # Architecture
//!
//! `Interpreter::eval` is structurally recursive over [`Expr`]. All state
//! lives in the interpreter value:
//!
//! - `arena`: the environment frames; an environment is an `Env` handle
//! - `gas`: the remaining gas, charged at `GasExpr` nodes, builtin calls and
//!   library entries
//! - `depth`: nesting of closure applications, type applications and
//!   procedure calls, bounded by `EvalOptions::max_call_depth`
//!
//! Errors carry the span of the innermost failing expression. The gas left
//! at the point of failure stays readable through
//! [`remaining_gas`](Interpreter::remaining_gas), which is how the contract
//! entry points report it alongside every result.
//!
//! The statement evaluator (`crate::exec`) extends the same interpreter.

mod pattern;

pub(crate) use pattern::first_match;

use std::rc::Rc;

use scilla_ir::{Expr, ExprKind, GasCharge, Literal, Name, Payload, Type};
use scilla_value::errors::{
    arity_mismatch, builtin_failure, call_depth_exceeded, impure_value, integer_overflow,
    no_matching_clause, not_a_function, not_a_type_function, unknown_constructor,
};
use scilla_value::{Closure, Env, EvalResult, MapValue, MsgEntry, TypeClosure, Value};
use smallvec::SmallVec;

use crate::adt::AdtRegistry;
use crate::builtins::BuiltinRegistry;
use crate::cost_model::CostModel;
use crate::environment::EnvArena;
use crate::gas::{resolve_charge, GasMeter};
use crate::options::EvalOptions;
use crate::oracle::TypeOracle;
use crate::stack::ensure_sufficient_stack;

/// Collaborators shared by every evaluation of a runtime.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub builtins: &'a dyn BuiltinRegistry,
    pub costs: &'a dyn CostModel,
    pub oracle: &'a dyn TypeOracle,
    pub options: &'a EvalOptions,
}

/// Expression and statement evaluator for one run.
pub struct Interpreter<'a> {
    pub(crate) services: Services<'a>,
    pub(crate) adts: Rc<AdtRegistry>,
    pub(crate) arena: EnvArena,
    pub(crate) gas: GasMeter,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(services: Services<'a>, adts: Rc<AdtRegistry>, arena: EnvArena, gas: GasMeter) -> Self {
        Interpreter {
            services,
            adts,
            arena,
            gas,
            depth: 0,
        }
    }

    #[inline]
    pub fn remaining_gas(&self) -> u64 {
        self.gas.remaining()
    }

    pub fn arena(&self) -> &EnvArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut EnvArena {
        &mut self.arena
    }

    /// Evaluate `expr` in `env`.
    pub fn eval(&mut self, env: Env, expr: &Expr) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(env, expr)).map_err(|e| e.with_span(expr.span))
    }

    fn eval_inner(&mut self, env: Env, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Literal(lit) => self.eval_literal(env, lit),
            ExprKind::Var(x) => self.arena.lookup(env, x),
            ExprKind::Let { name, rhs, body, .. } => {
                let value = self.eval(env, rhs)?;
                let env = self.arena.bind(env, name.clone(), value);
                self.eval(env, body)
            }
            ExprKind::Message(entries) => self.eval_message(env, entries),
            ExprKind::Fun {
                param,
                param_ty,
                body,
            } => Ok(Value::Closure(Rc::new(Closure {
                param: param.clone(),
                param_ty: self.arena.resolve_type(env, param_ty),
                body: Rc::clone(body),
                env,
            }))),
            ExprKind::App { func, args } => {
                let mut f = self.arena.lookup(env, func)?;
                for arg in args {
                    let arg = self.arena.lookup(env, arg)?;
                    f = self.apply(&f, arg)?;
                }
                Ok(f)
            }
            ExprKind::Constr { name, targs, args } => self.eval_constr(env, name, targs, args),
            ExprKind::MatchExpr { scrutinee, clauses } => {
                let value = self.arena.lookup(env, scrutinee)?;
                let (i, binds) = first_match(clauses.iter().map(|c| &c.pattern), &value)
                    .ok_or_else(|| no_matching_clause(scrutinee))?;
                let env = self.arena.bind_all(env, binds);
                self.eval(env, &clauses[i].body)
            }
            ExprKind::Builtin { op, targs, args } => self.eval_builtin(env, op, targs, args),
            ExprKind::TFun { tvar, body } => Ok(Value::TypeClosure(Rc::new(TypeClosure {
                tvar: tvar.clone(),
                body: Rc::clone(body),
                env,
            }))),
            ExprKind::TApp { func, targs } => {
                let mut f = self.arena.lookup(env, func)?;
                for ty in targs {
                    let ty = self.arena.resolve_type(env, ty);
                    f = self.type_apply(&f, ty)?;
                }
                Ok(f)
            }
            ExprKind::Fixpoint { name, body, .. } => {
                // The placeholder is patched once the body is a value, so the
                // closure finds itself through its own environment.
                let rec_env = self.arena.bind_pending(env, name.clone());
                let value = self.eval(rec_env, body)?;
                self.arena.set(rec_env, value.clone());
                Ok(value)
            }
            ExprKind::GasExpr { charge, body } => {
                self.charge(env, charge)?;
                self.eval(env, body)
            }
        }
    }

    fn eval_literal(&self, env: Env, lit: &Literal) -> EvalResult {
        if let Literal::EmptyMap { key, value } = lit {
            let key = self.arena.resolve_type(env, key).erase_addresses();
            let value = self.arena.resolve_type(env, value).erase_addresses();
            return Ok(Value::Map(MapValue::empty(key, value)));
        }
        Value::from_literal(lit).ok_or_else(|| integer_overflow("literal"))
    }

    fn eval_message(&self, env: Env, entries: &[(Name, Payload)]) -> EvalResult {
        let mut out = Vec::with_capacity(entries.len());
        for (name, payload) in entries {
            let value = match payload {
                Payload::Lit(lit) => self.eval_literal(env, lit)?,
                Payload::Var(x) => self.arena.lookup(env, x)?,
            };
            let ty = value
                .type_of()
                .filter(|_| value.is_sendable())
                .ok_or_else(|| impure_value(format!("message entry {name}")))?;
            out.push(MsgEntry {
                name: name.clone(),
                ty,
                value,
            });
        }
        Ok(Value::msg(out))
    }

    fn eval_constr(&self, env: Env, name: &Name, targs: &[Type], args: &[Name]) -> EvalResult {
        let info = self
            .adts
            .constructor(name)
            .ok_or_else(|| unknown_constructor(name))?;
        if info.arity != args.len() {
            return Err(arity_mismatch(name, info.arity, args.len()));
        }
        let targs = targs
            .iter()
            .map(|t| self.arena.resolve_type(env, t).erase_addresses())
            .collect();
        let args = args
            .iter()
            .map(|a| self.arena.lookup(env, a))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Value::adt(&info.type_name, name, targs, args))
    }

    fn eval_builtin(&mut self, env: Env, op: &Name, targs: &[Type], args: &[Name]) -> EvalResult {
        let values: SmallVec<[Value; 3]> = args
            .iter()
            .map(|a| self.arena.lookup(env, a))
            .collect::<EvalResult<_>>()?;
        let arg_types: SmallVec<[Type; 3]> = values
            .iter()
            .map(|v| {
                v.type_of()
                    .ok_or_else(|| builtin_failure(op, format!("cannot take a {}", v.kind_name())))
            })
            .collect::<EvalResult<_>>()?;
        let targs: Vec<Type> = targs
            .iter()
            .map(|t| self.arena.resolve_type(env, t))
            .collect();

        let (ret, f) = self.services.builtins.find_op(op, &targs, &arg_types)?;
        let cost = self
            .services
            .costs
            .builtin_cost(op, &targs, &arg_types, args)?;
        self.charge(env, &cost)?;
        f(&targs, &values, &ret)
    }

    /// Apply a closure to one argument.
    pub fn apply(&mut self, func: &Value, arg: Value) -> EvalResult {
        let Value::Closure(closure) = func else {
            return Err(not_a_function(func));
        };
        self.enter()?;
        let env = self.arena.bind(closure.env, closure.param.clone(), arg);
        let result = self.eval(env, &closure.body);
        self.leave();
        result
    }

    /// Instantiate a type closure at `ty`.
    pub fn type_apply(&mut self, func: &Value, ty: Type) -> EvalResult {
        let Value::TypeClosure(tclosure) = func else {
            return Err(not_a_type_function(func));
        };
        self.enter()?;
        let env = self.arena.bind_type(tclosure.env, tclosure.tvar.clone(), ty);
        let result = self.eval(env, &tclosure.body);
        self.leave();
        result
    }

    /// Resolve `charge` in `env` and deduct it.
    pub fn charge(&mut self, env: Env, charge: &GasCharge) -> EvalResult<()> {
        let arena = &self.arena;
        let amount = resolve_charge(
            charge,
            &|name: &Name| arena.lookup(env, name),
            self.services.costs,
        )?;
        self.gas.charge(amount)
    }

    pub(crate) fn enter(&mut self) -> EvalResult<()> {
        let limit = self.services.options.max_call_depth;
        if self.depth >= limit {
            return Err(call_depth_exceeded(limit));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        debug_assert!(self.depth > 0, "Interpreter::leave() without enter()");
        self.depth = self.depth.saturating_sub(1);
    }
}
