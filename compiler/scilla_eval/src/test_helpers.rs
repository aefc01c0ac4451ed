//! Shorthands shared by the unit tests.

use std::rc::Rc;

use scilla_ir::{Expr, Literal, Type};

use crate::adt::AdtRegistry;
use crate::builtins::StdBuiltins;
use crate::cost_model::StdCostModel;
use crate::environment::EnvArena;
use crate::gas::GasMeter;
use crate::interpreter::{Interpreter, Services};
use crate::options::EvalOptions;
use crate::oracle::StdTypeOracle;

/// Standard collaborators, owned so interpreters can borrow them.
pub(crate) struct Harness {
    builtins: StdBuiltins,
    costs: StdCostModel,
    oracle: StdTypeOracle,
    options: EvalOptions,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_options(EvalOptions::default())
    }

    pub(crate) fn with_options(options: EvalOptions) -> Self {
        Harness {
            builtins: StdBuiltins::new(),
            costs: StdCostModel,
            oracle: StdTypeOracle,
            options,
        }
    }

    pub(crate) fn services(&self) -> Services<'_> {
        Services {
            builtins: &self.builtins,
            costs: &self.costs,
            oracle: &self.oracle,
            options: &self.options,
        }
    }

    pub(crate) fn interpreter(&self, gas: u64) -> Interpreter<'_> {
        Interpreter::new(
            self.services(),
            Rc::new(AdtRegistry::with_builtins()),
            EnvArena::new(),
            GasMeter::new(gas),
        )
    }
}

pub(crate) fn u32_lit(n: u32) -> Expr {
    Expr::lit(Literal::uint32(n))
}

pub(crate) fn tvar(name: &str) -> Type {
    Type::TypeVar(name.into())
}

/// `let x = e in body` chains, innermost last.
pub(crate) fn lets(bindings: Vec<(&str, Expr)>, body: Expr) -> Expr {
    bindings
        .into_iter()
        .rev()
        .fold(body, |body, (x, rhs)| Expr::let_in(x, rhs, body))
}
