//! Contract initialization.

use std::rc::Rc;

use scilla_ir::{ContractModule, LibEntry, Library, Name};
use scilla_value::errors::{constraint_violation, impure_value};
use scilla_value::{Env, EvalResult, Outcome, Value};
use tracing::debug;

use super::{ContractState, Runtime};
use crate::adt::AdtRegistry;
use crate::environment::EnvArena;
use crate::interpreter::Interpreter;
use crate::oracle::PendingDynamicCheck;
use crate::storage::StateStore;

/// A freshly deployed contract.
#[derive(Clone, Debug)]
pub struct InitResult {
    pub state: ContractState,
    /// Address checks the harness must run before accepting the deployment.
    pub pending_checks: Vec<PendingDynamicCheck>,
}

impl Runtime {
    /// Deploy `module` with init arguments `args`.
    ///
    /// Evaluates the imported libraries and then the contract library, binds
    /// the contract parameters (declared and implicit), checks the contract
    /// constraint and writes every field's initial value to `store`.
    #[tracing::instrument(level = "debug", skip_all, fields(contract = %module.contract.name))]
    pub fn init_contract(
        &self,
        module: &ContractModule,
        args: &[(Name, Value)],
        balance: u128,
        store: &mut dyn StateStore,
        gas_limit: u64,
    ) -> Outcome<InitResult> {
        let mut interp = self.interpreter(
            Rc::new(AdtRegistry::with_builtins()),
            EnvArena::new(),
            gas_limit,
        );
        let result = self.run_init(&mut interp, module, args, balance, store);
        Outcome::new(result, interp.remaining_gas())
    }

    fn run_init(
        &self,
        interp: &mut Interpreter<'_>,
        module: &ContractModule,
        args: &[(Name, Value)],
        balance: u128,
        store: &mut dyn StateStore,
    ) -> EvalResult<InitResult> {
        let mut env = Env::EMPTY;
        for lib in module.imports.iter().chain(&module.library) {
            env = init_library(interp, env, lib)?;
        }

        let contract = &module.contract;
        let params = contract.params_with_implicit();
        let (values, pending_checks) = self.check_arguments(&params, args, &[])?;
        env = interp
            .arena_mut()
            .bind_all(env, params.iter().map(|p| p.name.clone()).zip(values));

        if let Some(constraint) = &contract.constraint {
            let holds = interp.eval(env, constraint)?;
            if holds.as_bool() != Some(true) {
                return Err(constraint_violation().with_span(constraint.span));
            }
        }

        let mut fields = Vec::with_capacity(contract.fields.len());
        for field in &contract.fields {
            let value = interp.eval(env, &field.init)?;
            if !value.is_pure() {
                return Err(
                    impure_value(format!("field {}", field.name)).with_span(field.init.span)
                );
            }
            store.store(&field.name, value)?;
            fields.push((field.name.clone(), field.ty.clone()));
        }

        debug!(
            fields = fields.len(),
            pending = pending_checks.len(),
            "contract initialized"
        );
        let frames = std::mem::take(interp.arena_mut()).freeze();
        Ok(InitResult {
            state: ContractState {
                env,
                frames,
                fields,
                balance,
                adts: Rc::clone(&interp.adts),
            },
            pending_checks,
        })
    }
}

/// Register the library's datatypes and bind its values in order.
fn init_library(interp: &mut Interpreter<'_>, mut env: Env, lib: &Library) -> EvalResult<Env> {
    for entry in &lib.entries {
        match entry {
            LibEntry::Type {
                name,
                tparams,
                constructors,
            } => {
                Rc::make_mut(&mut interp.adts).register(
                    name.clone(),
                    tparams.clone(),
                    constructors.clone(),
                );
            }
            LibEntry::Var { name, expr, .. } => {
                let value = interp.eval(env, expr)?;
                let cost = interp.services.costs.lib_entry_cost(&value)?;
                interp.gas.charge(cost)?;
                env = interp.arena_mut().bind(env, name.clone(), value);
            }
        }
    }
    Ok(env)
}
