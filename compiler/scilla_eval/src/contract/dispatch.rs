//! Message dispatch.

use std::rc::Rc;

use scilla_ir::labels::{AMOUNT, ORIGIN, SENDER, TAG};
use scilla_ir::{Component, ComponentKind, ContractModule, Name, Type};
use scilla_value::errors::{
    insufficient_balance, integer_overflow, malformed_message, no_matching_transition,
    type_assignability,
};
use scilla_value::{EvalNote, EvalResult, IntValue, Outcome, Value};
use tracing::debug;

use super::{ContractState, Runtime};
use crate::blockchain::BlockchainState;
use crate::environment::EnvArena;
use crate::exec::Configuration;
use crate::interpreter::Interpreter;
use crate::oracle::PendingDynamicCheck;
use crate::storage::StateStore;

/// What one successful message run produced.
#[derive(Clone, Debug)]
pub struct MessageResult {
    /// The contract state with the new balance.
    pub state: ContractState,
    /// Outgoing messages in send order.
    pub emitted: Vec<Value>,
    pub events: Vec<Value>,
    pub accepted: bool,
    pub pending_checks: Vec<PendingDynamicCheck>,
}

impl Runtime {
    /// Run the transition named by the message's `_tag`.
    ///
    /// `message` holds the tag, the implicit `_sender`, `_origin` and
    /// `_amount` entries and the transition arguments. A missing `_origin`
    /// defaults to `_sender`. On failure nothing in `state` changes, but
    /// field writes already made through `store` are not rolled back.
    #[tracing::instrument(level = "debug", skip_all, fields(contract = %module.contract.name))]
    pub fn handle_message(
        &self,
        module: &ContractModule,
        state: &ContractState,
        message: &[(Name, Value)],
        blockchain: &BlockchainState,
        store: &mut dyn StateStore,
        gas_limit: u64,
    ) -> Outcome<MessageResult> {
        let mut interp = self.interpreter(
            Rc::clone(&state.adts),
            EnvArena::over(&state.frames),
            gas_limit,
        );
        let result = self.run_message(&mut interp, module, state, message, blockchain, store);
        Outcome::new(result, interp.remaining_gas())
    }

    fn run_message(
        &self,
        interp: &mut Interpreter<'_>,
        module: &ContractModule,
        state: &ContractState,
        message: &[(Name, Value)],
        blockchain: &BlockchainState,
        store: &mut dyn StateStore,
    ) -> EvalResult<MessageResult> {
        let Some((_, Value::Str(tag))) = message.iter().find(|(name, _)| name == TAG) else {
            return Err(malformed_message(TAG));
        };
        let (transition, procedures) = select_transition(module, tag)?;
        debug!(
            transition = %transition.name,
            procedures = procedures.len(),
            "transition selected"
        );

        let mut entries: Vec<(Name, Value)> = message
            .iter()
            .filter(|(name, _)| name != TAG)
            .cloned()
            .collect();
        if !entries.iter().any(|(name, _)| name == ORIGIN) {
            if let Some((_, sender)) = entries.iter().find(|(name, _)| name == SENDER) {
                let sender = sender.clone();
                entries.push((Name::new(ORIGIN), sender));
            }
        }

        let params = transition.params_with_implicit();
        let (values, pending_checks) = self.check_arguments(&params, &entries, &[SENDER, ORIGIN])?;
        let incoming_funds = params
            .iter()
            .zip(&values)
            .find(|(p, _)| p.name == AMOUNT)
            .map_or(Ok(0), |(_, v)| to_amount(v))?;
        let env = interp
            .arena_mut()
            .bind_all(state.env, params.iter().map(|p| p.name.clone()).zip(values));

        let mut conf = Configuration::new(state.env, &state.fields, state.balance, blockchain, store);
        conf.env = env;
        conf.incoming_funds = incoming_funds;
        conf.procedures = procedures;
        conf.component_stack.push(transition.name.clone(), None);
        interp.exec_stmts(&mut conf, &transition.body)?;
        conf.component_stack.pop();

        let Configuration {
            balance,
            accepted,
            emitted,
            events,
            ..
        } = conf;
        let sent = emitted.iter().try_fold(0u128, |acc, msg| {
            let amount = msg
                .as_msg()
                .and_then(|m| m.get(AMOUNT))
                .ok_or_else(|| malformed_message(AMOUNT))?;
            acc.checked_add(to_amount(amount)?)
                .ok_or_else(|| integer_overflow("send"))
        })?;
        if sent > balance {
            let note = EvalNote::new(format!("{} outgoing message(s)", emitted.len()));
            return Err(insufficient_balance(sent, balance).with_note(note));
        }

        Ok(MessageResult {
            state: ContractState {
                balance: balance - sent,
                ..state.clone()
            },
            emitted,
            events,
            accepted,
            pending_checks,
        })
    }
}

/// The transition named `tag` and the procedures declared before it.
fn select_transition(
    module: &ContractModule,
    tag: &str,
) -> EvalResult<(Rc<Component>, Vec<Rc<Component>>)> {
    let components = &module.contract.components;
    let idx = components
        .iter()
        .position(|c| c.kind == ComponentKind::Transition && c.name == tag)
        .ok_or_else(|| no_matching_transition(tag))?;
    let procedures = components[..idx]
        .iter()
        .filter(|c| c.kind == ComponentKind::Procedure)
        .cloned()
        .collect();
    Ok((Rc::clone(&components[idx]), procedures))
}

fn to_amount(value: &Value) -> EvalResult<u128> {
    value
        .as_int()
        .and_then(IntValue::to_u128)
        .ok_or_else(|| type_assignability(AMOUNT, Type::uint128(), value.kind_name()))
}
