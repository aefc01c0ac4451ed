//! Statement evaluation over a mutable configuration.
//!
//! A [`Configuration`] is built by the dispatcher for one message, threaded
//! by `&mut` through every statement of the transition and the procedures it
//! calls, and dropped once the outcome has been assembled.

mod stmt;

use std::rc::Rc;

use scilla_ir::{Component, Name, Type};
use scilla_value::errors::unknown_field;
use scilla_value::{Env, EvalResult, Value};

use crate::blockchain::BlockchainState;
use crate::call_stack::ComponentStack;
use crate::storage::StateStore;

/// Evaluation context of one message run.
pub struct Configuration<'c> {
    /// Library and contract parameter bindings. Procedures run over this.
    pub init_env: Env,
    /// Current bindings, extended statement by statement.
    pub env: Env,
    /// Declared fields. Values live in `store`.
    pub fields: &'c [(Name, Type)],
    pub balance: u128,
    pub accepted: bool,
    pub incoming_funds: u128,
    pub blockchain: &'c BlockchainState,
    /// Procedures visible to the running component.
    pub procedures: Vec<Rc<Component>>,
    pub component_stack: ComponentStack,
    pub emitted: Vec<Value>,
    pub events: Vec<Value>,
    pub store: &'c mut dyn StateStore,
}

impl<'c> Configuration<'c> {
    pub fn new(
        init_env: Env,
        fields: &'c [(Name, Type)],
        balance: u128,
        blockchain: &'c BlockchainState,
        store: &'c mut dyn StateStore,
    ) -> Self {
        Configuration {
            init_env,
            env: init_env,
            fields,
            balance,
            accepted: false,
            incoming_funds: 0,
            blockchain,
            procedures: Vec::new(),
            component_stack: ComponentStack::new(),
            emitted: Vec::new(),
            events: Vec::new(),
            store,
        }
    }

    fn check_field(&self, field: &str) -> EvalResult<()> {
        if self.fields.iter().any(|(name, _)| name == field) {
            Ok(())
        } else {
            Err(unknown_field(field))
        }
    }
}
