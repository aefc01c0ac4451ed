//! Statement semantics.

use std::rc::Rc;

use scilla_ir::labels::{AMOUNT, BALANCE, EVENTNAME, EXCEPTION, ORIGIN, RECIPIENT, SENDER, TAG};
use scilla_ir::{BlockchainQuery, Name, Span, Stmt, StmtKind, Type, ADDRESS_WIDTH};
use scilla_value::errors::{
    impure_value, integer_overflow, invalid_remote_address, malformed_message, no_matching_clause,
    non_collection, parameter_mismatch, type_assignability, unknown_field, unknown_procedure,
    user_thrown,
};
use scilla_value::{EvalResult, MismatchReason, Value};
use tracing::debug;

use super::Configuration;
use crate::interpreter::{first_match, Interpreter};
use crate::stack::ensure_sufficient_stack;

impl Interpreter<'_> {
    /// Run `stmts` in order, stopping at the first failure.
    ///
    /// A failing statement's error gets the statement's span (unless an
    /// inner expression already set one) and the current component trail.
    pub fn exec_stmts(&mut self, conf: &mut Configuration<'_>, stmts: &[Stmt]) -> EvalResult<()> {
        for stmt in stmts {
            ensure_sufficient_stack(|| self.exec_stmt(conf, stmt))
                .map_err(|e| conf.component_stack.attach_backtrace(e.with_span(stmt.span)))?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, conf: &mut Configuration<'_>, stmt: &Stmt) -> EvalResult<()> {
        match &stmt.kind {
            StmtKind::Load { x, field } => {
                let value = if field == BALANCE {
                    Value::uint128(conf.balance)
                } else {
                    conf.check_field(field)?;
                    conf.store.load(field)?
                };
                self.bind(conf, x, value);
            }
            StmtKind::RemoteLoad { x, addr, field } => {
                let address = self.address(conf, addr)?;
                let value = conf.store.remote_load(&address, field)?;
                self.bind(conf, x, value);
            }
            StmtKind::Store { field, value } => {
                if field == BALANCE {
                    return Err(unknown_field(field));
                }
                conf.check_field(field)?;
                let value = self.arena.lookup(conf.env, value)?;
                if !value.is_pure() {
                    return Err(impure_value(format!("field {field}")));
                }
                conf.store.store(field, value)?;
            }
            StmtKind::Bind { x, expr } => {
                let value = self.eval(conf.env, expr)?;
                self.bind(conf, x, value);
            }
            StmtKind::MapUpdate { map, keys, value } => {
                conf.check_field(map)?;
                let keys = self.lookup_all(conf, keys)?;
                let value = match value {
                    Some(v) => {
                        let v = self.arena.lookup(conf.env, v)?;
                        if !v.is_pure() {
                            return Err(impure_value(format!("field {map}")));
                        }
                        Some(v)
                    }
                    None => None,
                };
                conf.store.map_update(map, &keys, value)?;
            }
            StmtKind::MapGet {
                x,
                map,
                keys,
                fetch,
            } => {
                conf.check_field(map)?;
                let keys = self.lookup_all(conf, keys)?;
                let value = conf.store.map_get(map, &keys, *fetch)?;
                self.bind(conf, x, value);
            }
            StmtKind::RemoteMapGet {
                x,
                addr,
                map,
                keys,
                fetch,
            } => {
                let address = self.address(conf, addr)?;
                let keys = self.lookup_all(conf, keys)?;
                let value = conf.store.remote_map_get(&address, map, &keys, *fetch)?;
                self.bind(conf, x, value);
            }
            StmtKind::ReadFromBC { x, query } => {
                let value = self.read_blockchain(conf, query)?;
                self.bind(conf, x, value);
            }
            StmtKind::TypeCast { x, addr, ty } => {
                let value = self.type_cast(conf, addr, ty)?;
                self.bind(conf, x, value);
            }
            StmtKind::MatchStmt { scrutinee, clauses } => {
                let value = self.arena.lookup(conf.env, scrutinee)?;
                let (i, binds) = first_match(clauses.iter().map(|c| &c.pattern), &value)
                    .ok_or_else(|| no_matching_clause(scrutinee))?;
                let saved = conf.env;
                conf.env = self.arena.bind_all(conf.env, binds);
                let result = self.exec_stmts(conf, &clauses[i].body);
                conf.env = saved;
                result?;
            }
            StmtKind::AcceptPayment => {
                if !conf.accepted {
                    conf.balance = conf
                        .balance
                        .checked_add(conf.incoming_funds)
                        .ok_or_else(|| integer_overflow("accept"))?;
                    conf.accepted = true;
                    debug!(amount = conf.incoming_funds, balance = conf.balance, "payment accepted");
                }
            }
            StmtKind::SendMsgs(x) => {
                let value = self.arena.lookup(conf.env, x)?;
                let msgs = value
                    .as_list()
                    .ok_or_else(|| non_collection("send", &value))?;
                for msg in &msgs {
                    require_entries(msg, &[TAG, RECIPIENT, AMOUNT])?;
                }
                debug!(count = msgs.len(), "messages sent");
                conf.emitted.extend(msgs);
            }
            StmtKind::CreateEvnt(x) => {
                let event = self.arena.lookup(conf.env, x)?;
                require_entries(&event, &[EVENTNAME])?;
                debug!(event = %event, "event emitted");
                conf.events.push(event);
            }
            StmtKind::CallProc { name, args } => {
                let args = self.lookup_all(conf, args)?;
                self.call_procedure(conf, name, args, stmt.span)?;
            }
            StmtKind::Iterate { list, proc } => {
                let value = self.arena.lookup(conf.env, list)?;
                let items = value
                    .as_list()
                    .ok_or_else(|| non_collection("forall", &value))?;
                for item in items {
                    self.call_procedure(conf, proc, vec![item], stmt.span)?;
                }
            }
            StmtKind::Throw(x) => {
                let payload = match x {
                    Some(x) => {
                        let value = self.arena.lookup(conf.env, x)?;
                        if value.as_msg().is_none() {
                            return Err(malformed_message(EXCEPTION));
                        }
                        Some(value)
                    }
                    None => None,
                };
                return Err(user_thrown(payload));
            }
            StmtKind::GasStmt(charge) => self.charge(conf.env, charge)?,
        }
        Ok(())
    }

    fn bind(&mut self, conf: &mut Configuration<'_>, x: &Name, value: Value) {
        conf.env = self.arena.bind(conf.env, x.clone(), value);
    }

    fn lookup_all(&self, conf: &Configuration<'_>, names: &[Name]) -> EvalResult<Vec<Value>> {
        names
            .iter()
            .map(|n| self.arena.lookup(conf.env, n))
            .collect()
    }

    /// Bytes of an address-valued variable, checked for width.
    fn address(&self, conf: &Configuration<'_>, addr: &Name) -> EvalResult<Vec<u8>> {
        let value = self.arena.lookup(conf.env, addr)?;
        let expected = ADDRESS_WIDTH as usize;
        match &value {
            Value::ByStrX(bytes) if bytes.len() == expected => Ok(bytes.to_vec()),
            Value::ByStrX(bytes) | Value::ByStr(bytes) => {
                Err(invalid_remote_address(expected, bytes.len()))
            }
            _ => Err(invalid_remote_address(expected, 0)),
        }
    }

    fn read_blockchain(&self, conf: &Configuration<'_>, query: &BlockchainQuery) -> EvalResult {
        Ok(match query {
            BlockchainQuery::CurBlockNum => Value::BNum(conf.blockchain.block_number.clone()),
            BlockchainQuery::ChainId => Value::uint32(conf.blockchain.chain_id),
            BlockchainQuery::Timestamp(block) => {
                let value = self.arena.lookup(conf.env, block)?;
                let Value::BNum(n) = &value else {
                    return Err(type_assignability(block, Type::bnum(), value.kind_name()));
                };
                match conf.blockchain.timestamp(n) {
                    Some(ts) => Value::some(Type::uint64(), Value::uint64(ts)),
                    None => Value::none(Type::uint64()),
                }
            }
        })
    }

    /// `Some addr` if the account at `addr` satisfies `ty`, else `None`.
    ///
    /// Anything that is not a full-width address cast to an address type is
    /// `None`.
    fn type_cast(&self, conf: &Configuration<'_>, addr: &Name, ty: &Type) -> EvalResult {
        let value = self.arena.lookup(conf.env, addr)?;
        let target = self.arena.resolve_type(conf.env, ty);
        let bystr20 = Type::bystr20();
        Ok(match (&target, value.as_bystrx()) {
            (Type::Address(at), Some(bytes))
                if bytes.len() == ADDRESS_WIDTH as usize
                    && self
                        .services
                        .oracle
                        .typecheck_remote_field_types(&*conf.store, bytes, at) =>
            {
                Value::some(bystr20, value.clone())
            }
            _ => Value::none(bystr20),
        })
    }

    /// Run procedure `name` with `args`.
    ///
    /// The body sees the module-level bindings, the caller's `_sender`,
    /// `_origin` and `_amount`, its own parameters, and only the procedures
    /// declared before it.
    #[tracing::instrument(level = "debug", skip_all, fields(procedure = %name))]
    fn call_procedure(
        &mut self,
        conf: &mut Configuration<'_>,
        name: &Name,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<()> {
        let idx = conf
            .procedures
            .iter()
            .position(|p| p.name == *name)
            .ok_or_else(|| unknown_procedure(name))?;
        let proc = Rc::clone(&conf.procedures[idx]);

        if let Some(missing) = proc.params.get(args.len()) {
            return Err(parameter_mismatch(&missing.name, MismatchReason::Missing));
        }
        if args.len() > proc.params.len() {
            let extra = format!("argument {}", proc.params.len() + 1);
            return Err(parameter_mismatch(&extra, MismatchReason::Unexpected));
        }

        let mut bindings = Vec::with_capacity(3 + args.len());
        for label in [SENDER, ORIGIN, AMOUNT] {
            bindings.push((Name::new(label), self.arena.lookup(conf.env, label)?));
        }
        bindings.extend(proc.params.iter().map(|p| p.name.clone()).zip(args));

        self.enter()?;
        let visible = conf.procedures[..idx].to_vec();
        let saved_procs = std::mem::replace(&mut conf.procedures, visible);
        let saved_env = conf.env;
        conf.env = self.arena.bind_all(conf.init_env, bindings);
        conf.component_stack.push(name.clone(), Some(span));

        let result = self.exec_stmts(conf, &proc.body);

        conf.component_stack.pop();
        conf.env = saved_env;
        conf.procedures = saved_procs;
        self.leave();
        result
    }
}

/// A message or event must be a message value carrying `labels`.
fn require_entries(value: &Value, labels: &[&str]) -> EvalResult<()> {
    let Some(msg) = value.as_msg() else {
        return Err(malformed_message(labels.first().copied().unwrap_or(TAG)));
    };
    match labels.iter().find(|l| !msg.contains(l)) {
        Some(missing) => Err(malformed_message(missing)),
        None => Ok(()),
    }
}
