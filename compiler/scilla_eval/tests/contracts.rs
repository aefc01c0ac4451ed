//! Contract deployment and message dispatch, end to end.

#![allow(clippy::unwrap_used)]

use std::rc::Rc;

use pretty_assertions::assert_eq;
use scilla_eval::{
    BlockchainState, ContractState, EvalErrorKind, InMemoryState, MessageResult, Outcome, Runtime,
    Value,
};
use scilla_ir::{
    Component, Contract, ContractModule, CtrDef, Expr, FieldDef, GasCharge, LibEntry, Library,
    Literal, Name, Param, Payload, Stmt, StmtKind, Type,
};
use scilla_value::MismatchReason;

const GAS: u64 = 10_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn addr(fill: u8) -> Value {
    Value::bystrx([fill; 20])
}

fn named(entries: Vec<(&str, Value)>) -> Vec<(Name, Value)> {
    entries
        .into_iter()
        .map(|(n, v)| (Name::new(n), v))
        .collect()
}

fn init_args() -> Vec<(Name, Value)> {
    named(vec![
        ("owner", addr(1)),
        ("_this_address", addr(9)),
        ("_creation_block", Value::bnum(1u64)),
        ("_scilla_version", Value::uint32(0)),
    ])
}

fn message(tag: &str, amount: u128, extra: Vec<(&str, Value)>) -> Vec<(Name, Value)> {
    let mut entries = named(vec![
        ("_tag", Value::string(tag)),
        ("_amount", Value::uint128(amount)),
        ("_sender", addr(2)),
    ]);
    entries.extend(named(extra));
    entries
}

fn accept() -> Stmt {
    Stmt::new(StmtKind::AcceptPayment)
}

fn var(x: &str) -> Payload {
    Payload::Var(Name::new(x))
}

fn components() -> Vec<Rc<Component>> {
    let bump = Component::procedure(
        "bump",
        vec![Param::new("v", Type::uint32())],
        vec![Stmt::store("counter", "v")],
    );
    let foo = Component::transition(
        "foo",
        vec![Param::new("x", Type::uint32())],
        vec![
            accept(),
            Stmt::bind(
                "e",
                Expr::message(vec![
                    ("_eventname", Payload::Lit(Literal::string("Foo"))),
                    ("x", var("x")),
                ]),
            ),
            Stmt::new(StmtKind::CreateEvnt(Name::new("e"))),
        ],
    );
    let pay = Component::transition(
        "pay",
        vec![
            Param::new("to", Type::bystr20()),
            Param::new("amt", Type::uint128()),
        ],
        vec![
            accept(),
            Stmt::bind(
                "m",
                Expr::message(vec![
                    ("_tag", Payload::Lit(Literal::string(""))),
                    ("_recipient", var("to")),
                    ("_amount", var("amt")),
                ]),
            ),
            Stmt::bind("nil", Expr::constr("Nil", vec![Type::msg()], &[])),
            Stmt::bind("ms", Expr::constr("Cons", vec![Type::msg()], &["m", "nil"])),
            Stmt::new(StmtKind::SendMsgs(Name::new("ms"))),
        ],
    );
    let set = Component::transition(
        "set",
        vec![Param::new("x", Type::uint32())],
        vec![Stmt::call("bump", &["x"])],
    );
    let accept_twice = Component::transition("accept_twice", vec![], vec![accept(), accept()]);
    let calls_late = Component::transition("calls_late", vec![], vec![Stmt::call("late", &[])]);
    let late = Component::procedure("late", vec![], vec![]);
    let broken_pair = Component::transition(
        "broken_pair",
        vec![Param::new("x", Type::uint32())],
        vec![Stmt::bind(
            "p",
            Expr::constr("Pair", vec![Type::uint32(), Type::uint32()], &["x"]),
        )],
    );
    let expensive = Component::transition(
        "expensive",
        vec![],
        vec![
            Stmt::new(StmtKind::GasStmt(GasCharge::StaticCost(GAS + 1))),
            accept(),
        ],
    );
    [
        bump,
        foo,
        pay,
        set,
        accept_twice,
        calls_late,
        late,
        broken_pair,
        expensive,
    ]
    .into_iter()
    .map(Rc::new)
    .collect()
}

fn module() -> ContractModule {
    let library = Library {
        name: Name::new("WalletLib"),
        entries: vec![
            LibEntry::Var {
                name: Name::new("zero"),
                ty: Some(Type::uint128()),
                expr: Expr::lit(Literal::uint128(0)),
            },
            LibEntry::Type {
                name: Name::new("Color"),
                tparams: vec![],
                constructors: vec![
                    CtrDef {
                        name: Name::new("Red"),
                        arg_types: vec![],
                    },
                    CtrDef {
                        name: Name::new("Green"),
                        arg_types: vec![],
                    },
                ],
            },
        ],
    };
    ContractModule {
        scilla_version: 0,
        imports: vec![],
        library: Some(library),
        contract: Contract {
            name: Name::new("Wallet"),
            params: vec![Param::new("owner", Type::bystr20())],
            constraint: None,
            fields: vec![
                FieldDef {
                    name: Name::new("counter"),
                    ty: Type::uint32(),
                    init: Expr::lit(Literal::uint32(0)),
                },
                FieldDef {
                    name: Name::new("total"),
                    ty: Type::uint128(),
                    init: Expr::var("zero"),
                },
                FieldDef {
                    name: Name::new("color"),
                    ty: Type::Adt(Name::new("Color"), vec![]),
                    init: Expr::constr("Red", vec![], &[]),
                },
            ],
            components: components(),
        },
    }
}

fn deploy(module: &ContractModule, balance: u128) -> (ContractState, InMemoryState) {
    init_tracing();
    let mut store = InMemoryState::new();
    let out = Runtime::new().init_contract(module, &init_args(), balance, &mut store, GAS);
    (out.result.unwrap().state, store)
}

fn send(
    module: &ContractModule,
    state: &ContractState,
    store: &mut InMemoryState,
    msg: &[(Name, Value)],
) -> Outcome<MessageResult> {
    let chain = BlockchainState::new(10u64, 1);
    Runtime::new().handle_message(module, state, msg, &chain, store, GAS)
}

#[test]
fn deployment_evaluates_library_and_fields() {
    init_tracing();
    let module = module();
    let mut store = InMemoryState::new();
    let out = Runtime::new().init_contract(&module, &init_args(), 100, &mut store, GAS);
    // one Uint128 library value
    assert_eq!(out.remaining_gas, GAS - 16);
    let init = out.result.unwrap();
    assert!(init.pending_checks.is_empty());
    assert_eq!(init.state.balance, 100);
    assert_eq!(init.state.fields.len(), 3);
    assert_eq!(store.field("total"), Some(&Value::uint128(0)));
    assert_eq!(
        store.field("color"),
        Some(&Value::adt("Color", "Red", vec![], vec![]))
    );
}

#[test]
fn library_values_need_gas() {
    let module = module();
    let mut store = InMemoryState::new();
    let out = Runtime::new().init_contract(&module, &init_args(), 100, &mut store, 10);
    assert!(out.is_out_of_gas());
    assert_eq!(out.remaining_gas, 10);
}

#[test]
fn address_parameters_defer_a_check() {
    let mut module = module();
    module.contract.params = vec![Param::new("wallet", Type::address())];
    let mut args = init_args();
    args[0] = (Name::new("wallet"), addr(5));
    let mut store = InMemoryState::new();
    let init = Runtime::new()
        .init_contract(&module, &args, 0, &mut store, GAS)
        .result
        .unwrap();
    assert_eq!(init.pending_checks.len(), 1);
    assert_eq!(init.pending_checks[0].name, "wallet");
    assert_eq!(init.pending_checks[0].address, vec![5; 20]);
}

#[test]
fn init_arguments_must_match_parameters() {
    let module = module();
    let mut store = InMemoryState::new();
    let args = init_args()[1..].to_vec();
    let err = Runtime::new()
        .init_contract(&module, &args, 0, &mut store, GAS)
        .result
        .unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::ParameterArgumentMismatch {
            name: "owner".to_string(),
            reason: MismatchReason::Missing,
        }
    );

    let mut args = init_args();
    args[0].1 = Value::uint32(1);
    let err = Runtime::new()
        .init_contract(&module, &args, 0, &mut store, GAS)
        .result
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeAssignability { .. }));
}

#[test]
fn constraint_must_hold() {
    let run = |constraint: Expr| {
        let mut module = module();
        module.contract.constraint = Some(constraint);
        let mut store = InMemoryState::new();
        Runtime::new()
            .init_contract(&module, &init_args(), 0, &mut store, GAS)
            .result
    };
    assert!(run(Expr::constr("True", vec![], &[])).is_ok());
    let err = run(Expr::constr("False", vec![], &[])).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::ConstraintViolation);
    let err = run(Expr::lit(Literal::uint32(1))).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::ConstraintViolation);
}

#[test]
fn closure_fields_are_rejected_at_init() {
    let mut module = module();
    module.contract.fields.push(FieldDef {
        name: Name::new("f"),
        ty: Type::Fun(Box::new(Type::uint32()), Box::new(Type::uint32())),
        init: Expr::fun("x", Type::uint32(), Expr::var("x")),
    });
    let mut store = InMemoryState::new();
    let err = Runtime::new()
        .init_contract(&module, &init_args(), 0, &mut store, GAS)
        .result
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ImpureValue { .. }));
    assert_eq!(store.field("f"), None);
}

#[test]
fn event_transition_accepts_and_emits() {
    let module = module();
    let (state, mut store) = deploy(&module, 100);
    let msg = message("foo", 0, vec![("x", Value::uint32(5))]);
    let out = send(&module, &state, &mut store, &msg);
    assert_eq!(out.remaining_gas, GAS);
    let res = out.result.unwrap();
    assert!(res.accepted);
    assert_eq!(res.events.len(), 1);
    assert!(res.emitted.is_empty());
    assert_eq!(res.state.balance, 100);
    let event = res.events[0].as_msg().unwrap();
    assert_eq!(event.get("x"), Some(&Value::uint32(5)));
}

#[test]
fn accepting_twice_credits_once() {
    let module = module();
    let (state, mut store) = deploy(&module, 100);
    let res = send(&module, &state, &mut store, &message("accept_twice", 50, vec![]))
        .result
        .unwrap();
    assert!(res.accepted);
    assert_eq!(res.state.balance, 150);
}

#[test]
fn sent_amounts_are_deducted() {
    let module = module();
    let (state, mut store) = deploy(&module, 100);
    let msg = message(
        "pay",
        0,
        vec![("to", addr(3)), ("amt", Value::uint128(30))],
    );
    let res = send(&module, &state, &mut store, &msg).result.unwrap();
    assert_eq!(res.emitted.len(), 1);
    assert_eq!(res.state.balance, 70);
    assert_eq!(state.balance, 100);
}

#[test]
fn sending_more_than_the_balance_fails() {
    let module = module();
    let (state, mut store) = deploy(&module, 100);
    let msg = message(
        "pay",
        20,
        vec![("to", addr(3)), ("amt", Value::uint128(500))],
    );
    let err = send(&module, &state, &mut store, &msg).result.unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::InsufficientBalance {
            required: 500,
            balance: 120,
        }
    );
    assert_eq!(err.notes.len(), 1);
}

#[test]
fn unknown_tags_are_rejected() {
    let module = module();
    let (state, mut store) = deploy(&module, 0);
    let err = send(&module, &state, &mut store, &message("nope", 0, vec![]))
        .result
        .unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::NoMatchingTransition {
            tag: "nope".to_string()
        }
    );

    // procedures are not entry points
    let err = send(&module, &state, &mut store, &message("bump", 0, vec![]))
        .result
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NoMatchingTransition { .. }));

    let no_tag = named(vec![("_amount", Value::uint128(0))]);
    let err = send(&module, &state, &mut store, &no_tag).result.unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::MalformedMessage {
            missing: "_tag".to_string()
        }
    );
}

#[test]
fn message_entries_must_match_parameters() {
    let module = module();
    let (state, mut store) = deploy(&module, 0);
    let msg = message(
        "foo",
        0,
        vec![("x", Value::uint32(1)), ("y", Value::uint32(2))],
    );
    let err = send(&module, &state, &mut store, &msg).result.unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::ParameterArgumentMismatch {
            name: "y".to_string(),
            reason: MismatchReason::Unexpected,
        }
    );

    let msg = message("foo", 0, vec![]);
    let err = send(&module, &state, &mut store, &msg).result.unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::ParameterArgumentMismatch {
            reason: MismatchReason::Missing,
            ..
        }
    ));
}

#[test]
fn transitions_call_earlier_procedures_only() {
    let module = module();
    let (state, mut store) = deploy(&module, 0);
    send(&module, &state, &mut store, &message("set", 0, vec![("x", Value::uint32(7))]))
        .result
        .unwrap();
    assert_eq!(store.field("counter"), Some(&Value::uint32(7)));

    let err = send(&module, &state, &mut store, &message("calls_late", 0, vec![]))
        .result
        .unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UnknownProcedure {
            name: "late".to_string()
        }
    );
    assert_eq!(err.backtrace.unwrap().names(), vec!["calls_late"]);
}

#[test]
fn constructor_arity_failure_reports_gas() {
    let module = module();
    let (state, mut store) = deploy(&module, 0);
    let out = send(
        &module,
        &state,
        &mut store,
        &message("broken_pair", 0, vec![("x", Value::uint32(1))]),
    );
    assert_eq!(out.remaining_gas, GAS);
    let err = out.result.unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::ArityMismatch {
            constructor: "Pair".to_string(),
            expected: 2,
            got: 1,
        }
    );
}

#[test]
fn running_out_of_gas_is_distinguished() {
    let module = module();
    let (state, mut store) = deploy(&module, 0);
    let out = send(&module, &state, &mut store, &message("expensive", 0, vec![]));
    assert!(out.is_out_of_gas());
    assert_eq!(out.remaining_gas, GAS);
    let err = out.result.unwrap_err();
    assert_eq!(err.backtrace.unwrap().names(), vec!["expensive"]);
}

#[test]
fn dispatch_is_deterministic() {
    let module = module();
    let run = || {
        let (state, mut store) = deploy(&module, 100);
        let msg = message(
            "pay",
            5,
            vec![("to", addr(3)), ("amt", Value::uint128(30))],
        );
        let (result, gas) = send(&module, &state, &mut store, &msg).into_parts();
        let res = result.unwrap();
        (res.emitted, res.state.balance, gas)
    };
    assert_eq!(run(), run());
}
