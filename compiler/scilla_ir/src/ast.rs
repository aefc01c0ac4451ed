//! Expression and statement AST.
//!
//! This is the disambiguated, type-checked and gas-instrumented tree the
//! front end hands to the evaluator. Function bodies are reference counted
//! because closures keep their code alive independently of the module.

use std::rc::Rc;

use crate::{GasCharge, Literal, Name, Span, Type};

/// An expression with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds of the pure functional language.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Var(Name),
    Let {
        name: Name,
        ty: Option<Type>,
        rhs: Box<Expr>,
        body: Box<Expr>,
    },
    /// Message (or event/exception) construction.
    Message(Vec<(Name, Payload)>),
    Fun {
        param: Name,
        param_ty: Type,
        body: Rc<Expr>,
    },
    /// Curried application of `func` to each argument in turn.
    App { func: Name, args: Vec<Name> },
    Constr {
        name: Name,
        targs: Vec<Type>,
        args: Vec<Name>,
    },
    MatchExpr {
        scrutinee: Name,
        clauses: Vec<Clause<Expr>>,
    },
    Builtin {
        op: Name,
        targs: Vec<Type>,
        args: Vec<Name>,
    },
    TFun { tvar: Name, body: Rc<Expr> },
    TApp { func: Name, targs: Vec<Type> },
    Fixpoint {
        name: Name,
        ty: Type,
        body: Box<Expr>,
    },
    GasExpr {
        charge: GasCharge,
        body: Box<Expr>,
    },
}

/// A message entry payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Lit(Literal),
    Var(Name),
}

/// A match pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    Wildcard,
    Binder(Name),
    Constructor(Name, Vec<Pattern>),
}

/// One clause of an expression- or statement-level match.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause<B> {
    pub pattern: Pattern,
    pub body: B,
}

/// A statement with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Blockchain values readable with `x <- & ...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockchainQuery {
    CurBlockNum,
    ChainId,
    /// Timestamp of the block number bound to the variable.
    Timestamp(Name),
}

/// Statement kinds of the imperative language.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `x <- f`
    Load { x: Name, field: Name },
    /// `x <- & addr.f`
    RemoteLoad { x: Name, addr: Name, field: Name },
    /// `f := r`
    Store { field: Name, value: Name },
    /// `x = e`
    Bind { x: Name, expr: Box<Expr> },
    /// `m[k1][k2] := v` or `delete m[k1][k2]`
    MapUpdate {
        map: Name,
        keys: Vec<Name>,
        value: Option<Name>,
    },
    /// `x <- m[k1][k2]` (fetch) or `x <- exists m[k1][k2]`
    MapGet {
        x: Name,
        map: Name,
        keys: Vec<Name>,
        fetch: bool,
    },
    RemoteMapGet {
        x: Name,
        addr: Name,
        map: Name,
        keys: Vec<Name>,
        fetch: bool,
    },
    ReadFromBC { x: Name, query: BlockchainQuery },
    /// `x <- & addr as T`
    TypeCast { x: Name, addr: Name, ty: Type },
    MatchStmt {
        scrutinee: Name,
        clauses: Vec<Clause<Vec<Stmt>>>,
    },
    AcceptPayment,
    SendMsgs(Name),
    CreateEvnt(Name),
    CallProc { name: Name, args: Vec<Name> },
    /// `forall l p`
    Iterate { list: Name, proc: Name },
    Throw(Option<Name>),
    GasStmt(GasCharge),
}

impl Expr {
    /// Expression with a dummy span.
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn lit(lit: Literal) -> Self {
        Expr::new(ExprKind::Literal(lit))
    }

    pub fn var(name: impl Into<Name>) -> Self {
        Expr::new(ExprKind::Var(name.into()))
    }

    pub fn let_in(name: impl Into<Name>, rhs: Expr, body: Expr) -> Self {
        Expr::new(ExprKind::Let {
            name: name.into(),
            ty: None,
            rhs: Box::new(rhs),
            body: Box::new(body),
        })
    }

    pub fn fun(param: impl Into<Name>, param_ty: Type, body: Expr) -> Self {
        Expr::new(ExprKind::Fun {
            param: param.into(),
            param_ty,
            body: Rc::new(body),
        })
    }

    pub fn app(func: impl Into<Name>, args: &[&str]) -> Self {
        Expr::new(ExprKind::App {
            func: func.into(),
            args: args.iter().map(|a| Name::new(a)).collect(),
        })
    }

    pub fn constr(name: impl Into<Name>, targs: Vec<Type>, args: &[&str]) -> Self {
        Expr::new(ExprKind::Constr {
            name: name.into(),
            targs,
            args: args.iter().map(|a| Name::new(a)).collect(),
        })
    }

    pub fn builtin(op: impl Into<Name>, args: &[&str]) -> Self {
        Expr::new(ExprKind::Builtin {
            op: op.into(),
            targs: Vec::new(),
            args: args.iter().map(|a| Name::new(a)).collect(),
        })
    }

    pub fn match_expr(scrutinee: impl Into<Name>, clauses: Vec<(Pattern, Expr)>) -> Self {
        Expr::new(ExprKind::MatchExpr {
            scrutinee: scrutinee.into(),
            clauses: clauses
                .into_iter()
                .map(|(pattern, body)| Clause { pattern, body })
                .collect(),
        })
    }

    pub fn message(entries: Vec<(&str, Payload)>) -> Self {
        Expr::new(ExprKind::Message(
            entries
                .into_iter()
                .map(|(n, p)| (Name::new(n), p))
                .collect(),
        ))
    }

    pub fn tfun(tvar: impl Into<Name>, body: Expr) -> Self {
        Expr::new(ExprKind::TFun {
            tvar: tvar.into(),
            body: Rc::new(body),
        })
    }

    pub fn tapp(func: impl Into<Name>, targs: Vec<Type>) -> Self {
        Expr::new(ExprKind::TApp {
            func: func.into(),
            targs,
        })
    }

    pub fn fixpoint(name: impl Into<Name>, ty: Type, body: Expr) -> Self {
        Expr::new(ExprKind::Fixpoint {
            name: name.into(),
            ty,
            body: Box::new(body),
        })
    }

    pub fn gas(charge: GasCharge, body: Expr) -> Self {
        Expr::new(ExprKind::GasExpr {
            charge,
            body: Box::new(body),
        })
    }
}

impl Stmt {
    /// Statement with a dummy span.
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn bind(x: impl Into<Name>, expr: Expr) -> Self {
        Stmt::new(StmtKind::Bind {
            x: x.into(),
            expr: Box::new(expr),
        })
    }

    pub fn load(x: impl Into<Name>, field: impl Into<Name>) -> Self {
        Stmt::new(StmtKind::Load {
            x: x.into(),
            field: field.into(),
        })
    }

    pub fn store(field: impl Into<Name>, value: impl Into<Name>) -> Self {
        Stmt::new(StmtKind::Store {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn match_stmt(scrutinee: impl Into<Name>, clauses: Vec<(Pattern, Vec<Stmt>)>) -> Self {
        Stmt::new(StmtKind::MatchStmt {
            scrutinee: scrutinee.into(),
            clauses: clauses
                .into_iter()
                .map(|(pattern, body)| Clause { pattern, body })
                .collect(),
        })
    }

    pub fn call(name: impl Into<Name>, args: &[&str]) -> Self {
        Stmt::new(StmtKind::CallProc {
            name: name.into(),
            args: args.iter().map(|a| Name::new(a)).collect(),
        })
    }
}

impl Pattern {
    pub fn binder(name: impl Into<Name>) -> Self {
        Pattern::Binder(name.into())
    }

    pub fn constr(name: impl Into<Name>, args: Vec<Pattern>) -> Self {
        Pattern::Constructor(name.into(), args)
    }
}
