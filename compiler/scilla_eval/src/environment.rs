//! Environments as chains of frames in an arena.
//!
//! Every binding allocates one frame holding the name, the bound value and
//! the handle of the enclosing environment. An environment is just the handle
//! of its innermost frame (`Env`), so extending an environment is O(1) and
//! never disturbs the environments it was built from: both arms of a match
//! can extend the same scope independently.
//!
//! Closures capture an `Env` handle, not the frames. A recursive closure
//! (fixpoint) binds its own name to a placeholder frame, evaluates its body
//! and then patches the placeholder, so the value graph stays acyclic.
//!
//! # Layers
//!
//! The arena has a frozen, shared base and a scratch layer. Contract
//! initialization evaluates the libraries and init parameters and then
//! [`freeze`](EnvArena::freeze)s the arena; each message runs on a fresh
//! scratch layer over that base, which is dropped with the run.

use std::rc::Rc;

use scilla_ir::{Name, Type};
use scilla_value::errors::unbound_identifier;
use scilla_value::{Env, EvalResult, FrameId, Value};

/// What a frame binds.
#[derive(Clone, Debug)]
pub enum Binding {
    Value(Value),
    /// A type variable instantiated by type application.
    Type(Type),
    /// A recursive binding whose value is still being computed.
    Pending,
}

#[derive(Clone, Debug)]
pub struct Frame {
    name: Name,
    binding: Binding,
    parent: Env,
}

/// Immutable, shareable frames produced by [`EnvArena::freeze`].
#[derive(Clone, Debug, Default)]
pub struct FrozenEnv(Rc<Vec<Frame>>);

impl FrozenEnv {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Arena of environment frames.
#[derive(Debug, Default)]
pub struct EnvArena {
    base: Rc<Vec<Frame>>,
    scratch: Vec<Frame>,
}

impl EnvArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh scratch layer over frozen frames.
    pub fn over(base: &FrozenEnv) -> Self {
        EnvArena {
            base: Rc::clone(&base.0),
            scratch: Vec::new(),
        }
    }

    /// Total number of frames.
    pub fn len(&self) -> usize {
        self.base.len() + self.scratch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn frame(&self, id: FrameId) -> &Frame {
        let idx = id.index();
        match idx.checked_sub(self.base.len()) {
            None => &self.base[idx],
            Some(scratch_idx) => &self.scratch[scratch_idx],
        }
    }

    fn push(&mut self, frame: Frame) -> Env {
        let id = u32::try_from(self.len()).unwrap_or(u32::MAX);
        self.scratch.push(frame);
        Env::at(FrameId::new(id))
    }

    /// Extend `env` with `name = value`.
    pub fn bind(&mut self, env: Env, name: Name, value: Value) -> Env {
        self.push(Frame {
            name,
            binding: Binding::Value(value),
            parent: env,
        })
    }

    /// Extend `env` with type variable `tvar = ty`.
    pub fn bind_type(&mut self, env: Env, tvar: Name, ty: Type) -> Env {
        self.push(Frame {
            name: tvar,
            binding: Binding::Type(ty),
            parent: env,
        })
    }

    /// Extend `env` with a placeholder for `name`, to be filled by
    /// [`set`](Self::set).
    pub fn bind_pending(&mut self, env: Env, name: Name) -> Env {
        self.push(Frame {
            name,
            binding: Binding::Pending,
            parent: env,
        })
    }

    /// Replace the binding of `env`'s innermost frame.
    pub fn set(&mut self, env: Env, value: Value) {
        let Some(id) = env.top() else { return };
        let idx = id.index();
        let frame = match idx.checked_sub(self.base.len()) {
            Some(scratch_idx) => &mut self.scratch[scratch_idx],
            None => &mut Rc::make_mut(&mut self.base)[idx],
        };
        frame.binding = Binding::Value(value);
    }

    /// Extend `env` with every binding, in order.
    pub fn bind_all(&mut self, env: Env, bindings: impl IntoIterator<Item = (Name, Value)>) -> Env {
        bindings
            .into_iter()
            .fold(env, |env, (name, value)| self.bind(env, name, value))
    }

    fn find(&self, env: Env, name: &str) -> Option<&Frame> {
        let mut cur = env.top();
        while let Some(id) = cur {
            let frame = self.frame(id);
            if frame.name == name {
                return Some(frame);
            }
            cur = frame.parent.top();
        }
        None
    }

    /// Value bound to `name`, innermost binding first.
    pub fn lookup(&self, env: Env, name: &str) -> EvalResult<Value> {
        match self.find(env, name).map(|f| &f.binding) {
            Some(Binding::Value(v)) => Ok(v.clone()),
            Some(Binding::Type(_) | Binding::Pending) | None => Err(unbound_identifier(name)),
        }
    }

    /// Type bound to type variable `tvar`, if instantiated.
    pub fn lookup_type(&self, env: Env, tvar: &str) -> Option<Type> {
        match self.find(env, tvar).map(|f| &f.binding) {
            Some(Binding::Type(ty)) => Some(ty.clone()),
            _ => None,
        }
    }

    /// Substitute instantiated type variables in `ty`.
    pub fn resolve_type(&self, env: Env, ty: &Type) -> Type {
        if !ty.has_free_type_vars() {
            return ty.clone();
        }
        ty.resolve(&|tv: &Name| self.lookup_type(env, tv))
    }

    /// Visible value bindings of `env` (shadowed ones omitted), outermost
    /// first.
    pub fn bindings(&self, env: Env) -> Vec<(Name, Value)> {
        let mut seen: Vec<&Name> = Vec::new();
        let mut out = Vec::new();
        let mut cur = env.top();
        while let Some(id) = cur {
            let frame = self.frame(id);
            if !seen.contains(&&frame.name) {
                seen.push(&frame.name);
                if let Binding::Value(v) = &frame.binding {
                    out.push((frame.name.clone(), v.clone()));
                }
            }
            cur = frame.parent.top();
        }
        out.reverse();
        out
    }

    /// A new environment holding the visible value bindings of `env` whose
    /// names satisfy `keep`.
    pub fn filter(&mut self, env: Env, keep: impl Fn(&Name) -> bool) -> Env {
        let kept: Vec<_> = self
            .bindings(env)
            .into_iter()
            .filter(|(name, _)| keep(name))
            .collect();
        self.bind_all(Env::EMPTY, kept)
    }

    /// Merge the scratch layer into a new frozen base. Handles stay valid.
    pub fn freeze(self) -> FrozenEnv {
        let mut frames = Rc::unwrap_or_clone(self.base);
        frames.extend(self.scratch);
        FrozenEnv(Rc::new(frames))
    }
}
