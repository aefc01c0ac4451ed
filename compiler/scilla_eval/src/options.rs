//! Runtime policy.

/// Evaluation policy shared by every run of a `Runtime`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum nesting of closure applications, type applications and
    /// procedure calls. Exceeding it fails with `CallDepthExceeded`.
    pub max_call_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_call_depth: 1024,
        }
    }
}

impl EvalOptions {
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
