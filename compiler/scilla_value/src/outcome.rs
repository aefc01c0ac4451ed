//! Gas-carrying results.

use crate::errors::EvalError;

/// Result of a public evaluator entry point.
///
/// Gas is billed whether or not evaluation succeeds, so the remaining gas is
/// reported next to both outcomes.
#[derive(Clone, Debug)]
#[must_use]
pub struct Outcome<T> {
    pub result: Result<T, EvalError>,
    pub remaining_gas: u64,
}

impl<T> Outcome<T> {
    pub fn new(result: Result<T, EvalError>, remaining_gas: u64) -> Self {
        Outcome {
            result,
            remaining_gas,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_out_of_gas(&self) -> bool {
        self.result.as_ref().is_err_and(EvalError::is_out_of_gas)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            result: self.result.map(f),
            remaining_gas: self.remaining_gas,
        }
    }

    pub fn into_parts(self) -> (Result<T, EvalError>, u64) {
        (self.result, self.remaining_gas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors;

    #[test]
    fn gas_survives_failure() {
        let outcome: Outcome<()> = Outcome::new(Err(errors::out_of_gas(5, 2)), 2);
        assert!(outcome.is_out_of_gas());
        let (result, gas) = outcome.map(|()| 1).into_parts();
        assert!(result.is_err());
        assert_eq!(gas, 2);
    }
}
