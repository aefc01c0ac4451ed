//! Gas metering and charge resolution.
//!
//! A charge is a symbolic expression whose leaves name variables in scope.
//! Leaves are resolved against the current environment through the cost
//! model; combinators are folded here. Intermediate results may be
//! fractional (`LogOf`), but the final charge must be a whole number.

use scilla_ir::{GasCharge, Name};
use scilla_value::errors::{non_collection, non_integer_gas_charge, out_of_gas};
use scilla_value::{EvalResult, Value};
use tracing::trace;

use crate::cost_model::CostModel;

/// Remaining gas for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    remaining: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        GasMeter { remaining: limit }
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Deduct `amount`. On failure nothing is deducted.
    pub fn charge(&mut self, amount: u64) -> EvalResult<()> {
        match self.remaining.checked_sub(amount) {
            Some(rest) => {
                trace!(amount, remaining = rest, "gas charged");
                self.remaining = rest;
                Ok(())
            }
            None => Err(out_of_gas(amount, self.remaining)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Amount {
    Whole(u64),
    Frac(f64),
}

impl Amount {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Amount::Whole(n) => n as f64,
            Amount::Frac(x) => x,
        }
    }

    fn combine(self, other: Amount, whole: fn(u64, u64) -> u64, frac: fn(f64, f64) -> f64) -> Amount {
        match (self, other) {
            (Amount::Whole(a), Amount::Whole(b)) => Amount::Whole(whole(a, b)),
            (a, b) => Amount::Frac(frac(a.as_f64(), b.as_f64())),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_from_f64(x: f64) -> Option<u64> {
    if !x.is_finite() || x < 0.0 || x.fract() != 0.0 {
        return None;
    }
    Some(if x >= 18_446_744_073_709_551_615.0 {
        u64::MAX
    } else {
        x as u64
    })
}

/// Resolve `charge` to a whole amount of gas.
///
/// `lookup` resolves the variables named by the leaves.
pub fn resolve_charge(
    charge: &GasCharge,
    lookup: &dyn Fn(&Name) -> EvalResult<Value>,
    costs: &dyn CostModel,
) -> EvalResult<u64> {
    match resolve(charge, lookup, costs)? {
        Amount::Whole(n) => Ok(n),
        Amount::Frac(x) => whole_from_f64(x).ok_or_else(|| non_integer_gas_charge(charge)),
    }
}

fn resolve(
    charge: &GasCharge,
    lookup: &dyn Fn(&Name) -> EvalResult<Value>,
    costs: &dyn CostModel,
) -> EvalResult<Amount> {
    Ok(match charge {
        GasCharge::StaticCost(c) => Amount::Whole(*c),
        GasCharge::SizeOf(v) => Amount::Whole(costs.literal_cost(&lookup(v)?)?),
        GasCharge::ValueOf(v) => {
            let value = lookup(v)?;
            let n = value
                .magnitude()
                .ok_or_else(|| non_integer_gas_charge(charge))?;
            Amount::Whole(n)
        }
        GasCharge::LengthOf(v) => {
            let value = lookup(v)?;
            let len = match &value {
                Value::Map(m) => m.len(),
                _ => value
                    .as_list()
                    .map(|items| items.len())
                    .ok_or_else(|| non_collection("lengthof", &value))?,
            };
            Amount::Whole(len as u64)
        }
        GasCharge::MapSortCost(v) => {
            let value = lookup(v)?;
            let map = value
                .as_map()
                .ok_or_else(|| non_collection("mapsortcost", &value))?;
            Amount::Whole(costs.map_sort_cost(map))
        }
        GasCharge::SumOf(a, b) => resolve(a, lookup, costs)?.combine(
            resolve(b, lookup, costs)?,
            u64::saturating_add,
            |x, y| x + y,
        ),
        GasCharge::ProdOf(a, b) => resolve(a, lookup, costs)?.combine(
            resolve(b, lookup, costs)?,
            u64::saturating_mul,
            |x, y| x * y,
        ),
        GasCharge::MinOf(a, b) => {
            resolve(a, lookup, costs)?.combine(resolve(b, lookup, costs)?, u64::min, f64::min)
        }
        GasCharge::DivCeil(_, 0) => return Err(non_integer_gas_charge(charge)),
        GasCharge::DivCeil(a, d) => match resolve(a, lookup, costs)? {
            Amount::Whole(n) => Amount::Whole(n.div_ceil(*d)),
            #[allow(clippy::cast_precision_loss)]
            Amount::Frac(x) => Amount::Frac((x / *d as f64).ceil()),
        },
        GasCharge::LogOf(a) => {
            let x = resolve(a, lookup, costs)?.as_f64();
            // ln is negative below 1 and undefined at 0
            if x < 1.0 {
                return Err(non_integer_gas_charge(charge));
            }
            if (x - 1.0).abs() < f64::EPSILON {
                Amount::Whole(0)
            } else {
                Amount::Frac(x.ln())
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::cost_model::StdCostModel;
    use pretty_assertions::assert_eq;
    use scilla_ir::Type;
    use scilla_value::errors::unbound_identifier;
    use scilla_value::{EvalErrorKind, MapValue};

    fn lookup(name: &Name) -> EvalResult<Value> {
        match name.as_str() {
            "n" => Ok(Value::uint32(10)),
            "z" => Ok(Value::uint32(0)),
            "one" => Ok(Value::uint32(1)),
            "s" => Ok(Value::string("hello")),
            "l" => Ok(Value::list(
                &Type::uint32(),
                vec![Value::uint32(1), Value::uint32(2), Value::uint32(3)],
            )),
            "m" => Ok(Value::Map(
                MapValue::empty(Type::uint32(), Type::uint32())
                    .insert(Value::uint32(1), Value::uint32(1))
                    .insert(Value::uint32(2), Value::uint32(2))
                    .insert(Value::uint32(3), Value::uint32(3)),
            )),
            other => Err(unbound_identifier(other)),
        }
    }

    fn resolve_std(charge: &GasCharge) -> EvalResult<u64> {
        resolve_charge(charge, &lookup, &StdCostModel)
    }

    #[test]
    fn meter_refuses_overdraft_without_deducting() {
        let mut gas = GasMeter::new(10);
        gas.charge(4).unwrap();
        let err = gas.charge(7).unwrap_err();
        assert!(err.is_out_of_gas());
        assert_eq!(gas.remaining(), 6);
        gas.charge(6).unwrap();
        assert_eq!(gas.remaining(), 0);
    }

    #[test]
    fn leaves_resolve_against_bindings() {
        assert_eq!(resolve_std(&GasCharge::value_of("n")).unwrap(), 10);
        assert_eq!(resolve_std(&GasCharge::size_of("s")).unwrap(), 5);
        assert_eq!(resolve_std(&GasCharge::length_of("l")).unwrap(), 3);
        assert_eq!(resolve_std(&GasCharge::length_of("m")).unwrap(), 3);
        assert_eq!(
            resolve_std(&GasCharge::MapSortCost(Name::new("m"))).unwrap(),
            6
        );
    }

    #[test]
    fn combinators_fold() {
        let c = GasCharge::sum(
            GasCharge::StaticCost(2),
            GasCharge::prod(GasCharge::value_of("n"), GasCharge::StaticCost(3)),
        );
        assert_eq!(resolve_std(&c).unwrap(), 32);
        let m = GasCharge::min(GasCharge::value_of("n"), GasCharge::StaticCost(4));
        assert_eq!(resolve_std(&m).unwrap(), 4);
        let d = GasCharge::div_ceil(GasCharge::value_of("n"), 3);
        assert_eq!(resolve_std(&d).unwrap(), 4);
    }

    #[test]
    fn fractional_intermediate_must_end_whole() {
        let log = GasCharge::log(GasCharge::value_of("n"));
        let err = resolve_std(&log).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::NonIntegerGasCharge { .. }));

        // ceil(ln 10) = 3
        let rounded = GasCharge::div_ceil(log, 1);
        assert_eq!(resolve_std(&rounded).unwrap(), 3);
    }

    #[test]
    fn leaf_failures_propagate() {
        let err = resolve_std(&GasCharge::value_of("s")).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::NonIntegerGasCharge { .. }));
        let err = resolve_std(&GasCharge::length_of("n")).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::NonCollection { .. }));
        let err = resolve_std(&GasCharge::size_of("missing")).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::UnboundIdentifier { .. }));
    }

    #[test]
    fn undefined_combinators_fail() {
        let by_zero = GasCharge::div_ceil(GasCharge::value_of("n"), 0);
        let err = resolve_std(&by_zero).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::NonIntegerGasCharge { .. }));

        let log_zero = GasCharge::log(GasCharge::value_of("z"));
        let err = resolve_std(&log_zero).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::NonIntegerGasCharge { .. }));

        let log_one = GasCharge::log(GasCharge::value_of("one"));
        assert_eq!(resolve_std(&log_one).unwrap(), 0);
    }
}
