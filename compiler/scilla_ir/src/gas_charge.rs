//! Symbolic gas-cost expressions.
//!
//! The static gas instrumentation pass wraps expressions (`GasExpr`) and
//! statements (`GasStmt`) in cost expressions whose leaves name variables in
//! scope. The evaluator resolves the leaves against the current environment
//! at the moment the charge is applied.

use std::fmt;

use crate::Name;

/// A cost expression.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum GasCharge {
    /// A constant cost.
    StaticCost(u64),
    /// Serialized-size cost of the value bound to the variable.
    SizeOf(Name),
    /// Numeric magnitude of the integer (or block number) bound to the variable.
    ValueOf(Name),
    /// Number of elements of the map or list bound to the variable.
    LengthOf(Name),
    /// Cost of sorting the map bound to the variable.
    MapSortCost(Name),
    SumOf(Box<GasCharge>, Box<GasCharge>),
    ProdOf(Box<GasCharge>, Box<GasCharge>),
    MinOf(Box<GasCharge>, Box<GasCharge>),
    /// Division rounding up.
    DivCeil(Box<GasCharge>, u64),
    /// Natural logarithm; may produce a fractional intermediate.
    LogOf(Box<GasCharge>),
}

impl GasCharge {
    pub fn sum(a: GasCharge, b: GasCharge) -> Self {
        GasCharge::SumOf(Box::new(a), Box::new(b))
    }

    pub fn prod(a: GasCharge, b: GasCharge) -> Self {
        GasCharge::ProdOf(Box::new(a), Box::new(b))
    }

    pub fn min(a: GasCharge, b: GasCharge) -> Self {
        GasCharge::MinOf(Box::new(a), Box::new(b))
    }

    pub fn div_ceil(a: GasCharge, divisor: u64) -> Self {
        GasCharge::DivCeil(Box::new(a), divisor)
    }

    pub fn log(a: GasCharge) -> Self {
        GasCharge::LogOf(Box::new(a))
    }

    pub fn size_of(name: impl Into<Name>) -> Self {
        GasCharge::SizeOf(name.into())
    }

    pub fn value_of(name: impl Into<Name>) -> Self {
        GasCharge::ValueOf(name.into())
    }

    pub fn length_of(name: impl Into<Name>) -> Self {
        GasCharge::LengthOf(name.into())
    }
}

impl fmt::Display for GasCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GasCharge::StaticCost(c) => write!(f, "{c}"),
            GasCharge::SizeOf(v) => write!(f, "sizeof({v})"),
            GasCharge::ValueOf(v) => write!(f, "valueof({v})"),
            GasCharge::LengthOf(v) => write!(f, "lengthof({v})"),
            GasCharge::MapSortCost(v) => write!(f, "mapsortcost({v})"),
            GasCharge::SumOf(a, b) => write!(f, "({a} + {b})"),
            GasCharge::ProdOf(a, b) => write!(f, "({a} * {b})"),
            GasCharge::MinOf(a, b) => write!(f, "min({a}, {b})"),
            GasCharge::DivCeil(a, d) => write!(f, "ceil({a} / {d})"),
            GasCharge::LogOf(a) => write!(f, "log({a})"),
        }
    }
}
