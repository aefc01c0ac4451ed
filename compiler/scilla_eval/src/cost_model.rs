//! Cost functions consumed by the gas resolver.

use scilla_ir::{GasCharge, IntWidth, Name, PrimType, Type};
use scilla_value::errors::builtin_failure;
use scilla_value::{EvalError, EvalResult, MapValue, Value};

/// Static and dynamic cost functions.
///
/// `builtin_cost` returns a symbolic charge over the argument names; the
/// evaluator resolves it against the call-site environment.
pub trait CostModel {
    fn builtin_cost(
        &self,
        op: &str,
        targs: &[Type],
        arg_types: &[Type],
        args: &[Name],
    ) -> EvalResult<GasCharge>;

    /// Serialized-size cost of a value.
    fn literal_cost(&self, value: &Value) -> EvalResult<u64>;

    /// Cost of sorting a map, charged when a map is serialized.
    fn map_sort_cost(&self, map: &MapValue) -> u64;

    /// Cost of one evaluated library entry.
    fn lib_entry_cost(&self, value: &Value) -> EvalResult<u64>;
}

/// The standard cost model.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdCostModel;

/// `n * ceil(log2 n)`, zero for maps of fewer than two entries.
pub fn sort_cost(n: u64) -> u64 {
    if n < 2 {
        return 0;
    }
    let ceil_log2 = u64::from(u64::BITS - (n - 1).leading_zeros());
    n.saturating_mul(ceil_log2)
}

fn int_op_base(ty: Option<&Type>) -> u64 {
    match ty {
        Some(Type::Prim(PrimType::Int(int))) => match int.width {
            IntWidth::W32 | IntWidth::W64 => 4,
            IntWidth::W128 => 8,
            IntWidth::W256 => 16,
        },
        _ => 4,
    }
}

fn nth(op: &str, args: &[Name], i: usize) -> EvalResult<Name> {
    args.get(i)
        .cloned()
        .ok_or_else(|| builtin_failure(op, format!("missing argument {}", i + 1)))
}

impl CostModel for StdCostModel {
    fn builtin_cost(
        &self,
        op: &str,
        _targs: &[Type],
        arg_types: &[Type],
        args: &[Name],
    ) -> EvalResult<GasCharge> {
        let base = int_op_base(arg_types.first());
        let charge = match op {
            "eq" => match arg_types.first() {
                Some(Type::Prim(PrimType::Int(_))) => GasCharge::StaticCost(base),
                _ => GasCharge::min(
                    GasCharge::SizeOf(nth(op, args, 0)?),
                    GasCharge::SizeOf(nth(op, args, 1)?),
                ),
            },
            "add" | "sub" | "lt" => GasCharge::StaticCost(base),
            "mul" | "div" | "rem" => GasCharge::StaticCost(base * 5),
            "pow" => GasCharge::sum(
                GasCharge::StaticCost(base),
                GasCharge::prod(
                    GasCharge::StaticCost(base),
                    GasCharge::ValueOf(nth(op, args, 1)?),
                ),
            ),
            "concat" => GasCharge::sum(
                GasCharge::SizeOf(nth(op, args, 0)?),
                GasCharge::SizeOf(nth(op, args, 1)?),
            ),
            "strlen" | "substr" => GasCharge::SizeOf(nth(op, args, 0)?),
            "to_string" => match arg_types.first() {
                Some(Type::Prim(PrimType::Int(_))) => GasCharge::StaticCost(base),
                _ => GasCharge::SizeOf(nth(op, args, 0)?),
            },
            "blt" | "badd" | "bsub" => GasCharge::StaticCost(32),
            "put" | "get" | "remove" | "contains" => GasCharge::div_ceil(
                GasCharge::sum(
                    GasCharge::StaticCost(1),
                    GasCharge::log(GasCharge::sum(
                        GasCharge::LengthOf(nth(op, args, 0)?),
                        GasCharge::StaticCost(1),
                    )),
                ),
                1,
            ),
            "size" => GasCharge::StaticCost(1),
            _ if op.starts_with("to_int") || op.starts_with("to_uint") => {
                GasCharge::StaticCost(4)
            }
            _ => return Err(builtin_failure(op, "no cost is defined")),
        };
        Ok(charge)
    }

    fn literal_cost(&self, value: &Value) -> EvalResult<u64> {
        Ok(match value {
            Value::Int(i) => i.ty().width.bytes(),
            Value::Str(s) => s.len() as u64,
            Value::BNum(_) => 64,
            Value::ByStrX(b) | Value::ByStr(b) => b.len() as u64,
            Value::Closure(_) | Value::TypeClosure(_) => 0,
            Value::Adt(a) => a
                .args
                .iter()
                .try_fold(0u64, |acc, v| {
                    Ok::<u64, EvalError>(acc.saturating_add(self.literal_cost(v)?))
                })?,
            Value::Map(m) => m.entries.iter().try_fold(0u64, |acc, (k, v)| {
                let kv = self.literal_cost(k)?.saturating_add(self.literal_cost(v)?);
                Ok::<u64, EvalError>(acc.saturating_add(kv))
            })?,
            Value::Msg(m) => m.entries.iter().try_fold(0u64, |acc, e| {
                let entry = (e.name.len() as u64).saturating_add(self.literal_cost(&e.value)?);
                Ok::<u64, EvalError>(acc.saturating_add(entry))
            })?,
        })
    }

    fn map_sort_cost(&self, map: &MapValue) -> u64 {
        sort_cost(map.len() as u64)
    }

    fn lib_entry_cost(&self, value: &Value) -> EvalResult<u64> {
        self.literal_cost(value)
    }
}
