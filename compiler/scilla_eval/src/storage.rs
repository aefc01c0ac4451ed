//! Contract state storage.
//!
//! The evaluator never owns persistent state. Field reads and writes, map
//! accesses by key path and reads of other contracts' fields go through a
//! [`StateStore`] supplied by the embedder. [`InMemoryState`] is a reference
//! implementation for tests and embedders without a database.

use rustc_hash::FxHashMap;
use scilla_ir::{Name, Type};
use scilla_value::errors::{storage, unknown_field};
use scilla_value::{EvalError, MapValue, Value};
use thiserror::Error;

/// Failure reported by a [`StateStore`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no field `{0}`")]
    UnknownField(Name),
    #[error("field `{0}` is not a map at the requested depth")]
    NotAMap(Name),
    #[error("no contract at address 0x{0}")]
    UnknownContract(String),
    #[error("map access to `{0}` needs at least one key")]
    EmptyKeyPath(Name),
}

impl From<StoreError> for EvalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownField(name) => unknown_field(&name),
            other => storage(other.to_string()),
        }
    }
}

/// Field storage of the running contract and read access to other
/// contracts.
///
/// Map reads take a key path and return the finished result value: with
/// `fetch` set, `Some v` or `None` of the value type at that depth; without
/// it, a `Bool` saying whether the path is present.
pub trait StateStore {
    fn load(&self, field: &str) -> Result<Value, StoreError>;

    fn store(&mut self, field: &str, value: Value) -> Result<(), StoreError>;

    fn map_get(&self, field: &str, keys: &[Value], fetch: bool) -> Result<Value, StoreError>;

    /// Set the entry at `keys`, or delete it when `value` is `None`.
    /// Missing intermediate maps are created on insertion.
    fn map_update(
        &mut self,
        field: &str,
        keys: &[Value],
        value: Option<Value>,
    ) -> Result<(), StoreError>;

    fn remote_load(&self, address: &[u8], field: &str) -> Result<Value, StoreError>;

    fn remote_map_get(
        &self,
        address: &[u8],
        field: &str,
        keys: &[Value],
        fetch: bool,
    ) -> Result<Value, StoreError>;

    /// Declared type of a field of the contract at `address`.
    fn remote_field_type(&self, address: &[u8], field: &str) -> Option<Type>;

    /// Whether any account lives at `address`.
    fn address_exists(&self, address: &[u8]) -> bool;
}

fn hex(address: &[u8]) -> String {
    address.iter().map(|b| format!("{b:02x}")).collect()
}

/// Walk `keys` down a nested map value.
fn lookup_path(field: &str, map: &Value, keys: &[Value], fetch: bool) -> Result<Value, StoreError> {
    let not_a_map = || StoreError::NotAMap(Name::new(field));
    let Some((last, prefix)) = keys.split_last() else {
        return Err(StoreError::EmptyKeyPath(Name::new(field)));
    };
    let top = map.as_map().ok_or_else(not_a_map)?;

    let mut val_ty = top.val_ty.clone();
    for _ in prefix {
        val_ty = match val_ty {
            Type::Map(_, v) => *v,
            _ => return Err(not_a_map()),
        };
    }

    let mut cur = top;
    let mut found = None;
    let mut present = true;
    for key in prefix {
        match cur.get(key) {
            Some(Value::Map(inner)) => cur = inner,
            Some(_) => return Err(not_a_map()),
            None => {
                present = false;
                break;
            }
        }
    }
    if present {
        found = cur.get(last).cloned();
    }
    Ok(match (fetch, found) {
        (false, found) => Value::bool(found.is_some()),
        (true, Some(v)) => Value::some(val_ty, v),
        (true, None) => Value::none(val_ty),
    })
}

fn update_path(
    field: &str,
    map: &MapValue,
    keys: &[Value],
    value: Option<Value>,
) -> Result<MapValue, StoreError> {
    match keys {
        [] => Err(StoreError::EmptyKeyPath(Name::new(field))),
        [key] => Ok(match value {
            Some(v) => map.insert(key.clone(), v),
            None => map.remove(key),
        }),
        [key, rest @ ..] => {
            let inner = match map.get(key) {
                Some(Value::Map(inner)) => inner.clone(),
                Some(_) => return Err(StoreError::NotAMap(Name::new(field))),
                None if value.is_none() => return Ok(map.clone()),
                None => match &map.val_ty {
                    Type::Map(k, v) => MapValue::empty(k.as_ref().clone(), v.as_ref().clone()),
                    _ => return Err(StoreError::NotAMap(Name::new(field))),
                },
            };
            let updated = update_path(field, &inner, rest, value)?;
            Ok(map.insert(key.clone(), Value::Map(updated)))
        }
    }
}

#[derive(Clone, Debug, Default)]
struct RemoteContract {
    fields: FxHashMap<Name, (Type, Value)>,
}

/// Fields held in hash maps.
#[derive(Clone, Debug, Default)]
pub struct InMemoryState {
    fields: FxHashMap<Name, Value>,
    remote: FxHashMap<Vec<u8>, RemoteContract>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract at `address` whose fields can be read remotely.
    pub fn add_contract(
        &mut self,
        address: impl Into<Vec<u8>>,
        fields: impl IntoIterator<Item = (Name, Type, Value)>,
    ) {
        let fields = fields
            .into_iter()
            .map(|(name, ty, value)| (name, (ty, value)))
            .collect();
        self.remote.insert(address.into(), RemoteContract { fields });
    }

    /// Current value of a local field, if set.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn remote_field(&self, address: &[u8], field: &str) -> Result<&Value, StoreError> {
        let contract = self
            .remote
            .get(address)
            .ok_or_else(|| StoreError::UnknownContract(hex(address)))?;
        contract
            .fields
            .get(field)
            .map(|(_, v)| v)
            .ok_or_else(|| StoreError::UnknownField(Name::new(field)))
    }
}

impl StateStore for InMemoryState {
    fn load(&self, field: &str) -> Result<Value, StoreError> {
        self.fields
            .get(field)
            .cloned()
            .ok_or_else(|| StoreError::UnknownField(Name::new(field)))
    }

    fn store(&mut self, field: &str, value: Value) -> Result<(), StoreError> {
        self.fields.insert(Name::new(field), value);
        Ok(())
    }

    fn map_get(&self, field: &str, keys: &[Value], fetch: bool) -> Result<Value, StoreError> {
        lookup_path(field, &self.load(field)?, keys, fetch)
    }

    fn map_update(
        &mut self,
        field: &str,
        keys: &[Value],
        value: Option<Value>,
    ) -> Result<(), StoreError> {
        let current = self.load(field)?;
        let map = current
            .as_map()
            .ok_or_else(|| StoreError::NotAMap(Name::new(field)))?;
        let updated = update_path(field, map, keys, value)?;
        self.fields.insert(Name::new(field), Value::Map(updated));
        Ok(())
    }

    fn remote_load(&self, address: &[u8], field: &str) -> Result<Value, StoreError> {
        self.remote_field(address, field).cloned()
    }

    fn remote_map_get(
        &self,
        address: &[u8],
        field: &str,
        keys: &[Value],
        fetch: bool,
    ) -> Result<Value, StoreError> {
        lookup_path(field, self.remote_field(address, field)?, keys, fetch)
    }

    fn remote_field_type(&self, address: &[u8], field: &str) -> Option<Type> {
        self.remote
            .get(address)?
            .fields
            .get(field)
            .map(|(ty, _)| ty.clone())
    }

    fn address_exists(&self, address: &[u8]) -> bool {
        self.remote.contains_key(address)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use scilla_value::EvalErrorKind;

    fn nested() -> Value {
        Value::Map(MapValue::empty(
            Type::string(),
            Type::map(Type::string(), Type::uint32()),
        ))
    }

    #[test]
    fn nested_update_creates_intermediate_maps() {
        let mut st = InMemoryState::new();
        st.store("m", nested()).unwrap();
        let keys = [Value::string("a"), Value::string("b")];
        st.map_update("m", &keys, Some(Value::uint32(3))).unwrap();

        assert_eq!(
            st.map_get("m", &keys, true).unwrap(),
            Value::some(Type::uint32(), Value::uint32(3))
        );
        assert_eq!(st.map_get("m", &keys, false).unwrap(), Value::bool(true));
        assert_eq!(
            st.map_get("m", &[Value::string("a")], true)
                .unwrap()
                .as_adt()
                .map(|a| a.constructor.as_str() == "Some"),
            Some(true)
        );
    }

    #[test]
    fn missing_paths_yield_none_of_the_value_type() {
        let mut st = InMemoryState::new();
        st.store("m", nested()).unwrap();
        let keys = [Value::string("x"), Value::string("y")];
        assert_eq!(
            st.map_get("m", &keys, true).unwrap(),
            Value::none(Type::uint32())
        );
        assert_eq!(st.map_get("m", &keys, false).unwrap(), Value::bool(false));
    }

    #[test]
    fn delete_removes_only_the_leaf() {
        let mut st = InMemoryState::new();
        st.store("m", nested()).unwrap();
        let ab = [Value::string("a"), Value::string("b")];
        let ac = [Value::string("a"), Value::string("c")];
        st.map_update("m", &ab, Some(Value::uint32(1))).unwrap();
        st.map_update("m", &ac, Some(Value::uint32(2))).unwrap();
        st.map_update("m", &ab, None).unwrap();
        assert_eq!(st.map_get("m", &ab, false).unwrap(), Value::bool(false));
        assert_eq!(st.map_get("m", &ac, false).unwrap(), Value::bool(true));
    }

    #[test]
    fn remote_reads_and_errors() {
        let mut st = InMemoryState::new();
        let addr = vec![7u8; 20];
        st.add_contract(
            addr.clone(),
            [(Name::new("owner"), Type::bystr20(), Value::bystrx([1u8; 20]))],
        );
        assert_eq!(
            st.remote_load(&addr, "owner").unwrap(),
            Value::bystrx([1u8; 20])
        );
        assert_eq!(st.remote_field_type(&addr, "owner"), Some(Type::bystr20()));
        assert!(st.address_exists(&addr));

        let err: EvalError = st.remote_load(&[0u8; 20], "owner").unwrap_err().into();
        assert!(matches!(err.kind, EvalErrorKind::Storage { .. }));
        let err: EvalError = st.load("nope").unwrap_err().into();
        assert!(matches!(err.kind, EvalErrorKind::UnknownField { .. }));
    }

    #[test]
    fn remote_map_reads_follow_fetch_flag() {
        let mut st = InMemoryState::new();
        let addr = vec![8u8; 20];
        let bal = MapValue::empty(Type::bystr20(), Type::uint128())
            .insert(Value::bystrx([3u8; 20]), Value::uint128(11));
        st.add_contract(
            addr.clone(),
            [(
                Name::new("bal"),
                Type::map(Type::bystr20(), Type::uint128()),
                Value::Map(bal),
            )],
        );

        let holder = [Value::bystrx([3u8; 20])];
        let stranger = [Value::bystrx([4u8; 20])];
        assert_eq!(
            st.remote_map_get(&addr, "bal", &holder, true).unwrap(),
            Value::some(Type::uint128(), Value::uint128(11))
        );
        assert_eq!(
            st.remote_map_get(&addr, "bal", &stranger, true).unwrap(),
            Value::none(Type::uint128())
        );
        assert_eq!(
            st.remote_map_get(&addr, "bal", &holder, false).unwrap(),
            Value::bool(true)
        );
        assert_eq!(
            st.remote_map_get(&addr, "bal", &stranger, false).unwrap(),
            Value::bool(false)
        );

        let err: EvalError = st
            .remote_map_get(&addr, "missing", &holder, true)
            .unwrap_err()
            .into();
        assert!(matches!(err.kind, EvalErrorKind::UnknownField { .. }));
    }
}
