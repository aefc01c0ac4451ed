//! Type assignability checks at the contract boundary.
//!
//! Init arguments and message entries arrive as plain values. Before they are
//! bound, each is checked against its declared parameter type. Address-typed
//! parameters cannot be fully checked without looking at the chain, so the
//! check yields a [`PendingDynamicCheck`] that the harness discharges.

use scilla_ir::{AddressKind, AddressType, Name, PrimType, Type};
use scilla_value::adt_names as adt;
use scilla_value::errors::type_assignability;
use scilla_value::{EvalResult, Value};

use crate::storage::StateStore;

/// A deferred check that the account at `address` has the shape `ty`
/// demands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDynamicCheck {
    /// Parameter the value was bound to.
    pub name: Name,
    pub address: Vec<u8>,
    pub ty: AddressType,
}

/// Type assignability oracle.
pub trait TypeOracle {
    /// Check that `value` may be bound to a parameter `name` of type
    /// `expected`, returning the checks that must still run on the chain.
    fn assert_literal_type(
        &self,
        name: &str,
        expected: &Type,
        value: &Value,
    ) -> EvalResult<Vec<PendingDynamicCheck>>;

    /// Whether the account at `address` satisfies `ty`.
    fn typecheck_remote_field_types(
        &self,
        store: &dyn StateStore,
        address: &[u8],
        ty: &AddressType,
    ) -> bool;
}

/// Structural checks over runtime values.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdTypeOracle;

struct Checker<'a> {
    name: &'a str,
    pending: Vec<PendingDynamicCheck>,
}

impl Checker<'_> {
    fn fail(&self, expected: &Type, value: &Value) -> scilla_value::EvalError {
        let found = value
            .type_of()
            .map_or_else(|| value.kind_name().to_string(), |t| t.to_string());
        type_assignability(self.name, expected, found)
    }

    fn check(&mut self, expected: &Type, value: &Value) -> EvalResult<()> {
        match (expected, value) {
            (Type::Address(at), Value::ByStrX(bytes)) if value.type_of() == Some(Type::bystr20()) => {
                self.pending.push(PendingDynamicCheck {
                    name: Name::new(self.name),
                    address: bytes.to_vec(),
                    ty: at.clone(),
                });
                Ok(())
            }
            (Type::Prim(PrimType::Msg | PrimType::Event | PrimType::Exception), Value::Msg(_)) => {
                Ok(())
            }
            (Type::Prim(_), _) if value.type_of().as_ref() == Some(expected) => Ok(()),
            (Type::Map(k, v), Value::Map(m)) => {
                if m.key_ty.erase_addresses() != k.erase_addresses()
                    || m.val_ty.erase_addresses() != v.erase_addresses()
                {
                    return Err(self.fail(expected, value));
                }
                for (key, val) in m.entries.iter() {
                    self.check(k, key)?;
                    self.check(v, val)?;
                }
                Ok(())
            }
            (Type::Adt(tname, targs), Value::Adt(a)) => {
                let erased: Vec<Type> = targs.iter().map(Type::erase_addresses).collect();
                let actual: Vec<Type> = a.targs.iter().map(Type::erase_addresses).collect();
                if a.type_name != *tname || erased != actual {
                    return Err(self.fail(expected, value));
                }
                self.check_adt_args(expected, tname, targs, &a.constructor, &a.args)
            }
            _ => Err(self.fail(expected, value)),
        }
    }

    /// Descend into the generic built-in datatypes so nested addresses are
    /// found. Other datatypes are checked by their erased type only.
    fn check_adt_args(
        &mut self,
        expected: &Type,
        tname: &str,
        targs: &[Type],
        ctor: &str,
        args: &[Value],
    ) -> EvalResult<()> {
        match (tname, ctor, targs, args) {
            (adt::OPTION, adt::SOME, [t], [v]) => self.check(t, v),
            (adt::LIST, adt::CONS, [t], [head, tail]) => {
                self.check(t, head)?;
                self.check(expected, tail)
            }
            (adt::PAIR, adt::PAIR, [t1, t2], [a, b]) => {
                self.check(t1, a)?;
                self.check(t2, b)
            }
            _ => Ok(()),
        }
    }
}

impl TypeOracle for StdTypeOracle {
    fn assert_literal_type(
        &self,
        name: &str,
        expected: &Type,
        value: &Value,
    ) -> EvalResult<Vec<PendingDynamicCheck>> {
        let mut checker = Checker {
            name,
            pending: Vec::new(),
        };
        checker.check(expected, value)?;
        Ok(checker.pending)
    }

    fn typecheck_remote_field_types(
        &self,
        store: &dyn StateStore,
        address: &[u8],
        ty: &AddressType,
    ) -> bool {
        if !store.address_exists(address) {
            return false;
        }
        match ty.kind {
            AddressKind::Any | AddressKind::Library => true,
            AddressKind::Contract => ty.fields.iter().all(|(field, want)| {
                store
                    .remote_field_type(address, field)
                    .is_some_and(|have| have.erase_addresses() == want.erase_addresses())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::storage::InMemoryState;
    use pretty_assertions::assert_eq;
    use scilla_value::{EvalErrorKind, MapValue};

    #[test]
    fn primitives_must_match_exactly() {
        let o = StdTypeOracle;
        assert!(o
            .assert_literal_type("x", &Type::uint32(), &Value::uint32(1))
            .unwrap()
            .is_empty());
        let err = o
            .assert_literal_type("x", &Type::uint64(), &Value::uint32(1))
            .unwrap_err();
        assert_eq!(
            err.kind,
            EvalErrorKind::TypeAssignability {
                name: "x".to_string(),
                expected: "Uint64".to_string(),
                found: "Uint32".to_string(),
            }
        );
    }

    #[test]
    fn addresses_defer_a_check() {
        let o = StdTypeOracle;
        let ty = Type::contract_address(vec![(Name::new("owner"), Type::bystr20())]);
        let checks = o
            .assert_literal_type("a", &ty, &Value::bystrx([9u8; 20]))
            .unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].address, vec![9u8; 20]);
        assert!(o
            .assert_literal_type("a", &ty, &Value::bystrx([9u8; 19]))
            .is_err());
    }

    #[test]
    fn nested_addresses_are_found() {
        let o = StdTypeOracle;
        let ty = Type::list(Type::address());
        let v = Value::list(
            &Type::bystr20(),
            vec![Value::bystrx([1u8; 20]), Value::bystrx([2u8; 20])],
        );
        assert_eq!(o.assert_literal_type("l", &ty, &v).unwrap().len(), 2);

        let mty = Type::map(Type::address(), Type::uint32());
        let m = Value::Map(
            MapValue::empty(Type::bystr20(), Type::uint32())
                .insert(Value::bystrx([3u8; 20]), Value::uint32(1)),
        );
        assert_eq!(o.assert_literal_type("m", &mty, &m).unwrap().len(), 1);
    }

    #[test]
    fn remote_shape_is_checked_against_the_store() {
        let mut st = InMemoryState::new();
        let addr = vec![5u8; 20];
        st.add_contract(
            addr.clone(),
            [(Name::new("owner"), Type::bystr20(), Value::bystrx([0u8; 20]))],
        );
        let o = StdTypeOracle;
        let good = AddressType {
            kind: AddressKind::Contract,
            fields: vec![(Name::new("owner"), Type::address())],
        };
        let bad = AddressType {
            kind: AddressKind::Contract,
            fields: vec![(Name::new("admin"), Type::bystr20())],
        };
        assert!(o.typecheck_remote_field_types(&st, &addr, &good));
        assert!(!o.typecheck_remote_field_types(&st, &addr, &bad));
        assert!(!o.typecheck_remote_field_types(&st, &[1u8; 20], &good));
    }
}
