//! Structural pattern matching.

use scilla_ir::{Name, Pattern};
use scilla_value::Value;
use smallvec::SmallVec;

/// Bindings produced by a successful match.
pub(crate) type Bindings = SmallVec<[(Name, Value); 4]>;

/// Match `value` against `pattern`, pushing binders onto `binds`.
///
/// On failure `binds` may hold a partial set; callers clear it before trying
/// the next clause.
pub(crate) fn match_pattern(pattern: &Pattern, value: &Value, binds: &mut Bindings) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Binder(x) => {
            binds.push((x.clone(), value.clone()));
            true
        }
        Pattern::Constructor(ctor, pats) => match value.as_adt() {
            Some(a) if a.constructor == *ctor && a.args.len() == pats.len() => pats
                .iter()
                .zip(&a.args)
                .all(|(p, v)| match_pattern(p, v, binds)),
            _ => false,
        },
    }
}

/// Index of the first clause whose pattern matches, with its bindings.
pub(crate) fn first_match<'p>(
    patterns: impl IntoIterator<Item = &'p Pattern>,
    value: &Value,
) -> Option<(usize, Bindings)> {
    let mut binds = Bindings::new();
    for (i, pattern) in patterns.into_iter().enumerate() {
        binds.clear();
        if match_pattern(pattern, value, &mut binds) {
            return Some((i, binds));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scilla_ir::Type;

    #[test]
    fn constructor_patterns_bind_nested_values() {
        let v = Value::some(
            Type::pair(Type::uint32(), Type::string()),
            Value::pair(
                Type::uint32(),
                Type::string(),
                Value::uint32(1),
                Value::string("a"),
            ),
        );
        let pat = Pattern::constr(
            "Some",
            vec![Pattern::constr(
                "Pair",
                vec![Pattern::binder("n"), Pattern::Wildcard],
            )],
        );
        let mut binds = Bindings::new();
        assert!(match_pattern(&pat, &v, &mut binds));
        assert_eq!(binds.as_slice(), &[(Name::new("n"), Value::uint32(1))]);
    }

    #[test]
    fn first_matching_clause_wins() {
        let pats = [
            Pattern::constr("None", vec![]),
            Pattern::binder("x"),
            Pattern::Wildcard,
        ];
        let (i, binds) = first_match(&pats, &Value::bool(true)).unwrap_or_default();
        assert_eq!(i, 1);
        assert_eq!(binds.len(), 1);
        assert!(first_match(&pats[..1], &Value::bool(true)).is_none());
    }
}
