//! Identifiers.
//!
//! Names are reference-counted strings: the AST is built once by the front
//! end and names are cloned into environments, closures and error messages
//! many times afterwards, so cloning has to be cheap.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// An identifier: variable, field, constructor, type, type variable or
/// component name.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Name(Rc<str>);

impl Name {
    /// Create a name from a string.
    #[inline]
    pub fn new(s: impl AsRef<str>) -> Self {
        Name(Rc::from(s.as_ref()))
    }

    /// View as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Name {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    #[inline]
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    #[inline]
    fn from(s: String) -> Self {
        Name(Rc::from(s))
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn compares_with_str() {
        let n = Name::new("balance");
        assert_eq!(n, "balance");
        assert_eq!(n.as_str(), "balance");
        assert_eq!(n.len(), 7);
    }

    #[test]
    fn usable_as_map_key_with_str_lookup() {
        let mut map = HashMap::new();
        map.insert(Name::from("x"), 1);
        assert_eq!(map.get("x"), Some(&1));
    }
}
