//! Route-level scope requirements.
//!
//! A [`RequiredScope`] is an ordered list of alternatives. The requirement is
//! met when any one alternative is fully granted (OR across alternatives),
//! and an alternative is granted when every scope it names is present in the
//! token (AND within an alternative).
//!
//! ```rust
//! use resource_gate::middleware::authorization::{RequiredScope, ScopeAlternative};
//!
//! let scope = RequiredScope::none()
//!     .or("superUser")
//!     .or(ScopeAlternative::all(["basicUser", "withPermission"]));
//!
//! assert!(scope.is_satisfied_by(Some("basicUser withPermission anExtraScope")));
//! assert!(!scope.is_satisfied_by(Some("basicUser")));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::services::verifier::claims::granted_scopes;

/// One way of satisfying a [`RequiredScope`].
///
/// Deserializes from either a bare string or an array of strings, so
/// `["superUser", ["basicUser", "withPermission"]]` is a valid requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeAlternative {
    Single(String),
    Group(Vec<String>),
}

impl ScopeAlternative {
    pub fn one(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    pub fn all(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Group(names.into_iter().map(Into::into).collect())
    }

    /// Scope names this alternative requires, a single name being a group of one.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Group(names) => names,
        }
    }

    fn is_granted(&self, granted: &HashSet<&str>) -> bool {
        self.names()
            .iter()
            .all(|name| granted.contains(name.as_str()))
    }
}

impl From<&str> for ScopeAlternative {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for ScopeAlternative {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl<const N: usize> From<[&str; N]> for ScopeAlternative {
    fn from(names: [&str; N]) -> Self {
        Self::all(names)
    }
}

impl From<Vec<String>> for ScopeAlternative {
    fn from(names: Vec<String>) -> Self {
        Self::Group(names)
    }
}

/// Scope requirement of a gate. Empty means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredScope {
    alternatives: Vec<ScopeAlternative>,
}

impl RequiredScope {
    /// No scope requirement.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any_of<I>(alternatives: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ScopeAlternative>,
    {
        alternatives.into_iter().collect()
    }

    /// Append another alternative.
    pub fn or(mut self, alternative: impl Into<ScopeAlternative>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    pub fn alternatives(&self) -> &[ScopeAlternative] {
        &self.alternatives
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Evaluate the requirement against a token's space-separated scope string.
    pub fn is_satisfied_by(&self, granted: Option<&str>) -> bool {
        if self.alternatives.is_empty() {
            return true;
        }

        let granted = granted_scopes(granted);
        self.alternatives.iter().any(|alt| alt.is_granted(&granted))
    }
}

impl<A: Into<ScopeAlternative>> FromIterator<A> for RequiredScope {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        Self {
            alternatives: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&str> for RequiredScope {
    fn from(name: &str) -> Self {
        Self::none().or(name)
    }
}

impl From<ScopeAlternative> for RequiredScope {
    fn from(alternative: ScopeAlternative) -> Self {
        Self::none().or(alternative)
    }
}

impl From<Vec<ScopeAlternative>> for RequiredScope {
    fn from(alternatives: Vec<ScopeAlternative>) -> Self {
        Self { alternatives }
    }
}
