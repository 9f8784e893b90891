use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Claim set of a validated access token.
///
/// Built by a [`TokenVerifier`](super::TokenVerifier) for every successful
/// verification and handed to the gate read-only.
///
/// - `expires` is epoch seconds.
/// - `scope` is space-separated and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub access_token: String,
    pub client_id: String,
    pub user_id: String,
    pub expires: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenClaims {
    /// Granted scope names. Empty when the token carries no scope.
    pub fn scopes(&self) -> HashSet<&str> {
        granted_scopes(self.scope.as_deref())
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().contains(scope)
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires
    }
}

/// Split a space-separated scope string into names. `None` grants nothing.
pub fn granted_scopes(scope: Option<&str>) -> HashSet<&str> {
    scope.unwrap_or_default().split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(scope: Option<&str>) -> TokenClaims {
        TokenClaims {
            access_token: "atokenvalue".into(),
            client_id: "a client id".into(),
            user_id: "a user id".into(),
            expires: 1_000,
            scope: scope.map(str::to_string),
        }
    }

    #[test]
    fn scopes_split_on_whitespace() {
        let c = claims(Some("allowFoo  anotherScope"));
        assert_eq!(c.scopes(), HashSet::from(["allowFoo", "anotherScope"]));
        assert!(c.has_scope("allowFoo"));
        assert!(!c.has_scope("allow"));
    }

    #[test]
    fn missing_scope_is_empty() {
        assert!(claims(None).scopes().is_empty());
    }

    #[test]
    fn expiry_is_strictly_after() {
        let c = claims(None);
        assert!(!c.is_expired_at(1_000));
        assert!(c.is_expired_at(1_001));
    }

    #[test]
    fn null_scope_deserializes() {
        let c: TokenClaims = serde_json::from_str(
            r#"{"access_token":"atokenvalue","client_id":"a client id","user_id":"a user id","expires":1000,"scope":null}"#,
        )
        .unwrap();
        assert_eq!(c, claims(None));
    }

    #[test]
    fn granted_scopes_of_absent_scope_is_empty() {
        assert!(granted_scopes(None).is_empty());
        assert!(granted_scopes(Some("   ")).is_empty());
        assert_eq!(granted_scopes(Some(" a  b ")), HashSet::from(["a", "b"]));
    }
}
