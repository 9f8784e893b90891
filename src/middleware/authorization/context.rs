//! Claims context: where the gate leaves validated claims for later stages.
//!
//! Two shapes are accepted:
//! - an index-style map ([`SharedClaimsMap`]), read and written by key
//! - any [`ClaimsStore`] implementing the `get`/`has`/`set` protocol
//!
//! Both are wrapped in a [`ClaimsContext`] handle. The gate only ever writes
//! the [`TOKEN_KEY`] entry and never swaps the underlying store.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::GateError;
use crate::services::verifier::TokenClaims;

/// Key under which validated claims are stored.
pub const TOKEN_KEY: &str = "token";

/// Keyed store protocol for handing claims to downstream code.
pub trait ClaimsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<TokenClaims>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn set(&self, key: &str, claims: TokenClaims);
}

pub type ClaimsMap = HashMap<String, TokenClaims>;

/// Index-style store shared between the caller and the gate.
pub type SharedClaimsMap = Arc<RwLock<ClaimsMap>>;

// Adapter giving index-style maps the keyed protocol.
impl ClaimsStore for RwLock<ClaimsMap> {
    fn get(&self, key: &str) -> Option<TokenClaims> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn has(&self, key: &str) -> bool {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn set(&self, key: &str, claims: TokenClaims) {
        self.write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), claims);
    }
}

/// Shared handle to the store the gate writes into.
///
/// Cloning is cheap and clones share the same store.
#[derive(Clone)]
pub struct ClaimsContext {
    store: Arc<dyn ClaimsStore>,
}

impl fmt::Debug for ClaimsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsContext")
            .field("has_token", &self.store.has(TOKEN_KEY))
            .finish()
    }
}

impl ClaimsContext {
    pub fn indexed(map: SharedClaimsMap) -> Self {
        Self { store: map }
    }

    pub fn keyed(store: Arc<dyn ClaimsStore>) -> Self {
        Self { store }
    }

    /// Fresh, empty index-style context.
    pub fn empty() -> Self {
        Self::indexed(SharedClaimsMap::default())
    }

    /// Accept a type-erased collaborator if it satisfies either contract.
    ///
    /// Recognised shapes:
    /// - `RwLock<ClaimsMap>` (index-style)
    /// - `Arc<dyn ClaimsStore>` (get/has/set)
    pub fn from_any(shared: Arc<dyn Any + Send + Sync>) -> Result<Self, GateError> {
        let shared = match shared.downcast::<RwLock<ClaimsMap>>() {
            Ok(map) => return Ok(Self::indexed(map)),
            Err(other) => other,
        };

        match shared.downcast::<Arc<dyn ClaimsStore>>() {
            Ok(store) => Ok(Self::keyed(Arc::clone(&store))),
            Err(_) => Err(GateError::InvalidConfiguration(
                "claims context does not implement index-style access or the get/has/set store contract",
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<TokenClaims> {
        self.store.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.has(key)
    }

    pub fn set(&self, key: &str, claims: TokenClaims) {
        self.store.set(key, claims);
    }

    /// Claims stored under [`TOKEN_KEY`], if any.
    pub fn token(&self) -> Option<TokenClaims> {
        self.store.get(TOKEN_KEY)
    }
}

impl From<SharedClaimsMap> for ClaimsContext {
    fn from(map: SharedClaimsMap) -> Self {
        Self::indexed(map)
    }
}

impl From<Arc<dyn ClaimsStore>> for ClaimsContext {
    fn from(store: Arc<dyn ClaimsStore>) -> Self {
        Self::keyed(store)
    }
}
