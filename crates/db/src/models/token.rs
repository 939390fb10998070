use serde::{Deserialize, Serialize};

/// Identity behind a bearer token, keyed by the token string in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenData {
    /// Opaque identity of the token owner
    pub id: String,
}

impl TokenData {
    /// Create token data for the given identity
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
