//! Credentials appended to every outbound request

/// API key and/or bearer token. Both are sent when both are set.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl AuthContext {
    pub fn new(api_key: Option<String>, bearer_token: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            bearer_token: bearer_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into()).filter(|k| !k.is_empty());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into()).filter(|t| !t.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.bearer_token.is_none()
    }

    /// Query pairs in wire order: `key` first, then `oauth_token`
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(key) = &self.api_key {
            pairs.push(("key", key.as_str()));
        }
        if let Some(token) = &self.bearer_token {
            pairs.push(("oauth_token", token.as_str()));
        }
        pairs
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
