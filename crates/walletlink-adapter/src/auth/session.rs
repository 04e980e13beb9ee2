/*
[INPUT]:  Session tokens, owning addresses and expiration windows
[OUTPUT]: Per-address token lookup and validity checks
[POS]:    Auth layer - session token lifecycle
[UPDATE]: When adding token refresh or changing storage strategy
*/

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Stored session token with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub address: String,
    pub profile: serde_json::Map<String, serde_json::Value>,
}

/// Thread-safe session token store keyed by wallet address
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    data: Arc<RwLock<HashMap<String, TokenData>>>,
}

impl SessionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token for an address
    pub fn set_token(
        &self,
        address: &str,
        token: String,
        expires_seconds: u64,
        profile: serde_json::Map<String, serde_json::Value>,
    ) {
        let expires_at = expiry_after(Utc::now(), expires_seconds);
        let token_data = TokenData {
            token,
            expires_at,
            address: address.to_string(),
            profile,
        };

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(address_key(address), token_data);
    }

    /// Token for the address, if present and unexpired
    pub fn get_token(&self, address: &str) -> Option<String> {
        self.token_data(address)
            .filter(|data| Utc::now() <= data.expires_at)
            .map(|data| data.token)
    }

    pub fn has_valid_session(&self, address: &str) -> bool {
        self.get_token(address).is_some()
    }

    /// Token data for the address regardless of expiry
    pub fn token_data(&self, address: &str) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&address_key(address)).cloned()
    }

    /// Drop the token bound to one address
    pub fn remove(&self, address: &str) -> Option<TokenData> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(&address_key(address))
    }

}

// Saturates at the latest representable instant.
fn expiry_after(now: DateTime<Utc>, expires_seconds: u64) -> DateTime<Utc> {
    i64::try_from(expires_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// EVM hex addresses compare case-insensitively.
fn address_key(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = SessionStore::new();
        assert!(store.get_token("0x123").is_none());
        assert!(!store.has_valid_session("0x123"));
    }

    #[test]
    fn test_set_and_get_token_case_insensitive() {
        let store = SessionStore::new();
        store.set_token("0xAbC", "test_token".to_string(), 3600, Default::default());

        assert_eq!(store.get_token("0xabc"), Some("test_token".to_string()));
        assert!(store.has_valid_session("0xABC"));
        assert!(!store.has_valid_session("0xdef"));
    }

    #[test]
    fn test_expired_token_is_not_valid() {
        let store = SessionStore::new();
        store.set_token("0xabc", "stale".to_string(), 0, Default::default());
        {
            let mut guard = store.data.write().unwrap();
            let data = guard.get_mut("0xabc").unwrap();
            data.expires_at = Utc::now() - Duration::seconds(1);
        }

        assert!(store.get_token("0xabc").is_none());
        assert!(store.token_data("0xabc").is_some());
    }

    #[test]
    fn test_remove_token() {
        let store = SessionStore::new();
        store.set_token("0x1", "a".to_string(), 3600, Default::default());
        store.set_token("0x2", "b".to_string(), 3600, Default::default());

        assert!(store.remove("0x1").is_some());
        assert!(!store.has_valid_session("0x1"));
        assert!(store.has_valid_session("0x2"));

        assert!(store.remove("0x1").is_none());
    }

    #[test]
    fn test_oversized_lifetime_saturates() {
        let store = SessionStore::new();
        store.set_token("0xabc", "long".to_string(), 10_000_000_000_000_000, Default::default());
        store.set_token("0xdef", "max".to_string(), u64::MAX, Default::default());

        assert!(store.has_valid_session("0xabc"));
        assert!(store.has_valid_session("0xdef"));
        assert_eq!(store.token_data("0xdef").unwrap().expires_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_expiry_after_adds_lifetime() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 3600), now + Duration::seconds(3600));
        assert_eq!(expiry_after(now, i64::MAX as u64), DateTime::<Utc>::MAX_UTC);
    }
}
