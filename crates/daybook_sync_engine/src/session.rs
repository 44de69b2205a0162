//! Persisted session credentials.

use daybook_core::KeyValueStore;
use daybook_sync_protocol::SessionTokens;
use std::sync::Arc;
use tracing::warn;

/// Storage key for the serialized token pair.
const SESSION_KEY: &str = "daybook_session";

/// Holds the access/refresh credential pair in the host's key-value store.
///
/// Loading fails closed: unreadable storage, unparseable JSON, or a pair
/// with an empty token all read as "no session". None of the accessors
/// errors across the public boundary.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Creates a session store on top of the given key-value storage.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn load(&self) -> Option<SessionTokens> {
        let raw = self.kv.get(SESSION_KEY).ok().flatten()?;
        let tokens: SessionTokens = serde_json::from_str(&raw).ok()?;
        tokens.is_complete().then_some(tokens)
    }

    /// Returns the current access token, if a complete session is stored.
    pub fn access_token(&self) -> Option<String> {
        self.load().map(|t| t.access_token)
    }

    /// Returns the current refresh token, if a complete session is stored.
    pub fn refresh_token(&self) -> Option<String> {
        self.load().map(|t| t.refresh_token)
    }

    /// Persists a new token pair, replacing any previous session.
    pub fn set_tokens(&self, tokens: SessionTokens) {
        match serde_json::to_string(&tokens) {
            Ok(raw) => {
                if let Err(e) = self.kv.set(SESSION_KEY, &raw) {
                    warn!(error = %e, "failed to persist session tokens");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize session tokens"),
        }
    }

    /// Removes the stored session.
    pub fn clear(&self) {
        if let Err(e) = self.kv.remove(SESSION_KEY) {
            warn!(error = %e, "failed to clear session");
        }
    }

    /// Returns true when a complete token pair is stored.
    pub fn has_tokens(&self) -> bool {
        self.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::MemoryKeyValueStore;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryKeyValueStore::new()))
    }

    #[test]
    fn empty_store_has_no_session() {
        let session = store();
        assert!(!session.has_tokens());
        assert_eq!(session.access_token(), None);
        assert_eq!(session.refresh_token(), None);
    }

    #[test]
    fn set_and_read_tokens() {
        let session = store();
        session.set_tokens(SessionTokens::new("acc", "ref"));

        assert!(session.has_tokens());
        assert_eq!(session.access_token().as_deref(), Some("acc"));
        assert_eq!(session.refresh_token().as_deref(), Some("ref"));
    }

    #[test]
    fn clear_removes_session() {
        let session = store();
        session.set_tokens(SessionTokens::new("acc", "ref"));
        session.clear();
        assert!(!session.has_tokens());
    }

    #[test]
    fn corrupt_state_reads_as_no_session() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(SESSION_KEY, "{not json").unwrap();

        let session = SessionStore::new(kv);
        assert!(!session.has_tokens());
        assert_eq!(session.access_token(), None);
    }

    #[test]
    fn partial_pair_reads_as_no_session() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(SESSION_KEY, r#"{"access_token":"acc","refresh_token":""}"#)
            .unwrap();

        let session = SessionStore::new(kv);
        assert!(!session.has_tokens());
    }
}
