use std::sync::{Arc, OnceLock};

use parley_storage::KeyValueStore;
use rand::Rng;

/// Storage key holding the profile's session id.
pub const SESSION_ID_KEY: &str = "chatSessionId";
/// Number of hex digits in a session id.
pub const SESSION_ID_LEN: usize = 32;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Stable per-profile identifier sent with every webhook request.
///
/// The id is resolved once per instance. When storage cannot be read or
/// written the generated id still lives for the lifetime of this instance.
pub struct SessionIdentity {
    storage: Arc<dyn KeyValueStore>,
    resolved: OnceLock<String>,
}

impl SessionIdentity {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            resolved: OnceLock::new(),
        }
    }

    pub fn get_or_create(&self) -> String {
        self.resolved.get_or_init(|| self.resolve()).clone()
    }

    fn resolve(&self) -> String {
        match self.storage.get(SESSION_ID_KEY) {
            Ok(Some(existing)) if !existing.is_empty() => return existing,
            Ok(_) => {}
            Err(error) => {
                tracing::warn!("failed to read session id, using a page-lifetime id: {error}");
            }
        }

        let session_id = generate_session_id(&mut rand::thread_rng());
        if let Err(error) = self.storage.set(SESSION_ID_KEY, &session_id) {
            tracing::warn!("failed to persist session id, keeping it in memory only: {error}");
        } else {
            tracing::info!(session_id = %session_id, "created chat session id");
        }
        session_id
    }
}

/// Draws 32 independent values in `0..16` and renders them as lowercase hex.
pub fn generate_session_id<R: Rng>(rng: &mut R) -> String {
    (0..SESSION_ID_LEN)
        .map(|_| char::from(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use parley_storage::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::chat::test_support::UnavailableStore;

    fn is_session_id(value: &str) -> bool {
        value.len() == SESSION_ID_LEN
            && value
                .chars()
                .all(|character| matches!(character, '0'..='9' | 'a'..='f'))
    }

    #[test]
    fn generated_ids_are_32_lowercase_hex_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(is_session_id(&generate_session_id(&mut rng)));
        }
    }

    #[test]
    fn first_call_persists_and_later_calls_reuse() {
        let storage = Arc::new(MemoryStore::new());
        let identity = SessionIdentity::new(storage.clone());

        let first = identity.get_or_create();
        assert!(is_session_id(&first));
        assert_eq!(identity.get_or_create(), first);
        assert_eq!(storage.get(SESSION_ID_KEY).unwrap().as_deref(), Some(first.as_str()));

        // A fresh instance over the same profile sees the same id.
        assert_eq!(SessionIdentity::new(storage).get_or_create(), first);
    }

    #[test]
    fn existing_stored_id_is_returned_unchanged() {
        let storage = Arc::new(MemoryStore::with_entries([(
            SESSION_ID_KEY,
            "00000000000000000000000000000abc",
        )]));

        assert_eq!(
            SessionIdentity::new(storage).get_or_create(),
            "00000000000000000000000000000abc"
        );
    }

    #[test]
    fn unavailable_storage_degrades_to_stable_in_memory_id() {
        let identity = SessionIdentity::new(Arc::new(UnavailableStore));

        let first = identity.get_or_create();
        assert!(is_session_id(&first));
        assert_eq!(identity.get_or_create(), first);
    }
}
