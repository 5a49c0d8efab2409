//! Avatar cache-busting keys
//!
//! Process-wide `user id → cache key` map owned by the application root.
//! The profile-update flow bumps a user's key after an avatar upload;
//! anything rendering avatars asks for the versioned URL.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct AvatarCacheKeys {
    keys: Arc<RwLock<HashMap<String, u64>>>,
}

impl AvatarCacheKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current key; 0 for a user whose avatar never changed in this process
    pub fn key_for(&self, user_id: &str) -> u64 {
        self.keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }

    /// New key for `user_id`, strictly greater than the previous one
    pub fn bump(&self, user_id: &str) -> u64 {
        let mut keys = self.keys.write().unwrap_or_else(|e| e.into_inner());
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let entry = keys.entry(user_id.to_string()).or_insert(0);
        *entry = now.max(*entry + 1);
        debug!(user_id = %user_id, key = *entry, "Avatar cache key bumped");
        *entry
    }

    /// `avatar_url` with the user's cache key appended, when there is one
    pub fn url_for(&self, user_id: &str, avatar_url: &str) -> String {
        match self.key_for(user_id) {
            0 => avatar_url.to_string(),
            key => {
                let separator = if avatar_url.contains('?') { '&' } else { '?' };
                format!("{}{}v={}", avatar_url, separator, key)
            }
        }
    }

    pub fn forget(&self, user_id: &str) {
        self.keys.write().unwrap_or_else(|e| e.into_inner()).remove(user_id);
    }
}
