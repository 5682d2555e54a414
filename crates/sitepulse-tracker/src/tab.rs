use std::sync::Mutex;

use sitepulse_core::identity::{self, ClientEnv};

/// Tab-scoped storage model: the keys a browser keeps for the tab lifetime
/// are a visitor id, a session id, and the "session active" marker.
///
/// Lives exactly as long as the owning tracker. Cleared keys regenerate on
/// next access, which is what a real storage clear does to the identity
/// scheme: the visitor comes back with a fresh id.
#[derive(Default)]
pub struct TabStorage {
    inner: Mutex<Keys>,
}

#[derive(Default)]
struct Keys {
    visitor_id: Option<String>,
    session_id: Option<String>,
    session_active_since_ms: Option<i64>,
}

impl TabStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable for the storage lifetime; generated on first access and reused
    /// verbatim thereafter (never recomputed from the environment).
    pub fn visitor_id(&self, env: &ClientEnv) -> String {
        let mut keys = self.lock();
        keys.visitor_id
            .get_or_insert_with(|| identity::generate_visitor_id(env))
            .clone()
    }

    /// Seeded fresh on first call per storage lifetime, reused thereafter.
    pub fn session_id(&self) -> String {
        let mut keys = self.lock();
        keys.session_id
            .get_or_insert_with(identity::generate_session_id)
            .clone()
    }

    /// Set the session-active marker. Returns true when this is the first
    /// page view observed in the tab session.
    pub fn begin_page_view(&self, now_ms: i64) -> bool {
        let mut keys = self.lock();
        let is_new_session = keys.session_active_since_ms.is_none();
        keys.session_active_since_ms = Some(now_ms);
        is_new_session
    }

    /// Remove all three keys.
    pub fn clear(&self) {
        *self.lock() = Keys::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Keys> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
