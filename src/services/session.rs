use std::sync::RwLock;

use tracing::info;

/// Source of the signed-in user. Provider internals live outside this crate.
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
    fn sign_out(&self);
}

/// In-process session holder used by the desktop shell and in tests.
#[derive(Debug, Default)]
pub struct LocalSession {
    user_id: RwLock<Option<String>>,
}

impl LocalSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(target: "app::session", %user_id, "session started");
        if let Ok(mut guard) = self.user_id.write() {
            *guard = Some(user_id);
        }
    }
}

impl SessionProvider for LocalSession {
    fn current_user(&self) -> Option<String> {
        self.user_id.read().ok().and_then(|guard| guard.clone())
    }

    fn sign_out(&self) {
        info!(target: "app::session", "session ended");
        if let Ok(mut guard) = self.user_id.write() {
            *guard = None;
        }
    }
}
