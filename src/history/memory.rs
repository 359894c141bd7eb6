use crate::history::SessionStore;
use crate::models::chat::Session;
use std::sync::Mutex;
use std::sync::atomic::{ AtomicUsize, Ordering };

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
    saves: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            saves: AtomicUsize::new(0),
        }
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Session> {
        self.session
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Session {
        self.stored().unwrap_or_default()
    }

    fn save(&self, session: &Session) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(session.clone());
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }
}
