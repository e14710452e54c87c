use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use folio_core::{ChatWidget, FolioConfig};
use folio_provider::GenerationBackend;
use folio_schema::PortfolioProfile;
use uuid::Uuid;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub profile: Arc<PortfolioProfile>,
    pub backend: Arc<dyn GenerationBackend>,
    /// Overrides the default greeting for new sessions.
    pub greeting: Option<String>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        profile: Arc<PortfolioProfile>,
        backend: Arc<dyn GenerationBackend>,
        config: &FolioConfig,
    ) -> Self {
        Self {
            profile,
            backend,
            greeting: config.greeting.clone(),
            sessions: Arc::new(
                SessionStore::new(i64::try_from(config.server.session_ttl_secs).unwrap_or(i64::MAX))
                    .with_max_sessions(config.server.max_sessions),
            ),
        }
    }

    pub fn new_widget(&self) -> ChatWidget {
        match &self.greeting {
            Some(greeting) => ChatWidget::new(self.profile.clone(), self.backend.clone(), greeting),
            None => ChatWidget::with_default_greeting(self.profile.clone(), self.backend.clone()),
        }
    }
}

struct SessionEntry {
    widget: Arc<ChatWidget>,
    last_active: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, ttl_seconds: i64) -> bool {
        let elapsed = Utc::now() - self.last_active;
        elapsed.num_seconds() >= ttl_seconds
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// In-memory chat sessions keyed by id. Nothing is persisted; a session lives
/// until it is deleted or sits idle past the TTL.
pub struct SessionStore {
    entries: Mutex<HashMap<Uuid, SessionEntry>>,
    ttl_seconds: i64,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_seconds,
            max_sessions: usize::MAX,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Stores a new session. At capacity, idle sessions are swept first;
    /// `None` when the store is still full.
    pub fn insert(&self, widget: ChatWidget) -> Option<(Uuid, Arc<ChatWidget>)> {
        let mut entries = self.entries();
        if entries.len() >= self.max_sessions {
            entries.retain(|_, entry| !entry.is_expired(self.ttl_seconds));
            if entries.len() >= self.max_sessions {
                tracing::warn!(max = self.max_sessions, "session limit reached");
                return None;
            }
        }
        let id = Uuid::new_v4();
        let widget = Arc::new(widget);
        entries.insert(
            id,
            SessionEntry {
                widget: widget.clone(),
                last_active: Utc::now(),
            },
        );
        Some((id, widget))
    }

    /// Looks up a live session and refreshes its idle timer.
    pub fn get(&self, id: &Uuid) -> Option<Arc<ChatWidget>> {
        let mut entries = self.entries();
        let entry = entries.get_mut(id)?;
        if entry.is_expired(self.ttl_seconds) {
            entries.remove(id);
            return None;
        }
        entry.touch();
        Some(entry.widget.clone())
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.entries().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops idle sessions, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl_seconds));
        before - entries.len()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
