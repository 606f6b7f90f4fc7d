use anyhow::Result;
use pdf_hub_core::{AppConfig, CombineWorkflow, PdfToolkit};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One browser's combine session
pub struct Session {
    pub workflow: CombineWorkflow,
    pub created_at: Instant,
}

/// Global application state
pub struct AppState {
    /// Active combine sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Engines plus the configuration they were built from
    pub toolkit: Arc<PdfToolkit>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let toolkit = PdfToolkit::new(config)
            .map_err(|e| anyhow::anyhow!("Failed to create toolkit: {e}"))?;

        Ok(Self::with_toolkit(toolkit))
    }

    /// State around an already-built toolkit (custom engines).
    pub fn with_toolkit(toolkit: PdfToolkit) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            toolkit: Arc::new(toolkit),
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.toolkit.config()
    }

    /// Create an empty combine session.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4();
        let session = Session {
            workflow: self.toolkit.combine_workflow(),
            created_at: Instant::now(),
        };

        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    /// Drop sessions older than the configured TTL; returns how many went.
    ///
    /// A session in the middle of a merge is kept until the merge finishes.
    pub async fn cleanup_old_sessions(&self) -> usize {
        let max_age = Duration::from_secs(self.config().server.session_ttl_secs);
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, session| {
            session.workflow.is_merging() || now.duration_since(session.created_at) < max_age
        });

        before - sessions.len()
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Locks are only taken inside the synchronous closures passed to
/// [`with_session`](Self::with_session) and
/// [`with_session_mut`](Self::with_session_mut), so no guard is ever held
/// across an `.await` (the merge itself runs with the lock released).
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}
