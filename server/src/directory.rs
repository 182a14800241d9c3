use crate::config::ConnectionSettings;
use crate::session::{Session, Unseated};
use log::{debug, info};
use shared::Slot;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;

/// Registry of live sessions.
///
/// Session ids are handed out in increasing order and never reused. Lookups
/// scan in id order, so new clients fill the oldest session with a free slot.
pub struct SessionDirectory {
    settings: ConnectionSettings,
    inner: Mutex<DirectoryState>,
}

struct DirectoryState {
    sessions: BTreeMap<u64, Arc<Session>>,
    next_id: u64,
}

impl SessionDirectory {
    pub fn new(settings: ConnectionSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            inner: Mutex::new(DirectoryState {
                sessions: BTreeMap::new(),
                next_id: 0,
            }),
        })
    }

    /// Returns the first session with a free slot, creating a new one when
    /// every existing session is full.
    pub async fn find_or_create(self: &Arc<Self>) -> Arc<Session> {
        let mut inner = self.inner.lock().await;

        for session in inner.sessions.values() {
            if session.is_joinable().await {
                return Arc::clone(session);
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let session = Session::new(id, Arc::downgrade(self), self.settings);
        inner.sessions.insert(id, Arc::clone(&session));
        info!("Created session {} ({} active)", id, inner.sessions.len());

        session
    }

    /// Seats a newly accepted client in some session.
    ///
    /// A client never gets turned away: if the picked session filled up or
    /// was torn down before the client got in, another one is picked.
    pub async fn assign<S>(self: &Arc<Self>, stream: S) -> (u64, Slot)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let session = self.find_or_create().await;
        self.assign_from(session, stream).await
    }

    async fn assign_from<S>(
        self: &Arc<Self>,
        mut session: Arc<Session>,
        mut stream: S,
    ) -> (u64, Slot)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        loop {
            match session.seat(stream).await {
                Ok(slot) => return (session.id(), slot),
                Err(Unseated::Full(returned)) => {
                    debug!("Session {} filled up while joining, retrying", session.id());
                    stream = returned;
                }
                Err(Unseated::Retired(returned)) => {
                    debug!(
                        "Session {} was torn down while joining, retrying",
                        session.id()
                    );
                    stream = returned;
                }
            }
            session = self.find_or_create().await;
        }
    }

    /// Forgets a session. Removing an unknown id does nothing.
    pub async fn remove(&self, id: u64) {
        let mut inner = self.inner.lock().await;
        if inner.sessions.remove(&id).is_some() {
            info!(
                "Removed session {} ({} active)",
                id,
                inner.sessions.len()
            );
        }
    }

    pub async fn get(&self, id: u64) -> Option<Arc<Session>> {
        self.inner.lock().await.sessions.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.sessions.is_empty()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.inner.lock().await.sessions.contains_key(&id)
    }

    pub async fn session_ids(&self) -> Vec<u64> {
        self.inner.lock().await.sessions.keys().copied().collect()
    }
}
