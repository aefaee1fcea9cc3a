use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::protocol::Reply;
use super::session::{InterviewSession, SessionId, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} already has an active connection")]
    AlreadyActive(SessionId),
    #[error("Session not found")]
    NotFound(SessionId),
}

/// Handle held by the task serving one connection.
///
/// A lease only grants access to session state while the registry still maps
/// the session to the same connection.
#[derive(Debug, Clone)]
pub struct SessionLease {
    session_id: SessionId,
    connection_id: u64,
    outbound: mpsc::Sender<Reply>,
    cancel: CancellationToken,
}

impl SessionLease {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Queues a reply for the socket writer. Returns `false` once the writer is gone.
    pub async fn send(&self, reply: Reply) -> bool {
        self.outbound.send(reply).await.is_ok()
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[cfg(test)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

struct StreamHandle {
    connection_id: u64,
    outbound: mpsc::Sender<Reply>,
    cancel: CancellationToken,
}

struct SessionSlot {
    connection_id: u64,
    state: InterviewSession,
}

#[derive(Default)]
struct RegistryMaps {
    streams: HashMap<SessionId, StreamHandle>,
    sessions: HashMap<SessionId, SessionSlot>,
}

/// Process-wide map of live streams and their session state.
///
/// Both maps sit behind one lock so a session id is either fully registered or
/// fully absent.
#[derive(Default)]
pub struct SessionRegistry {
    maps: Mutex<RegistryMaps>,
    next_connection: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stream and fresh state for `session_id`, rejecting a second live connection.
    pub fn connect(
        &self,
        session_id: SessionId,
        outbound: mpsc::Sender<Reply>,
        now: DateTime<Utc>,
    ) -> Result<SessionLease, SessionError> {
        let mut maps = self.maps.lock().expect("session registry mutex poisoned");
        if maps.streams.contains_key(&session_id) || maps.sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyActive(session_id));
        }

        let connection_id = self.next_connection.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        maps.streams.insert(
            session_id.clone(),
            StreamHandle {
                connection_id,
                outbound: outbound.clone(),
                cancel: cancel.clone(),
            },
        );
        maps.sessions.insert(
            session_id.clone(),
            SessionSlot {
                connection_id,
                state: InterviewSession::new(session_id.clone(), now),
            },
        );

        Ok(SessionLease {
            session_id,
            connection_id,
            outbound,
            cancel,
        })
    }

    /// Runs `f` against the session if `lease` still owns it.
    pub fn with_session<T>(
        &self,
        lease: &SessionLease,
        f: impl FnOnce(&mut InterviewSession) -> T,
    ) -> Option<T> {
        let mut maps = self.maps.lock().expect("session registry mutex poisoned");
        maps.sessions
            .get_mut(&lease.session_id)
            .filter(|slot| slot.connection_id == lease.connection_id)
            .map(|slot| f(&mut slot.state))
    }

    /// Removes the stream and session owned by `lease`, handing back the state.
    pub fn take(&self, lease: &SessionLease) -> Option<InterviewSession> {
        let taken = {
            let mut maps = self.maps.lock().expect("session registry mutex poisoned");
            Self::remove_owned(&mut maps, lease)
        };
        lease.cancel.cancel();
        taken
    }

    /// Idempotent teardown. Entries registered by a newer connection are left alone.
    pub fn disconnect(&self, lease: &SessionLease) -> bool {
        self.take(lease).is_some()
    }

    fn remove_owned(maps: &mut RegistryMaps, lease: &SessionLease) -> Option<InterviewSession> {
        let owned = maps
            .sessions
            .get(&lease.session_id)
            .is_some_and(|slot| slot.connection_id == lease.connection_id);
        if !owned {
            return None;
        }
        if maps
            .streams
            .get(&lease.session_id)
            .is_some_and(|stream| stream.connection_id == lease.connection_id)
        {
            maps.streams.remove(&lease.session_id);
        }
        maps.sessions
            .remove(&lease.session_id)
            .map(|slot| slot.state)
    }

    pub fn status(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<SessionStatus, SessionError> {
        let maps = self.maps.lock().expect("session registry mutex poisoned");
        let slot = maps
            .sessions
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        let is_active = maps
            .streams
            .get(session_id)
            .is_some_and(|stream| !stream.outbound.is_closed());
        Ok(slot.state.status(is_active, now))
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        let maps = self.maps.lock().expect("session registry mutex poisoned");
        maps.sessions.contains_key(session_id)
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        let maps = self.maps.lock().expect("session registry mutex poisoned");
        let mut ids: Vec<_> = maps.streams.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        let maps = self.maps.lock().expect("session registry mutex poisoned");
        maps.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancels every live connection and drops all state. Returns how many sessions were closed.
    pub fn close_all(&self) -> usize {
        let (streams, closed) = {
            let mut maps = self.maps.lock().expect("session registry mutex poisoned");
            let streams: Vec<_> = maps.streams.drain().map(|(_, stream)| stream).collect();
            let closed = maps.sessions.len();
            maps.sessions.clear();
            (streams, closed)
        };
        for stream in streams {
            stream.cancel.cancel();
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<Reply>, mpsc::Receiver<Reply>) {
        mpsc::channel(8)
    }

    #[test]
    fn second_connection_for_live_session_is_rejected() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = channel();
        let first = registry
            .connect(SessionId::from("s-1"), tx.clone(), Utc::now())
            .expect("first connect");

        let err = registry
            .connect(SessionId::from("s-1"), tx, Utc::now())
            .expect_err("duplicate rejected");
        assert_eq!(err, SessionError::AlreadyActive(SessionId::from("s-1")));
        assert!(!first.is_cancelled());
        assert!(registry
            .with_session(&first, |session| session.add_note("면접관_1", "still here", 1.0))
            .is_some());
    }

    #[test]
    fn disconnect_is_idempotent_and_cancels_the_lease() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = channel();
        let lease = registry
            .connect(SessionId::from("s-2"), tx, Utc::now())
            .expect("connect");

        assert!(registry.disconnect(&lease));
        assert!(lease.is_cancelled());
        assert!(!registry.disconnect(&lease));
        assert!(registry.is_empty());
        assert!(registry.with_session(&lease, |_| ()).is_none());
    }

    #[test]
    fn stale_lease_cannot_touch_a_reconnected_session() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = channel();
        let stale = registry
            .connect(SessionId::from("s-3"), tx.clone(), Utc::now())
            .expect("connect");
        registry.disconnect(&stale);

        let fresh = registry
            .connect(SessionId::from("s-3"), tx, Utc::now())
            .expect("reconnect after teardown");
        assert_ne!(stale.connection_id(), fresh.connection_id());

        assert!(registry.with_session(&stale, |_| ()).is_none());
        assert!(!registry.disconnect(&stale));
        assert!(registry.contains(&SessionId::from("s-3")));
        assert!(!fresh.is_cancelled());
    }

    #[test]
    fn status_reports_writer_liveness() {
        let registry = SessionRegistry::new();
        let (tx, rx) = channel();
        registry
            .connect(SessionId::from("s-4"), tx, Utc::now())
            .expect("connect");

        let id = SessionId::from("s-4");
        assert!(registry.status(&id, Utc::now()).expect("status").is_active);
        drop(rx);
        assert!(!registry.status(&id, Utc::now()).expect("status").is_active);

        let missing = registry
            .status(&SessionId::from("nope"), Utc::now())
            .expect_err("unknown session");
        assert_eq!(missing.to_string(), "Session not found");
    }

    #[test]
    fn close_all_cancels_every_connection() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = channel();
        let a = registry
            .connect(SessionId::from("a"), tx.clone(), Utc::now())
            .expect("connect a");
        let b = registry
            .connect(SessionId::from("b"), tx, Utc::now())
            .expect("connect b");
        assert_eq!(
            registry.active_sessions(),
            vec![SessionId::from("a"), SessionId::from("b")]
        );

        assert_eq!(registry.close_all(), 2);
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(registry.is_empty());
    }
}
