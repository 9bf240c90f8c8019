//! A single live session and the events emitted over its lifetime.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::protocol::ProtocolEngine;

/// Why a session left the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Client sent DELETE.
    Terminated,
    /// The client's push stream went away.
    TransportClosed,
    /// No traffic within the configured idle timeout.
    Idle,
    /// Server shutdown.
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Terminated => "terminated",
            Self::TransportClosed => "transport closed",
            Self::Idle => "idle",
            Self::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Initialized { id: String },
    Closed { id: String, reason: CloseReason },
}

/// A session: its id, its engine, and activity bookkeeping.
pub struct Session {
    id: String,
    engine: Arc<ProtocolEngine>,
    created_at: DateTime<Utc>,
    last_activity_ms: AtomicI64,
}

impl Session {
    pub fn new(id: String, engine: ProtocolEngine) -> Self {
        let now = Utc::now();
        Self {
            id,
            engine: Arc::new(engine),
            created_at: now,
            last_activity_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn engine(&self) -> &Arc<ProtocolEngine> {
        &self.engine
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        let ms = self.last_activity_ms.load(Ordering::Relaxed);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(self.created_at)
    }

    /// Record traffic on this session.
    pub fn touch(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity()).to_std().unwrap_or_default()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.engine.state())
            .field("created_at", &self.created_at)
            .field("last_activity", &self.last_activity())
            .finish()
    }
}
