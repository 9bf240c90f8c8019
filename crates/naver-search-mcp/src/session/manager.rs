//! Session table: creates, resolves, and closes sessions by id.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::protocol::negotiation::parse_initialize_params;
use crate::protocol::validator::validate_request;
use crate::protocol::ProtocolEngine;
use crate::tools::Dispatcher;
use crate::types::{JsonRpcMessage, McpError, McpResult};

use super::state::{CloseReason, Session, SessionEvent};

type Hook = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Registry of live sessions, shared by every connection.
///
/// Hooks are registered before the manager is shared and are called
/// synchronously, after the table has been updated.
pub struct SessionManager {
    dispatcher: Arc<Dispatcher>,
    sessions: DashMap<String, Arc<Session>>,
    initialized_hooks: Vec<Hook>,
    closed_hooks: Vec<Hook>,
}

impl SessionManager {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            sessions: DashMap::new(),
            initialized_hooks: Vec::new(),
            closed_hooks: Vec::new(),
        }
    }

    pub fn on_session_initialized(&mut self, hook: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        self.initialized_hooks.push(Box::new(hook));
    }

    pub fn on_session_closed(&mut self, hook: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        self.closed_hooks.push(Box::new(hook));
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Route an inbound POST to its session.
    ///
    /// A known id resolves to its session. No id plus a well-formed
    /// `initialize` request with usable params creates a new session.
    /// Anything else is an error and creates nothing.
    pub fn resolve_or_create(
        &self,
        session_id: Option<&str>,
        message: &JsonRpcMessage,
    ) -> McpResult<Arc<Session>> {
        match session_id {
            Some(id) => self.resolve(Some(id)),
            None => {
                let JsonRpcMessage::Request(request) = message else {
                    return Err(McpError::MissingSession);
                };
                if !message.is_initialize_request() {
                    return Err(McpError::MissingSession);
                }
                validate_request(request)?;
                parse_initialize_params(request.params.as_ref())?;
                Ok(self.create())
            }
        }
    }

    /// Look up an existing session and mark it active.
    pub fn resolve(&self, session_id: Option<&str>) -> McpResult<Arc<Session>> {
        let id = session_id.ok_or(McpError::MissingSession)?;
        let session = self
            .get(id)
            .ok_or_else(|| McpError::UnknownSession(id.to_string()))?;
        session.touch();
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn create(&self) -> Arc<Session> {
        // v4 ids carry 122 random bits; collisions are not handled.
        let id = Uuid::new_v4().to_string();
        let engine = ProtocolEngine::new(id.clone(), self.dispatcher.clone());
        let session = Arc::new(Session::new(id.clone(), engine));
        self.sessions.insert(id.clone(), session.clone());

        tracing::info!("New session initialized: {id}");
        self.emit(&self.initialized_hooks, &SessionEvent::Initialized { id });
        session
    }

    /// Remove a session and close its engine. Only the first close of a
    /// given id does anything; later calls return false.
    pub fn close(&self, id: &str, reason: CloseReason) -> bool {
        let Some((id, session)) = self.sessions.remove(id) else {
            return false;
        };
        session.engine().close();

        tracing::info!("Session closed: {id} ({reason})");
        self.emit(&self.closed_hooks, &SessionEvent::Closed { id, reason });
        true
    }

    pub fn close_all(&self, reason: CloseReason) -> usize {
        self.ids()
            .into_iter()
            .filter(|id| self.close(id, reason))
            .count()
    }

    /// Close every session with no traffic for at least `max_idle`.
    pub fn reap_idle(&self, max_idle: Duration) -> Vec<String> {
        let now = Utc::now();
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for(now) >= max_idle)
            .map(|entry| entry.key().clone())
            .collect();

        stale
            .into_iter()
            .filter(|id| self.close(id, CloseReason::Idle))
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn emit(&self, hooks: &[Hook], event: &SessionEvent) {
        for hook in hooks {
            hook(event);
        }
    }
}
