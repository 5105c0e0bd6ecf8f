//! Multiplexed transport sessions.
//!
//! Any number of long-lived channels may be open at once, each identified
//! by an opaque session token. A session is a pure routing record — an id
//! and the sink responses are delivered on. All sessions feed the same
//! dispatcher and therefore the same single emulator: concurrent sessions
//! are concurrent viewers/controllers of one shared machine, not isolated
//! instances.
//!
//! The HTTP front end that carries these channels is an external
//! collaborator; it calls [`SessionHub::open`] when a peer connects,
//! [`SessionHub::post`] for each command tagged with a session id, and
//! [`SessionHub::close`] when the peer goes away.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde_json::Value as JsonValue;

use gb_engine::Engine;

use crate::dispatch::Dispatcher;
use crate::error::SessionError;
use crate::mcp::RpcResponse;

/// Event name carried in the channel handshake.
pub const HANDSHAKE_EVENT: &str = "endpoint";

/// Event name carried by every command response.
pub const MESSAGE_EVENT: &str = "message";

/// Opaque session token. Unique within the process for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn alloc(n: u64) -> Self {
        Self(format!("{n:016x}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// Routing record for one open channel.
struct Session {
    sink: Box<dyn Write + Send>,
}

/// Registry of open sessions, bound to the shared dispatcher.
///
/// The registry has its own lock, distinct from the dispatcher's: resolving
/// or closing a session never contends with a running command, and a
/// command's frame loop never runs under the registry lock.
pub struct SessionHub<E: Engine> {
    dispatcher: Arc<Mutex<Dispatcher<E>>>,
    sessions: Mutex<HashMap<SessionId, Session>>,
    next_id: AtomicU64,
}

impl<E: Engine> SessionHub<E> {
    #[must_use]
    pub fn new(dispatcher: Arc<Mutex<Dispatcher<E>>>) -> Self {
        Self {
            dispatcher,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a session for a newly established channel.
    ///
    /// Emits the handshake event carrying the assigned id on the sink, then
    /// registers the session. A sink that fails during the handshake never
    /// becomes a session.
    pub fn open(&self, mut sink: Box<dyn Write + Send>) -> Result<SessionId, SessionError> {
        let id = SessionId::alloc(self.next_id.fetch_add(1, Ordering::Relaxed));

        write_event(&mut sink, HANDSHAKE_EVENT, &format!("?sessionId={id}"))
            .map_err(|_| SessionError::Closed)?;

        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(id.clone(), Session { sink });
        info!("session {id} opened");
        Ok(id)
    }

    /// Dispatch a command for a session and deliver the response on its
    /// channel.
    ///
    /// Commands tagged with an unknown or expired id fail immediately —
    /// they are not queued or retried. A sink that fails mid-write closes
    /// the session.
    pub fn post(
        &self,
        id: &SessionId,
        method: &str,
        params: &JsonValue,
        request_id: JsonValue,
    ) -> Result<(), SessionError> {
        if !self.is_open(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }

        // Full command runs under the dispatcher lock only; the registry
        // stays free for other sessions to open and close meanwhile.
        let outcome = self
            .dispatcher
            .lock()
            .expect("dispatcher lock poisoned")
            .dispatch_named(method, params);
        let response = RpcResponse::from_dispatch(request_id, outcome);

        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        let Some(session) = sessions.get_mut(id) else {
            // Closed while the command ran; the response has nowhere to go.
            return Err(SessionError::NotFound(id.to_string()));
        };

        match write_event(&mut session.sink, MESSAGE_EVENT, &response.to_line()) {
            Ok(()) => {
                debug!("session {id}: answered {method}");
                Ok(())
            }
            Err(e) => {
                sessions.remove(id);
                warn!("session {id}: channel failed ({e}), closed");
                Err(SessionError::Closed)
            }
        }
    }

    /// Deregister a session. Returns whether it was open.
    pub fn close(&self, id: &SessionId) -> bool {
        let removed = self
            .sessions
            .lock()
            .expect("session registry lock poisoned")
            .remove(id)
            .is_some();
        if removed {
            info!("session {id} closed");
        }
        removed
    }

    /// Whether a session with this id is currently open.
    #[must_use]
    pub fn is_open(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .contains_key(id)
    }

    /// Number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .len()
    }
}

/// Write one server-sent event frame and flush it.
fn write_event<W: Write>(sink: &mut W, event: &str, data: &str) -> std::io::Result<()> {
    write!(sink, "event: {event}\ndata: {data}\n\n")?;
    sink.flush()
}
