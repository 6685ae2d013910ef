//! Per-client session state: the authenticated identity, the backend
//! connections currently held open on its behalf, the statements that must
//! be replayed to newly joined backends, and the in-flight transaction log
//! used for replay after a backend failure.

use crate::backend::backend_mgr::{BackendMgr, ConnectionIdentity, PoolKey};
use crate::backend::pool::pooled_conn_mgr::PooledConnMgr;
use crate::backend::router::TargetRole;
use crate::error::{Error, Result};
use crate::protocol::mysql::constants::CommandCode;
use crate::replay::{self, TransactionLog};
use crate::router::{ResponseAction, RouteDecision, RouteState};

use common::metrics::metric_def::{
    MXCORE_POOL_WAIT_SECONDS, MXCORE_ROUTER_RETRIES_TOTAL, MXCORE_SESSION_COMMAND_REPLICATIONS_TOTAL,
};
use common::metrics::{counter_inc, MetricsTimer};
use deadpool::managed::{Object, Pool};
use std::collections::HashMap;
use std::io::Write;
use std::ops::DerefMut;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Routing decisions are retried against the router this many times before
/// `acquire_backend` gives up; a retry re-asks the balancer for a candidate,
/// it does not target a specific excluded backend.
const MAX_ROUTING_ATTEMPTS: u32 = 3;

/// A statement that changed session-wide state (`SET`, `USE`, named
/// `PREPARE`) and must therefore be replayed against any backend the
/// session later connects to, not just the one it originally ran on.
#[derive(Debug, Clone)]
pub struct SessionCommand {
    pub statement: Vec<u8>,
}

/// Authenticated identity plus routing/session state for one client
/// connection. A `Session` is created once per accepted connection and
/// lives for its duration; it is driven by the per-connection server loop,
/// not shared across threads.
pub struct Session {
    pub id: u64,
    pub user: String,
    pub default_db: Option<String>,
    password: Vec<u8>,
    conn_attrs: Vec<(String, String)>,
    backend_mgr: Arc<BackendMgr>,
    route_state: RouteState,
    session_commands: Vec<SessionCommand>,
    /// How many of `session_commands` have already been replayed onto a
    /// given physical connection, keyed by `PooledConn::id`. `recycle()`
    /// wipes backend-side session state on every pool checkout (it issues
    /// `COM_RESET_CONNECTION`), so a connection handed back out of the pool
    /// always needs catching up, even if this session used it before.
    replicated_commands: HashMap<String, usize>,
    transaction_log: TransactionLog,
    /// Pool key a write/transaction is currently pinned to, once selected,
    /// so that every statement in a transaction reaches the same backend
    /// rather than being rebalanced mid-transaction.
    pinned_master_key: Option<PoolKey>,
}

impl Session {
    pub fn new(
        user: impl Into<String>,
        default_db: Option<String>,
        password: &[u8],
        conn_attrs: &[(&str, &str)],
        backend_mgr: Arc<BackendMgr>,
        transaction_replay_max_size: usize,
    ) -> Self {
        Self {
            id: next_session_id(),
            user: user.into(),
            default_db,
            password: password.to_vec(),
            conn_attrs: conn_attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            backend_mgr,
            route_state: RouteState::new(),
            session_commands: Vec::new(),
            replicated_commands: HashMap::new(),
            transaction_log: TransactionLog::new(transaction_replay_max_size),
            pinned_master_key: None,
        }
    }

    fn identity<'a>(&'a self, conn_attrs_buf: &'a mut Vec<(&'a str, &'a str)>) -> ConnectionIdentity<'a> {
        conn_attrs_buf.extend(self.conn_attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        ConnectionIdentity {
            user: &self.user,
            password: &self.password,
            default_db: self.default_db.clone(),
            conn_attrs: conn_attrs_buf,
        }
    }

    pub fn transaction_log(&self) -> &TransactionLog {
        &self.transaction_log
    }

    pub fn in_transaction(&self) -> bool {
        self.route_state.in_transaction()
    }

    /// Record a statement that must be replicated to every backend the
    /// session touches from now on (e.g. `SET SESSION ...`).
    fn remember_session_command(&mut self, statement: &[u8]) {
        self.session_commands.push(SessionCommand {
            statement: statement.to_vec(),
        });
    }

    pub fn session_commands(&self) -> &[SessionCommand] {
        &self.session_commands
    }

    /// Classify `query` and decide which backend role it should be routed
    /// to, opening the transaction log if this statement starts a
    /// transaction. Session-command bookkeeping is deliberately not done
    /// here: it happens in [`Session::record_executed`], once the statement
    /// this very decision is for has actually run, so that
    /// `acquire_backend`'s catch-up replay never re-sends a statement that
    /// hasn't executed anywhere yet.
    pub fn route_query(&mut self, query: &[u8]) -> RouteDecision {
        let decision = self.route_state.route(query);
        if decision.opens_transaction {
            self.transaction_log.begin();
        }
        decision
    }

    /// Call once `query` has successfully executed against the backend
    /// `acquire_backend` returned for `decision`. Folds the statement into
    /// session-command history (if it must be replicated) and releases the
    /// transaction pin (if it just closed one).
    pub fn record_executed(&mut self, query: &[u8], decision: &RouteDecision) {
        if decision.replicate_session_wide {
            self.remember_session_command(query);
        }
        if decision.closes_transaction {
            self.clear_transaction_pin();
        }
    }

    /// Ask the router for a candidate backend for `role`, retrying a bounded
    /// number of times if the router or pool setup fails transiently.
    async fn connect_to_backend_with_retry(
        &self,
        role: TargetRole,
    ) -> Result<(PoolKey, Pool<PooledConnMgr>)> {
        let mut attrs_buf = Vec::new();
        let identity = self.identity(&mut attrs_buf);
        let mut last_err = None;
        for attempt in 0..MAX_ROUTING_ATTEMPTS {
            if attempt > 0 {
                counter_inc(MXCORE_ROUTER_RETRIES_TOTAL, 1, None);
            }
            match self.backend_mgr.connect_to_backend(role, &identity).await {
                Ok(pair) => return Ok(pair),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.expect("loop runs at least once"))
    }

    /// Acquire a pooled connection handle for the role a routing decision
    /// picked. Transactions stay pinned to the master pool key they first
    /// acquired so every statement lands on the same physical connection.
    /// Before handing the connection back, replays any session commands
    /// this session has accumulated that the connection hasn't seen yet.
    pub async fn acquire_backend(&mut self, decision: &RouteDecision) -> Result<Object<PooledConnMgr>> {
        let pool = if decision.role == TargetRole::Master && self.in_transaction() {
            if let Some(key) = self.pinned_master_key.clone() {
                self.backend_mgr.connect_with_key(&key).await?
            } else {
                let (key, pool) = self.connect_to_backend_with_retry(decision.role).await?;
                self.pinned_master_key = Some(key);
                pool
            }
        } else {
            let (_key, pool) = self.connect_to_backend_with_retry(decision.role).await?;
            pool
        };
        let conn = {
            let _wait_timer = MetricsTimer::new(MXCORE_POOL_WAIT_SECONDS);
            pool.get().await.map_err(|e| Error::PoolExhausted {
                backend: format!("{e}"),
            })?
        };
        self.replay_session_commands(&conn).await?;
        Ok(conn)
    }

    /// Re-issue the suffix of `session_commands` this connection hasn't run
    /// yet. A connection freshly pulled from the pool may have had its
    /// session state reset by `recycle()`'s `COM_RESET_CONNECTION`, or may
    /// simply never have been touched by this session before.
    async fn replay_session_commands(&mut self, conn: &Object<PooledConnMgr>) -> Result<()> {
        let applied = self.replicated_commands.get(&conn.id).copied().unwrap_or(0);
        if applied >= self.session_commands.len() {
            return Ok(());
        }
        let pending: Vec<Vec<u8>> = self.session_commands[applied..]
            .iter()
            .map(|c| c.statement.clone())
            .collect();

        let mut guard = conn.inner_conn.lock().await;
        let (backend_reader, backend_writer) = guard.deref_mut();
        backend_writer.reset_seq();
        for statement in &pending {
            backend_writer.write_all(&[CommandCode::ComQuery as u8])?;
            backend_writer.write_all(statement)?;
            backend_writer.end_packet().await?;
            backend_writer.flush_all().await?;
            replay::read_logical_response(backend_reader).await?;
        }
        drop(guard);

        self.replicated_commands
            .insert(conn.id.clone(), self.session_commands.len());
        counter_inc(MXCORE_SESSION_COMMAND_REPLICATIONS_TOTAL, pending.len() as u64, None);
        Ok(())
    }

    /// Release the transaction pin once a transaction ends.
    pub fn clear_transaction_pin(&mut self) {
        self.pinned_master_key = None;
    }

    /// Record a statement's checksum in the transaction log while it is
    /// still live, so it can later be replayed if the backend is lost.
    pub fn log_transaction_statement(&mut self, statement: &[u8], result_checksum: u128) {
        if self.in_transaction() {
            self.transaction_log.record(statement, result_checksum);
        }
    }

    pub fn response_action_for(&self, decision: &RouteDecision) -> ResponseAction {
        decision.response
    }
}

/// Process-wide registry of live sessions, keyed by session id, used by the
/// admin surface to report connection counts and by housekeeping tasks that
/// need to sweep idle sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<u64, SessionSummary>,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: u64,
    pub user: String,
    pub in_transaction: bool,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, summary: SessionSummary) {
        debug!(session = summary.id, user = %summary.user, "session registered");
        self.sessions.insert(summary.id, summary);
    }

    pub fn unregister(&mut self, id: u64) {
        if self.sessions.remove(&id).is_some() {
            info!(session = id, "session closed");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &SessionSummary> {
        self.sessions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_tracks_add_and_remove() {
        let mut registry = SessionRegistry::new();
        registry.register(SessionSummary {
            id: 1,
            user: "root".into(),
            in_transaction: false,
        });
        assert_eq!(registry.len(), 1);
        registry.unregister(1);
        assert!(registry.is_empty());
    }

    #[test]
    fn session_command_is_remembered_only_after_execution() {
        let backend_mgr_options = crate::backend::backend_mgr::BackendManagerOptions::default();
        let router = crate::backend::router::new_static_router(Default::default());
        let mgr = crate::backend::backend_mgr::get_or_init_backend_mgr(router, backend_mgr_options);
        let mut session = Session::new("root", None, b"secret", &[], mgr, 1 << 20);
        let statement = b"SET SESSION sql_mode = 'STRICT_ALL_TABLES'";
        let decision = session.route_query(statement);
        assert!(session.session_commands().is_empty());
        session.record_executed(statement, &decision);
        assert_eq!(session.session_commands().len(), 1);
    }

    #[test]
    fn closing_a_transaction_clears_the_master_pin() {
        let backend_mgr_options = crate::backend::backend_mgr::BackendManagerOptions::default();
        let router = crate::backend::router::new_static_router(Default::default());
        let mgr = crate::backend::backend_mgr::get_or_init_backend_mgr(router, backend_mgr_options);
        let mut session = Session::new("root", None, b"secret", &[], mgr, 1 << 20);
        session.pinned_master_key = Some(PoolKey::new("s1", "root", b"secret", None, &[]));
        let decision = session.route_query(b"COMMIT");
        session.record_executed(b"COMMIT", &decision);
        assert!(session.pinned_master_key.is_none());
    }
}
