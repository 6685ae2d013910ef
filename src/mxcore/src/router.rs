//! Read-write-split routing policy: decides, per statement, whether it goes
//! to the master or a slave, tracks which backends currently hold
//! transaction or session state, and decides how a backend's reply should
//! be handled (forwarded to the client, swallowed, or none expected).
//!
//! This sits above [`crate::backend::router`], which only knows how to pick
//! a candidate backend for a role; this module decides which role a given
//! statement needs and what session-wide bookkeeping the decision implies.

use crate::backend::router::TargetRole;
use crate::classifier::{self, TypeMask};

/// What to do with the backend's reply to a forwarded statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    /// Forward the reply to the client as normal.
    ExpectClientBound,
    /// Wait for the reply but discard it; used for session commands mirrored
    /// to backends other than the one the client is actively talking to.
    Ignore,
    /// No reply is expected for this request at all.
    NoResponse,
}

/// A routing decision for one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision {
    pub role: TargetRole,
    pub response: ResponseAction,
    /// Statement must also be replayed against every other backend with
    /// live session state (`SET`, `USE`, prepared statement registration).
    pub replicate_session_wide: bool,
    pub opens_transaction: bool,
    pub closes_transaction: bool,
}

/// Tracks whether the session currently has an open transaction, which
/// pins all statements to the master connection regardless of their own
/// read/write classification until the transaction ends.
#[derive(Debug, Default)]
pub struct RouteState {
    in_transaction: bool,
    /// Set once a write has been seen inside the current transaction; a
    /// transaction that only read so far may still be migrated to a slave
    /// connection if the master is lost, an "optimistic transaction".
    transaction_has_written: bool,
}

impl RouteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn transaction_has_written(&self) -> bool {
        self.transaction_has_written
    }

    /// Decide where a client statement should be routed and how its
    /// response should be treated, updating the transaction tracking state.
    pub fn route(&mut self, query: &[u8]) -> RouteDecision {
        let mask = classifier::classify(query);
        self.route_mask(mask)
    }

    pub fn route_mask(&mut self, mask: TypeMask) -> RouteDecision {
        let opens_transaction = mask.contains(TypeMask::BEGIN_TRX);
        let closes_transaction = mask.contains(TypeMask::COMMIT) || mask.contains(TypeMask::ROLLBACK);

        if opens_transaction {
            self.in_transaction = true;
            self.transaction_has_written = false;
        }

        let pinned_to_master = self.in_transaction || mask.is_write();
        if self.in_transaction && mask.is_write() {
            self.transaction_has_written = true;
        }

        let role = if pinned_to_master {
            TargetRole::Master
        } else {
            TargetRole::Slave
        };

        let decision = RouteDecision {
            role,
            response: ResponseAction::ExpectClientBound,
            replicate_session_wide: mask.must_replicate_session_wide(),
            opens_transaction,
            closes_transaction,
        };

        if closes_transaction {
            self.in_transaction = false;
            self.transaction_has_written = false;
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_select_goes_to_a_slave() {
        let mut state = RouteState::new();
        let decision = state.route(b"SELECT * FROM t");
        assert_eq!(decision.role, TargetRole::Slave);
    }

    #[test]
    fn plain_write_goes_to_master() {
        let mut state = RouteState::new();
        let decision = state.route(b"INSERT INTO t VALUES (1)");
        assert_eq!(decision.role, TargetRole::Master);
    }

    #[test]
    fn statements_inside_a_transaction_stay_on_master_even_if_reads() {
        let mut state = RouteState::new();
        assert!(state.route(b"BEGIN").opens_transaction);
        let decision = state.route(b"SELECT * FROM t");
        assert_eq!(decision.role, TargetRole::Master);
        assert!(state.in_transaction());
    }

    #[test]
    fn commit_ends_transaction_pinning() {
        let mut state = RouteState::new();
        state.route(b"BEGIN");
        state.route(b"SELECT 1");
        let decision = state.route(b"COMMIT");
        assert!(decision.closes_transaction);
        assert!(!state.in_transaction());
        let after = state.route(b"SELECT 1");
        assert_eq!(after.role, TargetRole::Slave);
    }

    #[test]
    fn read_only_transaction_is_optimistic_until_a_write_happens() {
        let mut state = RouteState::new();
        state.route(b"BEGIN");
        state.route(b"SELECT 1");
        assert!(!state.transaction_has_written());
        state.route(b"UPDATE t SET v = 1");
        assert!(state.transaction_has_written());
    }

    #[test]
    fn set_session_must_replicate_to_other_backends() {
        let mut state = RouteState::new();
        let decision = state.route(b"SET SESSION sql_mode = 'STRICT_ALL_TABLES'");
        assert!(decision.replicate_session_wide);
    }
}
