pub mod backend_mgr;
pub mod pool;
pub mod router;

bitflags::bitflags! {
    /// Server status bitmask, the process-wide read-mostly state a monitor
    /// publishes and every session/router only reads.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct ServerStatus: u32 {
        const RUNNING   = 1 << 0;
        const MASTER    = 1 << 1;
        const SLAVE     = 1 << 2;
        const RELAY     = 1 << 3;
        const MAINT     = 1 << 4;
        const DISK_LOW  = 1 << 5;
        const AUTH_OK   = 1 << 6;
    }
}

impl Default for ServerStatus {
    fn default() -> Self {
        ServerStatus::empty()
    }
}

/// A statically- or monitor-discovered backend server.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BackendInstance {
    pub id: String,
    pub addr: String,
    pub status: ServerStatus,
}

impl BackendInstance {
    pub fn new(id: impl Into<String>, addr: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            status,
        }
    }

    pub fn is_usable_for_write(&self) -> bool {
        self.status.contains(ServerStatus::RUNNING | ServerStatus::MASTER)
            && !self.status.contains(ServerStatus::MAINT)
    }

    pub fn is_usable_for_read(&self) -> bool {
        self.status.contains(ServerStatus::RUNNING)
            && self
                .status
                .intersects(ServerStatus::MASTER | ServerStatus::SLAVE | ServerStatus::RELAY)
            && !self.status.contains(ServerStatus::MAINT)
    }
}

/// How far a pooled connection has progressed through the MySQL handshake,
/// used to decide whether a connection pulled from the pool still needs the
/// session-command replay prefix applied before it can carry a command.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum DbConnPhase {
    None,
    Connection,
    Command,
}

#[derive(Default, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DbUserConnLifeCycle {
    db_user: Option<String>,
    conn_phase: Option<DbConnPhase>,
}

impl DbUserConnLifeCycle {
    pub fn is_none(&self) -> bool {
        self.db_user.is_none() && self.conn_phase.is_none()
    }

    pub fn new_conn_life_cycle(db_user: String, conn_phase: DbConnPhase) -> Self {
        Self {
            db_user: Some(db_user),
            conn_phase: Some(conn_phase),
        }
    }

    pub fn conn_phase(&self) -> Option<DbConnPhase> {
        self.conn_phase.clone()
    }

    pub fn db_user(&self) -> Option<String> {
        self.db_user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_status_is_usable_for_both_read_and_write() {
        let s = BackendInstance::new("s1", "127.0.0.1:3306", ServerStatus::RUNNING | ServerStatus::MASTER);
        assert!(s.is_usable_for_write());
        assert!(s.is_usable_for_read());
    }

    #[test]
    fn maintenance_status_excludes_server_from_routing() {
        let s = BackendInstance::new(
            "s2",
            "127.0.0.1:3307",
            ServerStatus::RUNNING | ServerStatus::SLAVE | ServerStatus::MAINT,
        );
        assert!(!s.is_usable_for_read());
        assert!(!s.is_usable_for_write());
    }
}
