//! Administrative command surface: server/listener/service mutation
//! commands and the JSON:API observable-state documents a collaborating
//! HTTP layer serializes and returns. This module only owns the
//! request/response shapes and the state mutations; it does not bind a
//! socket itself.

use crate::backend::router::{BackendRouter, BackendRouterKind};
use crate::backend::{BackendInstance, ServerStatus};
use crate::error::{Error, Result};
use crate::session::SessionRegistry;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// `set server <srv> maint` / `clear server <srv> maint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MaintAction {
    Set,
    Clear,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateServerParams {
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub persistpoolmax: Option<u32>,
    #[serde(default)]
    pub persistmaxtime_secs: Option<u64>,
    #[serde(default)]
    pub disk_space_threshold: Option<u8>,
}

/// Drives the admin-visible mutations over the shared backend router and
/// session registry. Held as a single process-wide instance behind an
/// `Arc`, shared by the HTTP/CLI front end and the runtime it administers.
pub struct AdminHandle {
    router: BackendRouterKind,
    sessions: Arc<RwLock<SessionRegistry>>,
}

impl AdminHandle {
    pub fn new(router: BackendRouterKind, sessions: Arc<RwLock<SessionRegistry>>) -> Self {
        Self { router, sessions }
    }

    pub async fn create_server(&self, params: CreateServerParams) -> Result<()> {
        let mut backends = self.router.all().await;
        if backends.iter().any(|b| b.id == params.name) {
            return Err(Error::Configuration(format!(
                "server {} already exists",
                params.name
            )));
        }
        let addr = format!("{}:{}", params.address, params.port);
        backends.push_back(BackendInstance::new(
            params.name.clone(),
            addr,
            ServerStatus::RUNNING,
        ));
        self.router.refresh(backends).await;
        info!(server = %params.name, "server created");
        Ok(())
    }

    pub async fn destroy_server(&self, name: &str) -> Result<()> {
        let mut backends = self.router.all().await;
        let before = backends.len();
        backends.retain(|b| b.id != name);
        if backends.len() == before {
            return Err(Error::Configuration(format!("server {name} not found")));
        }
        self.router.refresh(backends).await;
        info!(server = %name, "server destroyed");
        Ok(())
    }

    pub async fn set_maint(&self, name: &str, action: MaintAction) -> Result<()> {
        let mut backends = self.router.all().await;
        let backend = backends
            .iter_mut()
            .find(|b| b.id == name)
            .ok_or_else(|| Error::Configuration(format!("server {name} not found")))?;
        match action {
            MaintAction::Set => backend.status.insert(ServerStatus::MAINT),
            MaintAction::Clear => backend.status.remove(ServerStatus::MAINT),
        }
        self.router.refresh(backends).await;
        Ok(())
    }

    /// JSON:API document for `GET /servers`.
    pub async fn servers_document(&self) -> Value {
        let backends = self.router.all().await;
        let data: Vec<Value> = backends.iter().map(server_resource).collect();
        json!({ "data": data })
    }

    /// JSON:API document for `GET /sessions`.
    pub async fn sessions_document(&self) -> Value {
        let sessions = self.sessions.read().await;
        let data: Vec<Value> = sessions
            .all()
            .map(|s| {
                json!({
                    "id": s.id.to_string(),
                    "type": "sessions",
                    "attributes": {
                        "user": s.user,
                        "in_transaction": s.in_transaction,
                    }
                })
            })
            .collect();
        json!({ "data": data })
    }
}

fn server_resource(backend: &BackendInstance) -> Value {
    json!({
        "id": backend.id,
        "type": "servers",
        "attributes": {
            "state": status_keywords(backend.status),
            "address": backend.addr,
        }
    })
}

fn status_keywords(status: ServerStatus) -> String {
    let mut words = Vec::new();
    if status.contains(ServerStatus::RUNNING) {
        words.push("Running");
    }
    if status.contains(ServerStatus::MASTER) {
        words.push("Master");
    }
    if status.contains(ServerStatus::SLAVE) {
        words.push("Slave");
    }
    if status.contains(ServerStatus::RELAY) {
        words.push("Relay");
    }
    if status.contains(ServerStatus::MAINT) {
        words.push("Maintenance");
    }
    if status.contains(ServerStatus::DISK_LOW) {
        words.push("Disk Space Low");
    }
    if words.is_empty() {
        words.push("Down");
    }
    words.join(", ")
}

/// Payload shape for the opaque monitor command relay
/// (`call command mariadbmon switchover|failover|rejoin|reset-replication`).
/// The core only forwards this; it does not interpret the command name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorCommand {
    pub monitor: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn handle() -> AdminHandle {
        let router = crate::backend::router::new_static_router(VecDeque::new());
        AdminHandle::new(router, Arc::new(RwLock::new(SessionRegistry::new())))
    }

    #[tokio::test]
    async fn create_then_destroy_server_round_trips() {
        let admin = handle();
        admin
            .create_server(CreateServerParams {
                name: "srv1".into(),
                address: "10.0.0.1".into(),
                port: 3306,
                persistpoolmax: None,
                persistmaxtime_secs: None,
                disk_space_threshold: None,
            })
            .await
            .unwrap();
        let doc = admin.servers_document().await;
        assert_eq!(doc["data"].as_array().unwrap().len(), 1);
        admin.destroy_server("srv1").await.unwrap();
        let doc = admin.servers_document().await;
        assert_eq!(doc["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn creating_a_duplicate_server_is_rejected() {
        let admin = handle();
        let params = CreateServerParams {
            name: "srv1".into(),
            address: "10.0.0.1".into(),
            port: 3306,
            persistpoolmax: None,
            persistmaxtime_secs: None,
            disk_space_threshold: None,
        };
        admin.create_server(params.clone()).await.unwrap();
        assert!(admin.create_server(params).await.is_err());
    }

    #[tokio::test]
    async fn set_and_clear_maint_round_trips() {
        let admin = handle();
        admin
            .create_server(CreateServerParams {
                name: "srv1".into(),
                address: "10.0.0.1".into(),
                port: 3306,
                persistpoolmax: None,
                persistmaxtime_secs: None,
                disk_space_threshold: None,
            })
            .await
            .unwrap();
        admin.set_maint("srv1", MaintAction::Set).await.unwrap();
        let doc = admin.servers_document().await;
        assert!(doc["data"][0]["attributes"]["state"]
            .as_str()
            .unwrap()
            .contains("Maintenance"));
        admin.set_maint("srv1", MaintAction::Clear).await.unwrap();
        let doc = admin.servers_document().await;
        assert!(!doc["data"][0]["attributes"]["state"]
            .as_str()
            .unwrap()
            .contains("Maintenance"));
    }
}
