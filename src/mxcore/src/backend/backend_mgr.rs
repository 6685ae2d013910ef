use crate::backend::pool::pooled_conn_mgr::PooledConnMgr;
use crate::backend::pool::BackendPoolConfig;
use crate::backend::router::{BackendRouter, BackendRouterKind, TargetRole};
use crate::backend::{BackendInstance, ServerStatus};
use crate::error::{Error, Result};

use common::metrics::gauge;
use common::metrics::metric_def::MXCORE_BACKEND_POOL_SIZE;
use dashmap::DashMap;
use deadpool::managed::{Object, Pool};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};
use twox_hash::XxHash64;

#[derive(Debug, Clone)]
pub struct BackendManagerOptions {
    pub tls: bool,
    pub pool_size: u16,
    pub pool_config: BackendPoolConfig,
}

impl Default for BackendManagerOptions {
    fn default() -> Self {
        Self {
            tls: false,
            pool_size: 100,
            pool_config: BackendPoolConfig::default(),
        }
    }
}

/// Identifies a logical connection pool: a given backend server, serving a
/// given authenticated identity. Two client connections authenticating
/// as the same user with the same password and default database against
/// the same server share a pool; anything else gets its own.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PoolKey {
    pub server_id: String,
    pub user: String,
    pub password_hash: u64,
    pub default_db: Option<String>,
    pub conn_attrs_hash: u64,
}

impl PoolKey {
    pub fn new(
        server_id: impl Into<String>,
        user: impl Into<String>,
        password: &[u8],
        default_db: Option<String>,
        conn_attrs: &[(&str, &str)],
    ) -> Self {
        let mut pw_hasher = XxHash64::with_seed(0);
        password.hash(&mut pw_hasher);
        let mut attr_hasher = XxHash64::with_seed(0);
        for (k, v) in conn_attrs {
            k.hash(&mut attr_hasher);
            v.hash(&mut attr_hasher);
        }
        Self {
            server_id: server_id.into(),
            user: user.into(),
            password_hash: pw_hasher.finish(),
            default_db,
            conn_attrs_hash: attr_hasher.finish(),
        }
    }
}

/// The pieces of a client's authenticated identity that distinguish one
/// connection pool from another, captured once at handshake time and
/// reused for every backend the session later connects to.
pub struct ConnectionIdentity<'a> {
    pub user: &'a str,
    pub password: &'a [u8],
    pub default_db: Option<String>,
    pub conn_attrs: &'a [(&'a str, &'a str)],
}

impl<'a> ConnectionIdentity<'a> {
    pub fn pool_key_for(&self, server_id: &str) -> PoolKey {
        PoolKey::new(
            server_id,
            self.user,
            self.password,
            self.default_db.clone(),
            self.conn_attrs,
        )
    }
}

static BE_MGR_ONCE: OnceLock<Arc<BackendMgr>> = OnceLock::new();

pub fn get_or_init_backend_mgr(
    router: BackendRouterKind,
    mgr_options: BackendManagerOptions,
) -> Arc<BackendMgr> {
    Arc::clone(BE_MGR_ONCE.get_or_init(|| Arc::new(BackendMgr::new(router, mgr_options))))
}

pub struct BackendMgr {
    mgr_options: BackendManagerOptions,
    router: BackendRouterKind,
    be_conn_pool: DashMap<PoolKey, Pool<PooledConnMgr>>,
}

impl BackendMgr {
    pub fn new(router: BackendRouterKind, mgr_options: BackendManagerOptions) -> Self {
        Self {
            mgr_options,
            router,
            be_conn_pool: DashMap::new(),
        }
    }

    pub fn router(&self) -> &BackendRouterKind {
        &self.router
    }

    /// Lazily creates (or evicts, when the backend went into maintenance)
    /// the pool for `key` against `backend`.
    async fn ensure_pool(&self, key: &PoolKey, backend: &BackendInstance) -> Result<()> {
        let pool_size_labels = vec![("backend", backend.addr.clone())];
        if backend.status.contains(ServerStatus::MAINT) || !backend.status.contains(ServerStatus::RUNNING) {
            if let Some(entry) = self.be_conn_pool.get(key) {
                entry.value().close();
            }
            self.be_conn_pool.remove(key);
            gauge(MXCORE_BACKEND_POOL_SIZE, 0_f64, Some(&pool_size_labels));
            return Ok(());
        }
        if self.be_conn_pool.contains_key(key) {
            return Ok(());
        }
        let conn_mgr = PooledConnMgr::new(backend.clone());
        let max_size = self.mgr_options.pool_config.max_size;
        let inner_pool = Pool::builder(conn_mgr)
            .max_size(max_size as usize)
            .build()
            .map_err(|e| Error::Configuration(format!("backend pool build failed: {e}")))?;
        info!(backend = %backend.addr, "backend pool initialized");
        gauge(MXCORE_BACKEND_POOL_SIZE, max_size as f64, Some(&pool_size_labels));
        self.be_conn_pool.insert(key.clone(), inner_pool);
        Ok(())
    }

    /// Rebuild every pool whose backend status changed, dropping pools for
    /// backends that are no longer running.
    pub async fn resync_pools(&self) -> Result<()> {
        let backends: VecDeque<BackendInstance> = self.router.all().await;
        for backend in &backends {
            let keys: Vec<PoolKey> = self
                .be_conn_pool
                .iter()
                .filter(|e| e.key().server_id == backend.id)
                .map(|e| e.key().clone())
                .collect();
            for key in keys {
                if let Err(e) = self.ensure_pool(&key, backend).await {
                    warn!(backend = %backend.addr, error = %e, "failed to resync backend pool");
                }
            }
        }
        Ok(())
    }

    /// Selects a backend for `role`, derives its pool key from the
    /// authenticated identity, and returns the pool handle for that
    /// (backend, identity) pair alongside the key used, since the caller
    /// doesn't know which backend was picked until the router decides.
    pub async fn connect_to_backend(
        &self,
        role: TargetRole,
        identity: &ConnectionIdentity<'_>,
    ) -> Result<(PoolKey, Pool<PooledConnMgr, Object<PooledConnMgr>>)> {
        let backend = self.router.select(role).await?;
        let key = identity.pool_key_for(&backend.id);
        self.ensure_pool(&key, &backend).await?;
        let pool = self
            .be_conn_pool
            .get(&key)
            .map(|p| p.value().clone())
            .ok_or_else(|| Error::PoolExhausted {
                backend: backend.addr.clone(),
            })?;
        Ok((key, pool))
    }

    /// Reuses a pool that was already selected for this session (e.g. to
    /// keep every statement in an open transaction on the same backend).
    pub async fn connect_with_key(
        &self,
        key: &PoolKey,
    ) -> Result<Pool<PooledConnMgr, Object<PooledConnMgr>>> {
        self.be_conn_pool
            .get(key)
            .map(|p| p.value().clone())
            .ok_or_else(|| Error::PoolExhausted {
                backend: key.server_id.clone(),
            })
    }
}
