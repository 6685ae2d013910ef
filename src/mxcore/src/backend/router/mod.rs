pub mod static_router;

use crate::backend::BackendInstance;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use static_router::StaticRouter;
use std::collections::VecDeque;
use std::sync::Mutex;
use strum_macros::EnumString;

/// Which role a statement needs to be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRole {
    Master,
    Slave,
}

#[derive(Debug, Clone, EnumString)]
pub enum BackendRouterType {
    #[strum(serialize = "static")]
    Static,
}

#[derive(Debug, Clone, EnumString)]
pub enum BackendLoadBalancerType {
    #[strum(serialize = "random")]
    Random,
}

pub trait BackendLoadBalancer: Send + Sync {
    fn balance(&self, backends: usize) -> usize;
}

pub struct RandomBalancer {
    rand: Mutex<StdRng>,
}

impl Default for RandomBalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomBalancer {
    pub fn new() -> Self {
        Self {
            rand: Mutex::new(StdRng::seed_from_u64(
                Utc::now().timestamp_subsec_nanos().into(),
            )),
        }
    }
}

impl BackendLoadBalancer for RandomBalancer {
    fn balance(&self, backends: usize) -> usize {
        let mut mut_rand = self.rand.lock().unwrap();
        mut_rand.gen_range(0..backends)
    }
}

/// Maintains the set of known backend servers and picks one candidate for a
/// given routing role. A monitor is the only writer of server status; the
/// router only ever reads the most recently published snapshot via
/// `refresh`.
#[async_trait]
pub trait BackendRouter: Send + Sync {
    async fn candidates(&self, role: TargetRole) -> Result<VecDeque<BackendInstance>>;

    async fn select(&self, role: TargetRole) -> Result<BackendInstance> {
        let candidates = self.candidates(role).await?;
        if candidates.is_empty() {
            return Err(Error::BackendUnavailable {
                backend: format!("{role:?}"),
                reason: "no usable backend for role".to_string(),
            });
        }
        let idx = self.balancer().balance(candidates.len());
        Ok(candidates[idx].clone())
    }

    fn balancer(&self) -> &dyn BackendLoadBalancer;

    /// Replace the known backend set, as published by a monitor.
    async fn refresh(&self, backends: VecDeque<BackendInstance>);

    async fn all(&self) -> VecDeque<BackendInstance>;
}

pub enum BackendRouterKind {
    Static(Box<StaticRouter>),
}

#[async_trait]
impl BackendRouter for BackendRouterKind {
    async fn candidates(&self, role: TargetRole) -> Result<VecDeque<BackendInstance>> {
        match self {
            BackendRouterKind::Static(r) => r.candidates(role).await,
        }
    }

    fn balancer(&self) -> &dyn BackendLoadBalancer {
        match self {
            BackendRouterKind::Static(r) => r.balancer(),
        }
    }

    async fn refresh(&self, backends: VecDeque<BackendInstance>) {
        match self {
            BackendRouterKind::Static(r) => r.refresh(backends).await,
        }
    }

    async fn all(&self) -> VecDeque<BackendInstance> {
        match self {
            BackendRouterKind::Static(r) => r.all().await,
        }
    }
}

pub fn new_balancer(balancer_type: Option<BackendLoadBalancerType>) -> impl BackendLoadBalancer {
    match balancer_type {
        Some(BackendLoadBalancerType::Random) | None => RandomBalancer::new(),
    }
}

pub fn new_static_router(backends: VecDeque<BackendInstance>) -> BackendRouterKind {
    BackendRouterKind::Static(Box::new(StaticRouter::new(backends)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ServerStatus;

    #[tokio::test]
    async fn selects_only_from_role_matching_candidates() {
        let master = BackendInstance::new("m1", "127.0.0.1:3306", ServerStatus::RUNNING | ServerStatus::MASTER);
        let slave = BackendInstance::new("s1", "127.0.0.1:3307", ServerStatus::RUNNING | ServerStatus::SLAVE);
        let router = new_static_router(VecDeque::from([master.clone(), slave.clone()]));
        let picked_master = router.select(TargetRole::Master).await.unwrap();
        assert_eq!(picked_master, master);
        let picked_slave = router.select(TargetRole::Slave).await.unwrap();
        assert_eq!(picked_slave, slave);
    }

    #[tokio::test]
    async fn errors_when_no_usable_backend_for_role() {
        let master = BackendInstance::new("m1", "127.0.0.1:3306", ServerStatus::RUNNING | ServerStatus::MASTER);
        let router = new_static_router(VecDeque::from([master]));
        assert!(router.select(TargetRole::Slave).await.is_err());
    }
}
