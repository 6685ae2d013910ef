use crate::backend::router::{BackendLoadBalancer, BackendRouter, RandomBalancer, TargetRole};
use crate::backend::{BackendInstance, ServerStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// A router over a fixed, operator-configured backend list. Server status
/// is still mutable (a monitor can flip MAINT/SLAVE/MASTER bits via
/// `refresh`); only the membership of the list is static.
pub struct StaticRouter {
    backends: RwLock<VecDeque<BackendInstance>>,
    balancer: RandomBalancer,
}

impl StaticRouter {
    pub fn new(backends: VecDeque<BackendInstance>) -> Self {
        Self {
            backends: RwLock::new(backends),
            balancer: RandomBalancer::new(),
        }
    }
}

#[async_trait]
impl BackendRouter for StaticRouter {
    async fn candidates(&self, role: TargetRole) -> Result<VecDeque<BackendInstance>> {
        let backends = self.backends.read().await;
        let matching = backends
            .iter()
            .filter(|b| match role {
                TargetRole::Master => b.is_usable_for_write(),
                TargetRole::Slave => {
                    b.is_usable_for_read()
                        && b.status.intersects(ServerStatus::SLAVE | ServerStatus::RELAY)
                }
            })
            .cloned()
            .collect();
        Ok(matching)
    }

    fn balancer(&self) -> &dyn BackendLoadBalancer {
        &self.balancer
    }

    async fn refresh(&self, backends: VecDeque<BackendInstance>) {
        *self.backends.write().await = backends;
    }

    async fn all(&self) -> VecDeque<BackendInstance> {
        self.backends.read().await.clone()
    }
}
