use crate::backend::backend_mgr::BackendManagerOptions;
use crate::backend::pool::BackendPoolConfig;
use crate::backend::router::{BackendLoadBalancerType, BackendRouterType};
use crate::backend::{BackendInstance, ServerStatus};

use clap::{Parser, Subcommand};
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser, Default, Debug, Clone)]
#[clap(
    name = "mxproxy",
    version = "0.1.0",
    about = "asynchronous, multi-worker MySQL/MariaDB proxy"
)]
pub struct ProxyServerArgs {
    #[clap(long, value_name = "WORKERS", default_value_t = 4)]
    pub works: usize,
    #[clap(long, value_name = "PORT", default_value_t = 3310)]
    pub port: u16,
    #[clap(long, value_name = "HTTP_PORT", default_value_t = 9000)]
    pub http_port: u16,
    #[clap(long, value_name = "TLS", default_value_t = false)]
    pub tls: bool,
    #[clap(long, value_name = "ENABLE METRICS COLLECTOR", default_value_t = false)]
    pub enable_metrics: bool,
    #[clap(long, value_name = "ENABLE REST API", default_value_t = false)]
    pub enable_rest: bool,
    #[clap(long, value_name = "ROUTER")]
    pub router: Option<String>,
    #[clap(long, value_name = "BALANCE")]
    pub balance: Option<String>,
    #[clap(long, value_name = "LOG_LEVEL")]
    pub log_level: Option<String>,
    #[clap(long, value_name = "POOL_MAX_SIZE", default_value_t = 50)]
    pub pool_max_size: u32,
    #[clap(long, value_name = "POOL_INITIAL_SIZE", default_value_t = 5)]
    pub pool_initial_size: u32,

    /// `alter service transaction_replay`.
    #[clap(long, value_name = "TRANSACTION_REPLAY", default_value_t = true)]
    pub transaction_replay: bool,
    /// `alter service transaction_replay_attempts`.
    #[clap(long, value_name = "TRANSACTION_REPLAY_ATTEMPTS", default_value_t = 5)]
    pub transaction_replay_attempts: u32,
    /// `alter service transaction_replay_max_size`, in bytes.
    #[clap(long, value_name = "TRANSACTION_REPLAY_MAX_SIZE", default_value_t = 1 << 20)]
    pub transaction_replay_max_size: usize,
    /// `alter service optimistic_trx`.
    #[clap(long, value_name = "OPTIMISTIC_TRX", default_value_t = false)]
    pub optimistic_trx: bool,

    #[clap(subcommand)]
    pub backend: Option<BackendConfigArgs>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
#[command(next_line_help = true)]
pub enum BackendConfigArgs {
    #[command(long_about = "Proxy a static, comma-separated list of backends. For testing purposes.")]
    Backend {
        #[clap(long)]
        backend_addr: String,
        #[clap(long)]
        master: Option<String>,
    },
}

impl ProxyServerArgs {
    pub fn new_backend_opts(&self) -> BackendManagerOptions {
        BackendManagerOptions {
            tls: self.tls,
            pool_size: self.pool_max_size as u16,
            pool_config: BackendPoolConfig {
                initial_size: self.pool_initial_size,
                max_size: self.pool_max_size,
                time_to_idle: Duration::from_secs(60 * 60),
            },
        }
    }

    pub fn balancer_type(&self) -> BackendLoadBalancerType {
        self.balance
            .as_deref()
            .and_then(|b| BackendLoadBalancerType::from_str(&b.to_lowercase()).ok())
            .unwrap_or(BackendLoadBalancerType::Random)
    }

    pub fn router_type(&self) -> BackendRouterType {
        self.router
            .as_deref()
            .and_then(|r| BackendRouterType::from_str(&r.to_lowercase()).ok())
            .unwrap_or(BackendRouterType::Static)
    }

    /// Builds the initial static backend set from `--backend backend --backend-addr`.
    /// `master` names which comma-separated address is the master; every other
    /// address is started as a slave. For testing purposes only; in a
    /// production deployment backend status is published by a monitor.
    pub fn static_backend_list(&self) -> VecDeque<BackendInstance> {
        match &self.backend {
            Some(BackendConfigArgs::Backend {
                backend_addr,
                master,
            }) => backend_addr
                .split(',')
                .map(|addr| {
                    let is_master = master.as_deref() == Some(addr);
                    let status = if is_master {
                        ServerStatus::RUNNING | ServerStatus::MASTER
                    } else {
                        ServerStatus::RUNNING | ServerStatus::SLAVE
                    };
                    BackendInstance::new(addr.to_string(), addr.to_string(), status)
                })
                .collect(),
            None => VecDeque::from([BackendInstance::new(
                "default",
                "127.0.0.1:3306",
                ServerStatus::RUNNING | ServerStatus::MASTER,
            )]),
        }
    }
}
