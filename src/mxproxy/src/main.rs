use clap::Parser;
use common::metrics::process_unix::ProcessRecorder;
use common::ShutdownMessage;
use mxcore::backend::backend_mgr::{get_or_init_backend_mgr, BackendManagerOptions};
use mxcore::backend::router::new_static_router;
use mxcore::server::auth::authenticator::ProxyAuthenticator;
use mxcore::server::proxy_cli_args::ProxyServerArgs;
use mxcore::server::proxy_session::ProxySession;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::sync::watch::Receiver;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

async fn shutdown_await(mut shutdown_rx: Box<Receiver<ShutdownMessage>>) {
    let changed_rs = &shutdown_rx.changed().await;
    if changed_rs.is_ok() {
        let canceled = shutdown_rx.borrow_and_update().clone();
        if let ShutdownMessage::Cancel(msg) = canceled {
            info!("mxproxy received shutdown message: {msg}");
        }
    }
}

async fn shutdown_signal() -> ShutdownMessage {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        ctrl_c_v = ctrl_c => {
            let msg = format!("received ctrl_c signal {ctrl_c_v:?}");
            ShutdownMessage::Cancel(msg)
        },
        v = terminate => {
            let msg = format!("received terminate signal {v:?}");
            ShutdownMessage::Cancel(msg)
        },
    }
}

fn start_metrics(proxy_config: &ProxyServerArgs, runtime: &Runtime, shutdown_rx: &Receiver<ShutdownMessage>) {
    if !proxy_config.enable_metrics {
        return;
    }
    common::metrics::init_metrics_context();
    let mut process_recorder = ProcessRecorder::new(common::metrics::common_labels().clone(), shutdown_rx.clone());
    runtime.spawn(async move {
        process_recorder.start_auto_collect().await;
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proxy_config = ProxyServerArgs::parse();
    let log_level_string = proxy_config.log_level.clone().unwrap_or("INFO".to_string());
    let level = Level::from_str(log_level_string.as_str())?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("INFO,hyper=INFO,tower=INFO,h2=INFO"))
        .add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(true)
        .init();

    let works = proxy_config.works;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mxproxy-io")
        .worker_threads(works)
        .build()?;

    info!(config = ?proxy_config, "mxproxy starting");
    let (shutdown_tx, shutdown_rx) = watch::channel(ShutdownMessage::Init);
    start_metrics(&proxy_config, &runtime, &shutdown_rx);
    #[cfg(unix)]
    runtime.spawn(common::profiling::profiler_signal_loop(
        "/tmp/mxproxy_cpu_profile".to_string(),
        30,
    ));

    runtime.block_on(async {
        let backend_opts = proxy_config.new_backend_opts();
        let router = new_static_router(proxy_config.static_backend_list());
        let backend_mgr = get_or_init_backend_mgr(router, backend_opts);

        let housekeeper = Arc::new(mxcore::housekeeper::Housekeeper::new());
        let (hk_shutdown_tx, hk_shutdown_rx) = tokio::sync::watch::channel(false);
        {
            let housekeeper = Arc::clone(&housekeeper);
            let backend_mgr_for_resync = Arc::clone(&backend_mgr);
            housekeeper.add_recurring(
                "resync-backend-pools",
                Duration::from_secs(5),
                Box::new(move || {
                    let backend_mgr_for_resync = Arc::clone(&backend_mgr_for_resync);
                    tokio::spawn(async move {
                        if let Err(e) = backend_mgr_for_resync.resync_pools().await {
                            warn!(error = %e, "failed to resync backend pools");
                        }
                    });
                }),
            );
            runtime.spawn(async move { housekeeper.run(hk_shutdown_rx).await });
        }

        let proxy_srv = Arc::new(ProxySession::new(
            Arc::clone(&backend_mgr),
            ProxyAuthenticator,
            proxy_config.transaction_replay,
            proxy_config.transaction_replay_attempts,
            proxy_config.transaction_replay_max_size,
        ));

        let port = proxy_config.port;
        let tcp_listener = TcpListener::bind(format!("0.0.0.0:{port}")).await.unwrap();
        loop {
            tokio::select! {
                shutdown_msg = shutdown_signal() => {
                    let _ = hk_shutdown_tx.send(true);
                    shutdown_tx.send(shutdown_msg).unwrap();
                    break;
                }
                rs = tcp_listener.accept() => {
                    match rs {
                        Ok((stream, _addr)) => {
                            let (client_reader, client_writer) = stream.into_split();
                            let proxy_srv = Arc::clone(&proxy_srv);
                            runtime.spawn(async move {
                                if let Err(e) = proxy_srv.connect(client_reader, client_writer, &None).await {
                                    warn!(error = %e, "connection ended with an error");
                                }
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
        Ok(())
    })
}
