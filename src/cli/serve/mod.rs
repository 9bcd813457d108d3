//! Serve command - runs the balancer API and proxy on one port

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::create_router;
use crate::config::{AppConfig, ClusterBackend};
use crate::domain::ClusterClient;
use crate::infrastructure::cluster::{InMemoryClusterClient, KubernetesClusterClient};
use crate::infrastructure::logging;

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Override the cluster backend from the configuration
    #[arg(long, value_enum)]
    pub cluster: Option<ClusterBackendArg>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ClusterBackendArg {
    Kubernetes,
    InMemory,
}

impl From<ClusterBackendArg> for ClusterBackend {
    fn from(arg: ClusterBackendArg) -> Self {
        match arg {
            ClusterBackendArg::Kubernetes => Self::Kubernetes,
            ClusterBackendArg::InMemory => Self::InMemory,
        }
    }
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(backend) = args.cluster {
        config.cluster.backend = backend.into();
    }

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let cluster = connect_cluster(config.cluster.backend).await?;
    let state = crate::create_app_state(&config, cluster).context("Invalid configuration")?;
    let app = create_router(state);

    let addr = build_socket_addr(&config)?;
    info!(
        namespace = %config.balancer.namespace,
        backend = ?config.cluster.backend,
        "Starting balancer on {}",
        addr
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn connect_cluster(backend: ClusterBackend) -> anyhow::Result<Arc<dyn ClusterClient>> {
    match backend {
        ClusterBackend::Kubernetes => {
            let client = KubernetesClusterClient::try_default()
                .await
                .context("Failed to connect to the Kubernetes API")?;
            Ok(Arc::new(client))
        }
        ClusterBackend::InMemory => {
            info!("Using the in-memory cluster; instances are never started");
            Ok(Arc::new(InMemoryClusterClient::new()))
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
