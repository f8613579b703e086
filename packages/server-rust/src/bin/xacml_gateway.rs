//! `xacml-gateway`: serves the XACML REST endpoint with digest
//! authentication in front of the built-in `NotApplicable` decision point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use xacml_core::StaticCredentials;
use xacml_server::network::{NetworkConfig, NetworkModule, TlsConfig};
use xacml_server::service::{
    parse_max_content_length, BackgroundWorker, Dispatcher, GatewayConfig, NonceManager,
    NonceRotator, NonceTask, NotApplicableDecisionPoint,
};

/// Command-line arguments for `xacml-gateway`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "XACML_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 picks one)
    #[arg(short, long, env = "XACML_PORT", default_value_t = 8080)]
    port: u16,

    /// Maximum request body size in bytes, 0 for unlimited
    #[arg(long, env = "XACML_MAX_CONTENT_LENGTH")]
    max_content_length: Option<String>,

    /// Realm used when the path carries no meta alias
    #[arg(long, env = "XACML_REALM", default_value = "/")]
    realm: String,

    /// Digest quality of protection to advertise; empty to omit
    #[arg(long, env = "XACML_QOP", default_value = "auth")]
    qop: String,

    /// Seconds between nonce rotations
    #[arg(long, env = "XACML_NONCE_INTERVAL_SECS", default_value_t = 60)]
    nonce_interval_secs: u64,

    /// Digest users as `name:password`; repeat or comma-separate
    #[arg(long = "user", env = "XACML_USERS", value_delimiter = ',')]
    users: Vec<String>,

    /// PEM certificate chain; enables HTTPS together with `--tls-key`
    #[arg(long, env = "XACML_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key
    #[arg(long, env = "XACML_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "XACML_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,xacml_server=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn credentials(users: &[String]) -> anyhow::Result<StaticCredentials> {
    users
        .iter()
        .map(|entry| {
            entry
                .split_once(':')
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, password)| (name.to_string(), password.to_string()))
                .with_context(|| format!("user entry `{entry}` is not `name:password`"))
        })
        .collect()
}

fn log_shutdown_signal(result: std::io::Result<()>) {
    if let Err(e) = result {
        error!(error = %e, "failed to listen for ctrl-c");
    }
    info!("shutdown signal received");
}

/// Resolves on ctrl-c once the rotation worker has stopped. Until then each
/// SIGHUP forces a nonce rotation.
#[cfg(unix)]
async fn shutdown_signal(mut rotation: BackgroundWorker<NonceRotator>) {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!(error = %e, "SIGHUP nonce rotation unavailable");
            log_shutdown_signal(ctrl_c.await);
            rotation.stop().await;
            return;
        }
    };

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                log_shutdown_signal(result);
                break;
            }
            Some(()) = hangup.recv() => {
                info!("SIGHUP received, rotating digest nonce");
                if let Err(e) = rotation.submit(NonceTask::RotateNow).await {
                    warn!(error = %e, "nonce rotation request dropped");
                }
            }
        }
    }
    rotation.stop().await;
}

#[cfg(not(unix))]
async fn shutdown_signal(mut rotation: BackgroundWorker<NonceRotator>) {
    log_shutdown_signal(tokio::signal::ctrl_c().await);
    rotation.stop().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let credentials = credentials(&cli.users)?;
    if credentials.is_empty() {
        warn!("no digest users configured; every request will be challenged");
    }

    let gateway = GatewayConfig {
        max_content_length: parse_max_content_length(cli.max_content_length.as_deref()),
        default_realm: cli.realm,
        qop: Some(cli.qop).filter(|q| !q.trim().is_empty()),
        nonce_rotation_interval: Duration::from_secs(cli.nonce_interval_secs),
        ..GatewayConfig::default()
    };
    let network = NetworkConfig {
        host: cli.host,
        port: cli.port,
        tls: cli
            .tls_cert
            .zip(cli.tls_key)
            .map(|(cert_path, key_path)| TlsConfig { cert_path, key_path }),
        ..NetworkConfig::default()
    };

    info!(
        max_content_length = gateway.max_content_length,
        realm = %gateway.default_realm,
        users = credentials.len(),
        "starting xacml gateway"
    );

    let nonces = NonceManager::default();
    let rotation_interval = gateway.nonce_rotation_interval;
    let dispatcher = Dispatcher::new(
        gateway,
        nonces.clone(),
        Arc::new(credentials),
        Arc::new(NotApplicableDecisionPoint),
    );

    let mut module = NetworkModule::new(network, Arc::new(dispatcher));
    let port = module.start().await?;
    info!(port, "xacml gateway listening");

    let rotation = nonces.spawn_rotation(rotation_interval);
    module.serve(shutdown_signal(rotation)).await
}
