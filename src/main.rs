//! Command line front-end for the proxy.
//!
//! ```text
//! jitter-proxy <listen_port> <relay_port> [--delay SECONDS] [--jitter SECONDS]
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use jitter_proxy::{LossConfig, Proxy, ProxyConfig, SchedulerConfig};
use log::info;

/// Relays UDP datagrams from one port to another, adding delay, jitter and loss.
#[derive(Parser, Debug)]
#[command(name = "jitter-proxy", about = "UDP proxy which emulates a bad network")]
struct Cli {
    /// Port to receive datagrams on.
    listen_port: u16,

    /// Port to relay datagrams to.
    relay_port: u16,

    /// Delay added to every datagram, in seconds.
    #[arg(short, long, default_value_t = 0.0)]
    delay: f64,

    /// Width of the window random extra delay is drawn from, in seconds.
    #[arg(short, long, default_value_t = 0.0)]
    jitter: f64,

    /// Address to receive datagrams on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    listen_host: IpAddr,

    /// Address to relay datagrams to.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    target_host: IpAddr,

    /// Probability of a datagram starting a loss burst.
    #[arg(long, default_value_t = 0.0)]
    loss_start: f64,

    /// Probability of a datagram ending a loss burst.
    #[arg(long, default_value_t = 1.0)]
    loss_stop: f64,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ProxyConfig> {
        let scheduler = SchedulerConfig::from_secs(self.delay, self.jitter)?;
        let loss = LossConfig::new(self.loss_start, self.loss_stop)?;
        let config = ProxyConfig {
            listen_addr: SocketAddr::new(self.listen_host, self.listen_port),
            target_addr: SocketAddr::new(self.target_host, self.relay_port),
            scheduler,
            loss,
        };
        Ok(config)
    }
}

/// Completes on ctrl-c, or on SIGTERM where there is such a thing.
async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => (),
                    _ = sigterm.recv() => (),
                }
                return;
            },
            Err(err) => log::warn!("can't listen for SIGTERM: {}", err),
        }
    }
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("can't listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config().context("invalid configuration")?;
    let proxy = {
        Proxy::bind(config.clone())
        .await
        .with_context(|| format!("failed to start proxy on {}", config.listen_addr))?
    };

    info!("UDP proxy started: {} -> {}", config.listen_addr, config.target_addr);
    info!("delay: {:?}, jitter: {:?}", config.scheduler.delay, config.scheduler.jitter);
    if !config.loss.is_lossless() {
        info!(
            "loss: start {}, stop {} (about {:.2}% of datagrams)",
            config.loss.loss_start,
            config.loss.loss_stop,
            config.loss.expected_loss_rate() * 100.0,
        );
    }

    let summary = proxy.run(termination_signal()).await?;
    info!(
        "relayed {} of {} datagrams",
        summary.scheduler.dispatched - summary.scheduler.send_errors,
        summary.received,
    );
    Ok(())
}
