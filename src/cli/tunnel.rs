//! Tunnel commands
//!
//! `frp tcp|udp|http|https` render a one-off config; `frp run NAME` uses a
//! saved profile. Both hand the config to the supervisor and block until
//! frpc exits or the user interrupts it.

use colored::Colorize;
use frp_core::config::{
    profiles, settings, ClientConfig, ClientSettings, PortMapping, ProxyEntry, ProxyProtocol,
};
use frp_core::error::FrpError;
use frp_core::tunnel::{ConfigSource, RunOutcome, Supervisor};
use std::path::PathBuf;
use tracing::{debug, info};

/// Run an ad-hoc tunnel for a single port mapping
pub fn run_tunnel(
    protocol: ProxyProtocol,
    ports: PortMapping,
    frpc: Option<PathBuf>,
) -> Result<i32, FrpError> {
    let current = settings::load_settings()?;
    let proxy = ProxyEntry::ad_hoc(protocol, ports);
    let text = ClientConfig::new(&current, proxy).render()?;

    info!(
        "Starting {} tunnel for local port {} via {}:{}",
        protocol, ports.local, current.server_addr, current.server_port
    );
    supervise(&current, ConfigSource::Text(text), frpc)
}

/// Run a saved profile
pub fn run_profile(name: &str, frpc: Option<PathBuf>) -> Result<i32, FrpError> {
    let current = settings::load_settings()?;
    let config_dir = settings::get_config_dir()?;
    let path = profiles::profile_path(&config_dir, name)?;

    info!("Starting saved configuration {} from {:?}", name, path);
    supervise(&current, ConfigSource::File(path), frpc)
}

fn supervise(
    current: &ClientSettings,
    source: ConfigSource,
    frpc: Option<PathBuf>,
) -> Result<i32, FrpError> {
    let executable = current.frpc_executable(frpc.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(async {
        let mut supervisor = Supervisor::new(executable);
        debug!("Using frpc at {}", supervisor.executable().display());
        supervisor.run(source).await
    })?;

    match report.outcome {
        RunOutcome::Interrupted { termination, .. } => {
            println!();
            println!("{} frpc {}", "Terminating process...".yellow(), termination);
        }
        RunOutcome::ChildExited { status } => {
            info!("frpc exited with {:?}", status);
        }
    }

    Ok(report.outcome.exit_code())
}
