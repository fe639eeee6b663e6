//! Settings and saved configuration commands

use colored::Colorize;
use frp_core::config::{
    parse_assignment, profiles, settings, PortMapping, ProxyEntry, ProxyProtocol, MASKED_TOKEN,
};
use frp_core::error::FrpError;

/// Run `frp set KEY=VALUE`
pub fn run_set(assignment: &str) -> Result<(), FrpError> {
    let (key, value) = parse_assignment(assignment)?;

    let mut current = settings::load_settings()?;
    current.apply(key, value)?;
    settings::save_settings(&current)?;

    // Never echo the token back
    let shown = if key == "token" { MASKED_TOKEN } else { value };
    println!("{} {} = {}", "Configuration updated:".green(), key, shown);
    Ok(())
}

/// Run `frp config`
pub fn run_show_config() -> Result<(), FrpError> {
    let current = settings::load_settings()?.masked();
    let config_dir = settings::get_config_dir()?;

    println!("Current configuration:");
    println!(
        "Server address: {}:{}",
        current.server_addr, current.server_port
    );
    println!("Auth token: {}", current.token);
    if let Some(path) = &current.frpc_path {
        println!("frpc path: {}", path.display());
    }

    println!();
    println!("Saved configurations:");
    for name in profiles::list_profiles(&config_dir)? {
        println!("- {}", name);
    }

    Ok(())
}

/// Run `frp save LOCAL[:REMOTE] --name NAME`
pub fn run_save(name: &str, protocol: ProxyProtocol, ports: PortMapping) -> Result<(), FrpError> {
    let current = settings::load_settings()?;
    let config_dir = settings::get_config_dir()?;

    let path = profiles::save_profile(
        &config_dir,
        name,
        &current,
        ProxyEntry::new(name, protocol, ports),
    )?;

    println!("{} {}", "Configuration saved to".green(), path.display());
    Ok(())
}
