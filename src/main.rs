//! frp - frpc tunnel launcher
//!
//! Renders frpc client configurations from saved settings or saved
//! profiles and supervises the frpc process until it exits or is interrupted.

use clap::{ArgAction, Parser, Subcommand};
use frp_core::config::{PortMapping, ProxyProtocol};
use frp_core::error::FrpError;
use frp_core::init_logging;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "frp")]
#[command(about = "Launch and supervise frpc tunnels")]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Path to the frpc executable
    #[arg(long, global = true, value_name = "PATH")]
    frpc: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// TCP port forwarding
    Tcp {
        #[arg(value_name = "LOCAL[:REMOTE]")]
        ports: PortMapping,
    },
    /// UDP port forwarding
    Udp {
        #[arg(value_name = "LOCAL[:REMOTE]")]
        ports: PortMapping,
    },
    /// HTTP forwarding
    Http {
        #[arg(value_name = "LOCAL[:REMOTE]")]
        ports: PortMapping,
    },
    /// HTTPS forwarding
    Https {
        #[arg(value_name = "LOCAL[:REMOTE]")]
        ports: PortMapping,
    },
    /// Run a saved configuration
    Run { name: String },
    /// Save a configuration for later use
    Save {
        #[arg(value_name = "LOCAL[:REMOTE]")]
        ports: PortMapping,
        /// Name of the saved configuration
        #[arg(long, alias = "conf")]
        name: String,
        /// Proxy protocol
        #[arg(long, default_value = "tcp")]
        protocol: ProxyProtocol,
    },
    /// Set a setting (server=IP:PORT, token=XXX, frpc_path=PATH)
    Set {
        #[arg(value_name = "KEY=VALUE")]
        assignment: String,
    },
    /// Show current settings and saved configurations
    Config,
    /// Show help (supported: en, zh-CN, ru)
    Help { lang: Option<String> },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let frpc = cli.frpc;
    let result = match cli.command {
        Some(Commands::Tcp { ports }) => cli::tunnel::run_tunnel(ProxyProtocol::Tcp, ports, frpc),
        Some(Commands::Udp { ports }) => cli::tunnel::run_tunnel(ProxyProtocol::Udp, ports, frpc),
        Some(Commands::Http { ports }) => {
            cli::tunnel::run_tunnel(ProxyProtocol::Http, ports, frpc)
        }
        Some(Commands::Https { ports }) => {
            cli::tunnel::run_tunnel(ProxyProtocol::Https, ports, frpc)
        }
        Some(Commands::Run { name }) => cli::tunnel::run_profile(&name, frpc),
        Some(Commands::Save {
            ports,
            name,
            protocol,
        }) => cli::settings::run_save(&name, protocol, ports).map(|()| 0),
        Some(Commands::Set { assignment }) => cli::settings::run_set(&assignment).map(|()| 0),
        Some(Commands::Config) => cli::settings::run_show_config().map(|()| 0),
        Some(Commands::Help { lang }) => {
            print!("{}", cli::help::help_text(lang.as_deref()));
            Ok(0)
        }
        None => {
            print!("{}", cli::help::help_text(None));
            Ok(0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let exit_code = match e {
                // Setup failures while starting frpc (exit code 1)
                FrpError::Supervisor(_) => 1,
                // Configuration errors (exit code 2)
                FrpError::Config(_) | FrpError::Json(_) | FrpError::TomlSerialize(_) => 2,
                // IO errors (exit code 1 - runtime)
                FrpError::Io(_) => 1,
            };

            eprintln!("Error: {}", e);
            std::process::exit(exit_code);
        }
    }
}
