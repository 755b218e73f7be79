//! `rotation`: take load balancer nodes out of and back into rotation.
//!
//! ```text
//! rotation [--config PATH] [-v...] <command>
//!     status NODE            print enabled / disabled / down
//!     connections NODE       print the active connection count
//!     disable NODE           disable and wait for connections to drain
//!     enable NODE            enable and wait for the enabled status
//!     default-config         print a configuration template
//!     config-path            print the configuration search path
//! ```
//!
//! Exit codes: 0 success, 1 node did not converge, 2 error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use node_rotation::config::{discover_config, search_paths, DEFAULT_TEMPLATE};
use node_rotation::observability::logging::{effective_level, init_logging};
use node_rotation::{RotationClient, RotationError, RotationResult};

#[derive(Parser)]
#[command(name = "rotation")]
#[command(about = "Take servers out of and back into load balancer rotation", long_about = None)]
struct Cli {
    /// Configuration file (default: first file found on the search path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a node is enabled, disabled or down
    Status { node: String },
    /// Show the number of active connections to a node
    Connections { node: String },
    /// Put a node into rotation
    Enable {
        node: String,
        /// Retries and polls before giving up (default from config)
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Take a node out of rotation and wait for connections to drain
    Disable {
        node: String,
        /// Retries and polls before giving up (default from config)
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Print a configuration template
    DefaultConfig,
    /// Print the configuration search path
    ConfigPath,
}

/// What to do with a node once a client is connected.
#[derive(Debug, Clone, Copy)]
enum NodeAction {
    Status,
    Connections,
    Enable { max_retries: Option<u32> },
    Disable { max_retries: Option<u32> },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (node, action) = match &cli.command {
        Commands::DefaultConfig => {
            print!("{}", DEFAULT_TEMPLATE);
            return ExitCode::SUCCESS;
        }
        Commands::ConfigPath => {
            for path in search_paths() {
                println!("{}", path.display());
            }
            return ExitCode::SUCCESS;
        }
        Commands::Status { node } => (node, NodeAction::Status),
        Commands::Connections { node } => (node, NodeAction::Connections),
        Commands::Enable { node, max_retries } => (node, NodeAction::Enable { max_retries: *max_retries }),
        Commands::Disable { node, max_retries } => (node, NodeAction::Disable { max_retries: *max_retries }),
    };

    let (path, config) = match discover_config(cli.config.as_deref()) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    init_logging(effective_level(
        &config.observability.log_level.to_ascii_lowercase(),
        cli.verbose,
    ));
    tracing::debug!(path = %path.display(), scheme_host = %config.load_balancer.scheme_host, "Configuration loaded");

    let client = match RotationClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(&client, node, action).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", failure_message(node, &e));
            ExitCode::from(2)
        }
    }
}

async fn run(client: &RotationClient, node: &str, action: NodeAction) -> RotationResult<ExitCode> {
    match action {
        NodeAction::Status => println!("{}", client.get_status(node).await?),
        NodeAction::Connections => println!("{}", client.get_connections(node).await?),
        NodeAction::Enable { max_retries } => {
            let budget = max_retries.unwrap_or(client.max_retries());
            if !client.enable_server(node, budget).await? {
                eprintln!("{} could not be enabled", node);
                return Ok(ExitCode::from(1));
            }
        }
        NodeAction::Disable { max_retries } => {
            let budget = max_retries.unwrap_or(client.max_retries());
            if !client.disable_server(node, budget).await? {
                eprintln!("{} could not be disabled", node);
                return Ok(ExitCode::from(1));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn failure_message(node: &str, err: &RotationError) -> String {
    if err.is_unknown_node() {
        format!("{} doesn't appear to be a known node", node)
    } else {
        format!("Error: {}", err)
    }
}
