//! CLI interface for soar-actions.
//!
//! Runs the service and offers client commands for firing events at a running
//! instance.

mod commands;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::IncidentId;

pub use commands::*;
pub use utils::*;

#[derive(Parser)]
#[command(name = "soar-actions")]
#[command(about = "Action and function components for an incident-response platform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (defaults to <config dir>/soar-actions/app.toml)
    #[arg(long, short = 'c', global = true, env = "SOAR_ACTIONS_CONFIG_PATH")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the service
    Serve {
        /// Transport type: stdio or socket (overrides [server].transport)
        #[arg(long, short = 't')]
        transport: Option<String>,

        /// Unix socket path (used when transport = "socket")
        #[arg(long, short = 's')]
        socket_path: Option<String>,

        /// Treat configuration warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Send an add_group action for one incident to a running service
    Fire {
        /// Service socket (defaults to [server].socket_path)
        #[arg(long, short = 's')]
        socket: Option<String>,

        /// Incident id, numeric or text
        #[arg(long)]
        incident_id: IncidentId,

        /// Severity code as stored on the incident, e.g. 4
        #[arg(long)]
        severity_code: Option<String>,

        /// Action queue (defaults to [addgroup].queue)
        #[arg(long, short = 'q')]
        queue: Option<String>,
    },

    /// Submit a function event to a running service
    SubmitFunction {
        #[arg(long, short = 's')]
        socket: Option<String>,

        #[arg(long, short = 'f')]
        function: String,

        /// Inputs as a JSON object
        #[arg(long, short = 'i', conflicts_with = "inputs_file")]
        inputs: Option<String>,

        /// File holding the inputs JSON object
        #[arg(long, conflicts_with = "inputs")]
        inputs_file: Option<PathBuf>,
    },

    /// Print the customization definitions of the shipped functions
    Functions {
        /// Only show functions from this package
        #[arg(long, short = 'p')]
        package: Option<String>,
    },

    /// Initialize default configuration at default location
    Init {
        #[arg(long)]
        force: bool,
    },

    /// Manage configuration
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long)]
        validate: bool,

        /// Fail validation on warnings too
        #[arg(long)]
        strict: bool,
    },

    /// Show version information
    Version,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        let config = self.config;
        match self.command {
            Commands::Serve {
                transport,
                socket_path,
                strict,
            } => serve(config, transport, socket_path, strict).await,

            Commands::Fire {
                socket,
                incident_id,
                severity_code,
                queue,
            } => fire(config, socket, incident_id, severity_code, queue).await,

            Commands::SubmitFunction {
                socket,
                function,
                inputs,
                inputs_file,
            } => submit_function(config, socket, function, inputs, inputs_file).await,

            Commands::Functions { package } => functions(package).await,
            Commands::Init { force } => init(config, force).await,
            Commands::Config {
                show,
                validate,
                strict,
            } => config_command(config, show, validate, strict).await,

            Commands::Version => version().await,
        }
    }
}
