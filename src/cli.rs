//! Command-line interface: serve, run, and test subcommands.

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Toolbelt - serve a catalog of tools and workflows over MCP
#[derive(Parser, Debug)]
#[command(name = "toolbelt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server over stdio or TCP
    Serve {
        /// Path to the configuration file
        #[arg(short, long, default_value = "toolbelt.yaml")]
        config: PathBuf,

        /// Port to listen on (0 for stdio, >0 for TCP)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a log file
        #[arg(long)]
        logfile: Option<PathBuf>,
    },

    /// Execute a single tool or workflow and print its output
    Run {
        /// Name of the tool or workflow
        name: String,

        /// Arguments as key=value pairs
        args: Vec<String>,

        /// Path to the configuration file
        #[arg(short, long, default_value = "toolbelt.yaml")]
        config: PathBuf,

        /// Path to a log file
        #[arg(long)]
        logfile: Option<PathBuf>,
    },

    /// Exercise a running server: initialize, list tools, call each one
    Test {
        /// Address of a running MCP server (e.g. localhost:3000)
        #[arg(long)]
        addr: Option<String>,

        /// Only test the named tool or workflow
        #[arg(short, long)]
        workflow: Option<String>,

        /// Path to the configuration file
        #[arg(short, long, default_value = "toolbelt.yaml")]
        config: PathBuf,

        /// Path to a log file
        #[arg(long)]
        logfile: Option<PathBuf>,
    },
}

/// Parse trailing `key=value` tokens into call arguments. Values stay
/// strings; tokens without an equals sign are ignored.
pub fn parse_key_values(tokens: &[String]) -> Map<String, Value> {
    let mut arguments = Map::new();
    for token in tokens {
        if let Some((key, value)) = token.split_once('=') {
            arguments.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    arguments
}
