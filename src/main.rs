use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use log::error;

use toolbelt::catalog::{Catalog, CatalogStore, Entity};
use toolbelt::cli::{parse_key_values, Cli, Commands};
use toolbelt::config::Config;
use toolbelt::exec::{execute_tool, execute_workflow};
use toolbelt::rpc::{client, Server};
use toolbelt::{logging, watcher};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, logfile } => serve(config, port, logfile).await,
        Commands::Run { name, args, config, logfile } => run_once(name, args, config, logfile).await,
        Commands::Test { addr, workflow, config, logfile } => probe(addr, workflow, config, logfile).await,
    }
}

/// Resolve the logfile: the flag wins, then the catalog's `logfile` field.
fn setup_logging(flag: Option<PathBuf>, config: Option<&Config>) {
    let path = flag.or_else(|| {
        config
            .filter(|c| !c.logfile.is_empty())
            .map(|c| PathBuf::from(&c.logfile))
    });
    if let Err(e) = logging::init(path.as_deref()) {
        eprintln!("Failed to setup logging: {e:#}");
    }
}

async fn serve(config_path: PathBuf, port: Option<u16>, logfile: Option<PathBuf>) -> Result<()> {
    let config = Config::load(&config_path).context("Error loading config")?;
    setup_logging(logfile, Some(&config));

    let store = Arc::new(CatalogStore::new(Catalog::from_config(&config)));
    let _watcher = watcher::watch_config(&config_path, Arc::clone(&store));
    let server = Server::new(store);

    // Flag wins, then the catalog's server.port; 0 means stdio.
    let port = port.unwrap_or(config.server.port);
    if port > 0 {
        if let Err(e) = server.serve_tcp(port).await {
            error!("Failed to start TCP server: {e:#}");
            std::process::exit(1);
        }
        Ok(())
    } else {
        server.serve_stdio().await
    }
}

async fn run_once(
    name: String,
    args: Vec<String>,
    config_path: PathBuf,
    logfile: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load(&config_path).context("Error loading config")?;
    setup_logging(logfile, Some(&config));

    let catalog = Catalog::from_config(&config);
    let arguments = parse_key_values(&args);

    let Some(entity) = catalog.find(&name) else {
        error!("Tool or Workflow '{name}' not found in config");
        std::process::exit(1);
    };

    let outcome = match &entity {
        Entity::Tool(tool) => execute_tool(tool, &arguments).await,
        Entity::Workflow(workflow) => execute_workflow(workflow, &catalog.tools, &arguments).await,
    };

    match outcome {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("Error executing {name}: {}\nOutput: {}", e.message, e.output);
            std::process::exit(1);
        }
    }
}

async fn probe(
    addr: Option<String>,
    workflow: Option<String>,
    config_path: PathBuf,
    logfile: Option<PathBuf>,
) -> Result<()> {
    // The config is only consulted for defaults here; a missing file is fine.
    let config = Config::load(&config_path).ok();
    setup_logging(logfile, config.as_ref());

    let addr = addr.or_else(|| {
        config
            .as_ref()
            .filter(|c| c.server.port > 0)
            .map(|c| format!("localhost:{}", c.server.port))
    });

    let Some(addr) = addr else {
        eprintln!("Error: --addr required for test (e.g. localhost:3000)");
        std::process::exit(1);
    };

    client::run_probe(&addr, workflow.as_deref()).await
}
