//! Command line front end for the action router.
//!
//! Loads the route sources named in the configuration file, then lists,
//! matches, reverses, or watches them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use action_router::config::{load_config, ReloadEvent, RouteWatcher};
use action_router::observability::logging::init_logging;
use action_router::{ArgMap, ArgValue, MediaType, Router};

#[derive(Parser)]
#[command(name = "action-router")]
#[command(about = "Inspect and query action route tables", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table
    Routes,
    /// Dispatch a request and print the matched action and arguments
    Match {
        method: String,
        path: String,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Resolve an action and key=value arguments to a URL
    Reverse {
        action: String,
        args: Vec<String>,
        #[arg(long)]
        format: Option<String>,
        /// Prefix the URL with scheme and host
        #[arg(long)]
        absolute: bool,
    },
    /// Load routes and reload them on change until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    if let Err(e) = init_logging(&config.observability.log_level) {
        eprintln!("Logging already initialized: {e}");
    }

    let sources = config.routes.file_sources();
    let router = Arc::new(Router::new());
    router.load(&sources)?;

    match cli.command {
        Commands::Routes => {
            for route in router.routes() {
                println!("{}", route.to_fixed_length_string());
            }
        }
        Commands::Match {
            method,
            path,
            host,
            format,
            query,
        } => {
            let mut request = config.request.to_request(&method, &path);
            if let Some(host) = host {
                request = request.with_host(host);
            }
            if let Some(format) = format.as_deref() {
                request = request.with_format(parse_format(format)?);
            }
            if let Some(query) = query {
                request = request.with_query(query);
            }

            let route = router.route(&mut request)?;
            print_json(&json!({
                "method": request.method,
                "route": route.to_string(),
                "action": request.action,
                "args": request.route_args,
                "format": request.format,
            }))?;
        }
        Commands::Reverse {
            action,
            args,
            format,
            absolute,
        } => {
            let mut current = config.request.to_request("GET", "/");
            if let Some(format) = format.as_deref() {
                current = current.with_format(parse_format(format)?);
            }

            let mut definition = router.reverse(&action, parse_args(&args)?, Some(&current))?;
            if absolute {
                definition = definition.absolute(&current);
            }
            print_json(&definition)?;
        }
        Commands::Watch => {
            if !config.watch.enabled {
                tracing::warn!("Watching is disabled in the configuration");
                return Ok(());
            }

            let (watcher, mut events) = RouteWatcher::new(
                Arc::clone(&router),
                sources,
                Duration::from_secs(config.watch.poll_interval_secs),
            );
            let _handle = watcher.run()?;

            loop {
                tokio::select! {
                    Some(event) = events.recv() => match event {
                        ReloadEvent::Reloaded { routes } => println!("reloaded: {routes} routes"),
                        ReloadEvent::Failed(reason) => eprintln!("reload failed: {reason}"),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn parse_format(format: &str) -> Result<MediaType, String> {
    MediaType::from_format(format).ok_or_else(|| format!("invalid format `{format}`"))
}

/// `key=value` pairs; a repeated key collects its values into a list.
fn parse_args(pairs: &[String]) -> Result<ArgMap, String> {
    let mut args = ArgMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("argument `{pair}` is not key=value"))?;
        let merged = match args.remove(key) {
            None => ArgValue::from(value),
            Some(ArgValue::Single(first)) => ArgValue::List(vec![first, value.to_string()]),
            Some(ArgValue::List(mut values)) => {
                values.push(value.to_string());
                ArgValue::List(values)
            }
        };
        args.insert(key.to_string(), merged);
    }
    Ok(args)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
