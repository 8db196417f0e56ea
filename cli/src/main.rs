//! Ludex CLI
//!
//! Client for the game catalog search API.
//!
//! Commands:
//! - ludex search "query" [--field title|year|developer]
//! - ludex interactive [--field ...]   # debounced as-you-type search
//! - ludex list
//! - ludex stats
//! - ludex populate [--limit 10]
//! - ludex doctor

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use ludex_core::{
    Catalog, Config, ControllerOptions, HttpBackend, Renderer, SearchController, SearchField,
    Severity, SubmitOutcome,
};

mod interactive;
mod render;

use render::{format_statistics, TerminalRenderer};

#[derive(Parser)]
#[command(name = "ludex")]
#[command(about = "Search the game catalog from the terminal")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides LUDEX_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to config file (default: ~/.ludex/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Display language for result links (e.g. "es")
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Title,
    Year,
    Developer,
}

impl From<FieldArg> for SearchField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Title => SearchField::Title,
            FieldArg::Year => SearchField::Year,
            FieldArg::Developer => SearchField::Developer,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single search
    Search {
        /// Search query
        query: String,

        /// Field to search
        #[arg(long, value_enum, default_value = "title")]
        field: FieldArg,

        /// Print the raw JSON envelope
        #[arg(long)]
        json: bool,
    },

    /// Interactive, debounced search session
    Interactive {
        /// Field to search
        #[arg(long, value_enum, default_value = "title")]
        field: FieldArg,
    },

    /// List every game in the local catalog
    List {
        /// Print the raw JSON envelope
        #[arg(long)]
        json: bool,
    },

    /// Show catalog statistics
    Stats,

    /// Import games into the catalog
    Populate {
        /// Maximum number of games to import
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Run diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_directive(cli.verbose).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path);
    let base_url = config.resolve_base_url(cli.api_url.as_deref());
    let language = cli
        .lang
        .clone()
        .unwrap_or_else(|| config.display.language.clone());

    let backend = Arc::new(
        HttpBackend::from_config(&base_url, &config.api)
            .with_context(|| format!("Failed to create client for {}", base_url))?,
    );

    match cli.command {
        Commands::Search { query, field, json } => {
            let renderer = Arc::new(TerminalRenderer::new(&language, json));
            let controller = build_controller(field.into(), backend, renderer, &config);

            match controller.on_submit_now(&query).await {
                SubmitOutcome::TransportError(_) | SubmitOutcome::BackendError(_) => {
                    std::process::exit(1);
                }
                _ => {}
            }
        }

        Commands::Interactive { field } => {
            let renderer = Arc::new(TerminalRenderer::new(&language, false));
            let controller = build_controller(field.into(), backend.clone(), renderer, &config);
            interactive::run(controller, backend, config.search.sweep_interval()).await?;
        }

        Commands::List { json } => {
            let renderer = TerminalRenderer::new(&language, json);
            match backend.list_all().await {
                Ok(results) => renderer.render(&results),
                Err(e) => {
                    renderer.render_notice(&format!("Connection error: {}", e), Severity::Danger);
                    std::process::exit(1);
                }
            }
        }

        Commands::Stats => match backend.statistics().await {
            Ok(stats) => print!("{}", format_statistics(&stats)),
            Err(e) => {
                eprintln!("Failed to load statistics: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Populate { limit } => match backend.populate(limit).await {
            Ok(message) => println!("{}", message),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Doctor => {
            println!("Ludex Diagnostics");
            println!("=================\n");

            println!("Config: {:?}", config_path);
            if config_path.exists() {
                println!("  Status: ✓ exists");
            } else {
                println!("  Status: ✗ not found (using defaults)");
            }

            println!("\nSearch:");
            println!("  Debounce: {}ms", config.search.debounce_ms);
            println!("  Min query length: {}", config.search.min_query_len);
            println!(
                "  Cache: {} entries, {}s TTL, swept every {}s",
                config.search.cache_capacity,
                config.search.cache_ttl_secs,
                config.search.sweep_interval_secs
            );
            println!("  Cache-exempt terms: {}", config.search.exempt_terms.len());
            println!("  Language: {}", language);

            println!("\nBackend: {}", backend.base_url());
            match backend.statistics().await {
                Ok(stats) => {
                    println!("  Status: ✓ reachable");
                    println!("  Games: {}", stats.total);
                }
                Err(e) => {
                    println!("  Status: ✗ unreachable");
                    println!("  Error: {}", e);
                    println!("  Hint: set --api-url or LUDEX_API_URL");
                }
            }

            println!("\n--- End Diagnostics ---");
        }
    }

    Ok(())
}

fn log_directive(verbose: bool) -> &'static str {
    if verbose {
        "ludex=debug"
    } else {
        "ludex=info"
    }
}

fn build_controller(
    field: SearchField,
    backend: Arc<HttpBackend>,
    renderer: Arc<TerminalRenderer>,
    config: &Config,
) -> SearchController {
    SearchController::with_options(
        field,
        backend,
        renderer,
        ControllerOptions::from(&config.search),
        Arc::new(config.search.exemption_policy()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(false), "ludex=info");
        assert_eq!(log_directive(true), "ludex=debug");
        assert!(log_directive(false)
            .parse::<tracing_subscriber::filter::Directive>()
            .is_ok());
    }
}
