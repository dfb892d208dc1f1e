use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wayfinder_agents::MapAgent;
use wayfinder_core::{Intent, ParsedQuery, QueryError, QueryParams, DEFAULT_POI_RADIUS_KM};
use wayfinder_llm::OllamaClassifier;
use wayfinder_observability::{init_tracing, AppMetrics};
use wayfinder_providers::{
    BackendConfig, OsmMapProvider, OsmProviderParams, SampleMapProvider,
};

#[derive(Debug, Parser)]
#[command(name = "wayfinder")]
#[command(about = "Map assistant: free-text queries over sample or live map data")]
struct Cli {
    /// Route supported queries to the live OpenStreetMap services.
    #[arg(long)]
    live: bool,

    #[arg(long, env = "WAYFINDER_OLLAMA_URL", default_value = "http://localhost:11434/api/chat")]
    ollama_url: String,

    #[arg(long, default_value = "llama3:8b")]
    model: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat loop.
    Chat,
    Geocode {
        place: String,
    },
    ReverseGeocode {
        latitude: f64,
        longitude: f64,
    },
    Route {
        origin: String,
        destination: String,
    },
    Poi {
        category: String,
        near: String,
        #[arg(long, default_value_t = DEFAULT_POI_RADIUS_KM)]
        radius_km: f64,
    },
    Matrix {
        /// At least two place names.
        #[arg(num_args = 2.., required = true)]
        places: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfinder_cli");
    let cli = Cli::parse();

    let agent = build_agent(&cli)?;

    match cli.command {
        Command::Chat => run_chat(&agent).await?,
        Command::Geocode { place } => {
            run_once(
                &agent,
                ParsedQuery {
                    intent: Intent::Geocode,
                    params: QueryParams::Geocode { place },
                },
            )
            .await;
        }
        Command::ReverseGeocode {
            latitude,
            longitude,
        } => {
            run_once(
                &agent,
                ParsedQuery {
                    intent: Intent::ReverseGeocode,
                    params: QueryParams::ReverseGeocode {
                        latitude,
                        longitude,
                    },
                },
            )
            .await;
        }
        Command::Route {
            origin,
            destination,
        } => {
            run_once(
                &agent,
                ParsedQuery {
                    intent: Intent::Route,
                    params: QueryParams::Route {
                        origin,
                        destination,
                    },
                },
            )
            .await;
        }
        Command::Poi {
            category,
            near,
            radius_km,
        } => {
            run_once(
                &agent,
                ParsedQuery {
                    intent: Intent::PoiSearch,
                    params: QueryParams::PoiSearch {
                        category,
                        center_place: near,
                        radius_km,
                    },
                },
            )
            .await;
        }
        Command::Matrix { places } => {
            run_once(
                &agent,
                ParsedQuery {
                    intent: Intent::Matrix,
                    params: QueryParams::Matrix { places },
                },
            )
            .await;
        }
    }

    Ok(())
}

fn build_agent(cli: &Cli) -> Result<MapAgent> {
    let metrics = AppMetrics::shared();
    let sample = Arc::new(SampleMapProvider::new());
    let live = Arc::new(OsmMapProvider::new(OsmProviderParams::default())?);
    let fallback = Arc::new(OllamaClassifier::new(
        cli.ollama_url.clone(),
        cli.model.clone(),
    ));

    Ok(MapAgent::new(
        sample,
        live,
        fallback,
        BackendConfig {
            live_mode: cli.live,
        },
        metrics,
    ))
}

async fn run_chat(agent: &MapAgent) -> Result<()> {
    println!("Wayfinder chat mode. Type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        match agent.handle(message).await {
            Ok(outcome) => println!("{}\n", serde_json::to_string_pretty(&outcome)?),
            Err(err) => print_error(&err),
        }
    }

    let snapshot = agent.metrics().snapshot();
    println!(
        "session: {} request(s), {} fallback call(s), {} backend error(s)",
        snapshot.requests_total, snapshot.fallback_total, snapshot.backend_errors_total
    );

    Ok(())
}

async fn run_once(agent: &MapAgent, query: ParsedQuery) {
    match agent.dispatch(query).await {
        Ok(outcome) => match serde_json::to_string_pretty(&outcome) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("failed rendering result: {err}"),
        },
        Err(err) => print_error(&err),
    }
}

fn print_error(err: &QueryError) {
    eprintln!("[{}] {}", err.stage(), err);
}
