//! Ideal Nation - Entry Point
//!
//! Seeds the default twins, wires a chat gateway and runs the behavior
//! simulation, logging every published event as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use ideal_nation::core::config::SimulationConfig;
use ideal_nation::core::error::Result;
use ideal_nation::events::NationEvent;
use ideal_nation::llm::{CannedGateway, ChatGateway, LlmClient};
use ideal_nation::simulation::{default_population, Nation};

const OFFLINE_REPLY: &str = "在理想国里，每一个声音都值得被倾听。";

/// Autonomous digital twin simulation
#[derive(Parser, Debug)]
#[command(name = "ideal-nation")]
#[command(about = "Run the Ideal Nation digital twin behavior simulation")]
struct Args {
    /// TOML file overriding the default simulation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a canned reply instead of calling the LLM API
    #[arg(long)]
    offline: bool,

    /// Run this many ticks and exit (default: run until Ctrl-C)
    #[arg(long)]
    ticks: Option<u64>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ideal_nation=info")),
        )
        .init();

    let rt = Runtime::new()?;
    rt.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_toml_file(path)?,
        None => SimulationConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let gateway: Arc<dyn ChatGateway> = if args.offline {
        tracing::info!("Running offline with canned replies");
        Arc::new(CannedGateway::new(OFFLINE_REPLY))
    } else {
        let client = LlmClient::from_env()?;
        tracing::info!(format = ?client.api_format(), "Using LLM gateway");
        Arc::new(client)
    };

    let nation = Arc::new(Nation::new(config, gateway)?);
    for agent in default_population() {
        nation.add_agent(agent).await?;
    }
    tracing::info!(agents = nation.list_agents().await.len(), "Ideal Nation starting...");

    let mut events = nation.subscribe();
    let (done_tx, mut done_rx) = oneshot::channel::<()>();
    let logger = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => log_event(&event),
                    None => break,
                },
                _ = &mut done_rx => {
                    // Flush whatever was published before shutdown
                    while let Some(event) = events.try_recv() {
                        log_event(&event);
                    }
                    break;
                }
            }
        }
    });

    match args.ticks {
        Some(ticks) => {
            for _ in 0..ticks {
                nation.tick().await;
            }
        }
        None => {
            nation.start();
            tokio::signal::ctrl_c().await?;
            nation.stop();
        }
    }

    let _ = done_tx.send(());
    if let Err(e) = logger.await {
        tracing::warn!(error = %e, "Event logger failed");
    }

    print_summary(&nation).await;
    Ok(())
}

fn log_event(event: &NationEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!(target: "ideal_nation::events", "{}", json),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
    }
}

async fn print_summary(nation: &Nation) {
    let conversations = nation.list_conversations().await;
    let fragments = nation.list_fragments().await;
    let rules = nation.list_rules().await;

    println!("\n=== IDEAL NATION ===");
    println!("Ticks:         {}", nation.tick_count());
    println!("Conversations: {}", conversations.len());
    println!("Fragments:     {}", fragments.len());
    println!("Rules:         {}", rules.len());
    println!();

    for agent in nation.list_agents().await {
        println!(
            "  {:<12} {:<12} ({:>6.1}, {:>6.1})  memories: {}",
            agent.name,
            agent.action.as_str(),
            agent.position.x,
            agent.position.z,
            agent.memories.len()
        );
    }

    if !rules.is_empty() {
        println!("\nRules:");
        for rule in &rules {
            println!("  [{:.2}] {}", rule.consensus_score, rule.content);
        }
    }
}
