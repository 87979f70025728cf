//! Command handlers for CLI subcommands.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use pha_agent::{build_gateway, ModelConfig, SharedGateway, UnifiedAgent};
use pha_core::{MockDataGenerator, UserDataBundle, SAMPLE_QUERIES};
use pha_memory::Memory;
use pha_orchestrator::{compare, Orchestrator, OrchestratorConfig, OrchestratorError};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::cli::{query_text, Cli, Commands};
use crate::display;
use crate::interactive;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Sample queries answered by the demo before offering interactive mode.
const DEMO_QUERY_COUNT: usize = 2;

/// Everything a command needs once the gateway is up.
pub struct Session {
    pub bundle: Arc<UserDataBundle>,
    pub gateway: SharedGateway,
    pub config: OrchestratorConfig,
    pub orchestrator: Orchestrator,
}

impl Session {
    /// Create a session whose memory is seeded with the bundle's conditions
    /// and medications.
    pub fn new(
        bundle: Arc<UserDataBundle>,
        gateway: SharedGateway,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let memory = Memory::seeded(
            config.memory_limits(),
            bundle.condition_names(),
            bundle.medication_names(),
        );
        let orchestrator = Orchestrator::new(Arc::clone(&bundle), Arc::clone(&gateway), config)?
            .with_memory(memory);
        Ok(Self {
            bundle,
            gateway,
            config,
            orchestrator,
        })
    }

    /// A fresh single-agent baseline over the same data and gateway.
    pub fn unified_agent(&self) -> UnifiedAgent {
        UnifiedAgent::new(
            Arc::clone(&self.bundle),
            Arc::clone(&self.gateway),
            self.config.memory_limits(),
        )
    }

    /// Run one query and print the answer. Errors are printed, not returned.
    pub async fn answer(&self, query: &str) {
        println!("\nYou: {query}");
        match self.orchestrator.process_query(query).await {
            Ok(outcome) => display::print_outcome(&outcome),
            Err(e) => print_query_error(&e),
        }
    }
}

/// Print a failed query, including the answer when one was produced.
pub fn print_query_error(error: &OrchestratorError) {
    if let Some(answer) = error.final_answer() {
        println!("\n{answer}");
        eprintln!("Warning: {error}. This turn was not saved to memory.");
    } else {
        eprintln!("Error: {error}");
    }
}

fn model_config(cli: &Cli) -> Result<ModelConfig> {
    let mut config = ModelConfig::from_env()?;
    if let Some(provider) = cli.provider {
        config = config.with_provider(provider);
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    Ok(config)
}

/// Execute the CLI command, defaulting to the demo.
pub fn execute(cli: Cli) -> Result<()> {
    let bundle = Arc::new(MockDataGenerator::new(cli.seed).generate());
    let command = cli.command.clone().unwrap_or(Commands::Demo);

    if command == Commands::Data {
        display::print_data_summary(&bundle);
        return Ok(());
    }

    let model = model_config(&cli)?;
    let gateway = build_gateway(&model)?;
    let config = OrchestratorConfig::from_env()?;
    info!(provider = %model.provider, model = %model.model, "Starting session");

    let runtime = Runtime::new()?;
    let session = Session::new(bundle, gateway, config)?;

    match command {
        Commands::Demo => cmd_demo(&runtime, &session),
        Commands::Interactive => interactive::run(&runtime, &session),
        Commands::Batch => {
            runtime.block_on(cmd_batch(&session));
            Ok(())
        }
        Commands::Single { query } => {
            runtime.block_on(session.answer(&query_text(&query)));
            Ok(())
        }
        Commands::Compare { query, metrics } => {
            runtime.block_on(cmd_compare(&session, &query_text(&query), metrics));
            Ok(())
        }
        Commands::Flow { query } => {
            runtime.block_on(cmd_flow(&session, &query_text(&query)));
            Ok(())
        }
        Commands::Data => Ok(()),
    }
}

fn cmd_demo(runtime: &Runtime, session: &Session) -> Result<()> {
    display::heading("Personal Health Agent demo");
    println!("Model: {}", session.orchestrator.model_id());
    display::print_data_summary(&session.bundle);

    for query in SAMPLE_QUERIES.iter().take(DEMO_QUERY_COUNT) {
        runtime.block_on(session.answer(query));
    }

    print!("\nStart interactive mode? [y/N] ");
    io::stdout().flush()?;
    let mut reply = String::new();
    io::stdin().lock().read_line(&mut reply)?;
    if wants_interactive(&reply) {
        interactive::run(runtime, session)
    } else {
        println!("Goodbye!");
        Ok(())
    }
}

fn wants_interactive(reply: &str) -> bool {
    matches!(reply.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn cmd_batch(session: &Session) {
    for (i, query) in SAMPLE_QUERIES.iter().enumerate() {
        display::heading(&format!("Query {}/{}", i + 1, SAMPLE_QUERIES.len()));
        session.answer(query).await;
    }
    display::print_summary(&session.orchestrator.conversation_summary().await);
}

async fn cmd_compare(session: &Session, query: &str, metrics: bool) {
    let mut unified = session.unified_agent();
    debug!(model = %unified.model_id(), "Comparing systems");
    let report = compare(&session.orchestrator, &mut unified, query).await;
    display::print_comparison(&report, metrics);
}

async fn cmd_flow(session: &Session, query: &str) {
    println!("\nYou: {query}");
    match session.orchestrator.process_query(query).await {
        Ok(outcome) => {
            display::print_trace(&outcome);
            display::heading("Final answer");
            println!("{}", outcome.final_answer);
        }
        Err(e) => print_query_error(&e),
    }
}
