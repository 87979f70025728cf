//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};
use pha_agent::Provider;
use pha_core::MockDataGenerator;

/// PHA - Personal Health Agent with a coordinated team of specialists
#[derive(Parser, Debug)]
#[command(name = "pha")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// LLM provider (gemini, openrouter)
    #[arg(long, global = true, env = "PHA_PROVIDER")]
    pub provider: Option<Provider>,

    /// Model identifier, overriding the provider default
    #[arg(long, global = true, env = "PHA_MODEL")]
    pub model: Option<String>,

    /// Seed for the synthetic user data
    #[arg(long, global = true, default_value_t = MockDataGenerator::DEFAULT_SEED)]
    pub seed: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the data, answer two sample queries, then offer interactive mode
    Demo,

    /// Chat with the agent team
    Interactive,

    /// Run every sample query
    Batch,

    /// Answer one query (defaults to the first sample query)
    Single {
        /// Query text
        query: Vec<String>,
    },

    /// Print the synthetic user data summary
    Data,

    /// Run a query through both the agent team and the single-agent baseline
    Compare {
        /// Query text (defaults to the first sample query)
        query: Vec<String>,

        /// Show timing and gateway call counts
        #[arg(long)]
        metrics: bool,
    },

    /// Trace each orchestration step for one query
    Flow {
        /// Query text (defaults to the first sample query)
        query: Vec<String>,
    },
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

/// Join query words, or fall back to the first sample query.
pub fn query_text(words: &[String]) -> String {
    let joined = words.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        pha_core::SAMPLE_QUERIES[0].to_string()
    } else {
        trimmed.to_string()
    }
}
