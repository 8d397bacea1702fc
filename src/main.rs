//! CLI entry point: ask the agent one question, optionally score the
//! resulting transcript.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use toolbridge::{
    builtin_toolkit, Agent, AppConfig, Evaluator, OpenAiCompatClient, Result,
};

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(about = "Ask a tool-calling agent a question", long_about = None)]
#[command(version)]
struct Cli {
    /// The question to answer
    query: String,

    /// Path to a TOML config file (defaults + env vars otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Score the finished transcript with a second model pass
    #[arg(long)]
    evaluate: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env(),
    };

    let model = Arc::new(OpenAiCompatClient::from_config(&config.model)?);
    let agent = Agent::new(Arc::clone(&model), builtin_toolkit()?)?
        .with_max_turns(config.agent.max_turns)
        .with_system_prompt(&config.agent.system_prompt);

    let outcome = agent.run(&cli.query).await?;
    println!("{}", outcome.answer);

    if cli.evaluate {
        let verdict = Evaluator::new(model).evaluate(&outcome.transcript).await?;
        println!();
        println!("tool selection correct: {}", verdict.tool_selection_correct);
        println!("response quality:       {}", verdict.response_quality);
        println!("overall success:        {}", verdict.overall_success);
        println!("rationale: {}", verdict.rationale);
        if !verdict.parsed {
            println!("(judge output did not follow the requested format)");
        }
    }

    Ok(())
}
