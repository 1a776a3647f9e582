//! Tiller CLI binary entry point.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tiller::agent_loop::{AgentRunner, AgentUpdate};
use tiller::backend::LocalBackend;
use tiller::cli::{Cli, Commands, RunArgs};
use tiller::config::TillerConfig;
use tiller::error::TillerError;
use tiller::models::ModelSpec;
use tiller::provider::create_provider;
use tiller::session::AgentSession;
use tiller::tools::{ToolContext, ToolRegistry};
use tiller::types::GenerationSettings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tiller::util::logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Tools => {
            handle_tools();
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        Err(TillerError::Aborted) => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn handle_run(args: RunArgs) -> Result<(), TillerError> {
    let spec: ModelSpec = args.model.parse()?;
    let config = TillerConfig::from_env();
    let provider = create_provider(&spec, &config)?;
    if !provider.is_available().await {
        eprintln!(
            "warning: {} does not look reachable; trying anyway",
            provider.provider_name()
        );
    }

    let cwd = match args.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let mut settings = config.agent_settings().clone();
    if let Some(max) = args.max_iterations {
        settings.max_iterations = max;
    }

    let generation = GenerationSettings {
        temperature: args.temperature,
        ..Default::default()
    };
    let context = ToolContext::new(cwd, Arc::new(LocalBackend::new()))
        .with_command_timeout(Duration::from_millis(settings.command_timeout_ms));
    let runner = AgentRunner::new(provider, Arc::new(ToolRegistry::builtin()), context)
        .with_settings(settings)
        .with_generation_settings(generation);
    let mut session = AgentSession::new(runner);

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current step...");
            cancel.cancel();
        }
    });

    let answer = session.send(&args.prompt, print_update).await?;
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{answer}");
    Ok(())
}

fn print_update(update: AgentUpdate) {
    match update {
        AgentUpdate::Thinking { text } => eprintln!("… {text}"),
        AgentUpdate::Tool { call } => eprintln!("⚡ {call}"),
        AgentUpdate::ToolResult { preview, .. } => {
            for line in preview.lines().take(4) {
                eprintln!("  │ {line}");
            }
        }
        AgentUpdate::Error { message } => eprintln!("✗ {message}"),
        // The answer goes to stdout once the turn returns.
        AgentUpdate::Response { .. } => {}
    }
}

fn handle_tools() {
    let registry = ToolRegistry::builtin();
    for tool in registry.tools() {
        let summary = tool.description().lines().next().unwrap_or_default();
        println!("{:<22} {summary}", tool.name());
    }
}
