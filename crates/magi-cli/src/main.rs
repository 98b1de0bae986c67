//! MAGI CLI - Command-line console for the triad decision system

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use magi_core::{Magi, MagiConfig, PipelineEvent};
use magi_provider::OpenAiCaller;

#[derive(Parser)]
#[command(name = "magi")]
#[command(about = "MAGI - Triad deliberation over a language model")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Put a question to the triad
    Ask {
        /// The question text
        question: String,
        /// Configuration file path
        #[arg(short, long, default_value = "config/magi.toml")]
        config: String,
    },
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/magi.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    match cli.command {
        Some(Commands::Ask { question, config }) => {
            let config = load_config(&config)?;
            ask(&config, &question).await?;
        }
        Some(Commands::Check { config: path }) => {
            let config = load_config(&path)?;
            // Constructing the caller validates key and endpoint settings.
            OpenAiCaller::new(config.provider.clone())
                .with_context(|| format!("invalid provider settings in {path}"))?;
            println!("config ok: {path} ({} via {:?})", config.provider.model, config.provider.kind);
        }
        None => {
            println!("MAGI v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<MagiConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path}"))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config file {path}"))
}

async fn ask(config: &MagiConfig, question: &str) -> anyhow::Result<()> {
    let caller = Arc::new(OpenAiCaller::new(config.provider.clone())?);
    let (magi, mut events) = Magi::new(config, caller);

    // Print progress as it lands; the triad answers out of order.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PipelineEvent::Classified { is_yes_or_no, detection_error, .. } => {
                    let kind = if is_yes_or_no { "yes/no" } else { "open" };
                    match detection_error {
                        Some(error) => println!("type: {kind} (detection failed: {error})"),
                        None => println!("type: {kind}"),
                    }
                }
                PipelineEvent::Verdict { verdict, .. } => {
                    println!("{:<12} {}", verdict.persona.designation(), verdict.status);
                }
                PipelineEvent::FinalDecision { .. } => break,
            }
        }
    });

    let deliberation = magi.ask(question).await;
    printer.await.ok();

    println!();
    for verdict in &deliberation.verdicts {
        println!("=== {} ({}): {}", verdict.persona.designation(), verdict.persona.archetype(), verdict.status);
        if let Some(answer) = &verdict.answer {
            println!("{answer}");
        }
        if let Some(conditions) = &verdict.conditions {
            for condition in conditions {
                println!("  * {condition}");
            }
        }
        if let Some(error) = &verdict.error {
            println!("  call failed: {error}");
        }
        println!();
    }
    match deliberation.decision {
        Some(decision) => println!("FINAL DECISION: {}", decision.status),
        // Only reachable when another handle superseded the question.
        None => println!("FINAL DECISION: superseded, no decision"),
    }

    Ok(())
}
