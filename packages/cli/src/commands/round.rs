use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use cowrite_agent::ScriptedAgent;
use cowrite_editor::{Document, EditMode, EditSession, RoundOutcome};
use serde_json::Value;
use std::path::PathBuf;

use super::apply::print_report;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RoundArgs {
    /// Markdown document to edit
    pub input: PathBuf,

    /// Recorded tool payload the agent answers with
    #[arg(short, long)]
    pub response: PathBuf,

    /// Instruction sent to the agent
    #[arg(short, long, default_value = "")]
    pub instruction: String,

    /// Editing mode (A = operations, B = full replace); overrides the config
    #[arg(short, long)]
    pub mode: Option<EditMode>,

    /// Write the result back to the document
    #[arg(short, long)]
    pub write: bool,

    /// Print the prompt the agent received
    #[arg(long)]
    pub show_prompt: bool,
}

pub async fn round(args: RoundArgs, config: &Config) -> Result<()> {
    let content = std::fs::read_to_string(&args.response)
        .with_context(|| format!("Cannot read {}", args.response.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", args.response.display()))?;

    let mut session_config = config.session_config();
    if let Some(mode) = args.mode {
        session_config.mode = mode;
    }

    let doc = Document::load(&args.input)?;
    let mut session = EditSession::new(config.session_id.clone(), doc, session_config);
    let agent = ScriptedAgent::scripted(vec![payload]);

    println!(
        "🤖 {} round on {} (mode {})",
        "Running".green().bold(),
        args.input.display(),
        session.mode()
    );
    println!("   Base: {}", session.document().fingerprint().to_string().dimmed());

    let result = session.run_round(&agent, &args.instruction).await;

    if args.show_prompt {
        for prompt in agent.runner().prompts() {
            println!();
            println!("{}", prompt.dimmed());
        }
        println!();
    }

    let outcome = result?;
    match &outcome {
        RoundOutcome::Applied { report, .. } => print_report(report, session.warning(report)),
        RoundOutcome::Replaced { .. } => println!("   {} document replaced", "✓".green()),
    }
    if !outcome.reply().is_empty() {
        println!("   {} {}", "Agent:".cyan(), outcome.reply());
    }
    println!("   Revision: {}", outcome.revision_id());
    println!("   Now: {}", session.document().fingerprint().to_string().dimmed());

    if args.write {
        let mut doc = session.into_document();
        doc.save()?;
        println!("   {} {}", "Saved".green(), args.input.display());
    }

    Ok(())
}
