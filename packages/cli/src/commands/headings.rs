use anyhow::Result;
use clap::Args;
use colored::Colorize;
use cowrite_editor::Document;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HeadingsArgs {
    /// Markdown document
    pub input: PathBuf,

    /// Print the index as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn headings(args: HeadingsArgs) -> Result<()> {
    let doc = Document::load(&args.input)?;
    let index = doc.headings();

    if args.json {
        println!("{}", serde_json::to_string_pretty(index.entries())?);
        return Ok(());
    }

    if index.is_empty() {
        println!("{}", "No headings".yellow());
        return Ok(());
    }

    for entry in index.entries() {
        let section = index.section_range(entry);
        println!(
            "{}{} {}  {}",
            "  ".repeat(usize::from(entry.level.saturating_sub(1))),
            "#".repeat(usize::from(entry.level)).dimmed(),
            entry.text.bold(),
            format!("[{}..{})", section.start, section.end).dimmed()
        );
    }

    Ok(())
}
