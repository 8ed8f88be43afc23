use anyhow::Result;
use clap::Args;
use cowrite_editor::Document;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Markdown document
    pub input: PathBuf,
}

pub fn fingerprint(args: FingerprintArgs) -> Result<()> {
    let doc = Document::load(&args.input)?;
    println!("{}", doc.fingerprint());
    Ok(())
}
