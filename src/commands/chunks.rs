//! Chunk inspection: how a fragment of rendered HTML would be narrated.

use std::io::{self, Read};

use anyhow::{Context, Result};

use zvox::cli::ChunksArgs;
use zvox::theme::current_theme;
use zvox::MarkerChunker;

fn read_input(args: &ChunksArgs) -> Result<String> {
    if args.file.as_os_str() == "-" {
        let mut html = String::new();
        io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read stdin")?;
        return Ok(html);
    }
    std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))
}

pub fn handle(args: ChunksArgs) -> Result<()> {
    super::load_config()?;
    let html = read_input(&args)?;
    let chunker = MarkerChunker::default();
    let theme = current_theme();

    if args.markers {
        let plan = chunker.plan(&html);
        println!("{}", plan.splice(0).to_html());
        return Ok(());
    }

    let composition = chunker.compose([(args.zone, html.as_str())]);
    if composition.chunks.is_empty() {
        println!("{}", theme.secondary_text("No speakable text."));
        return Ok(());
    }
    for (index, chunk) in composition.chunks.iter().enumerate() {
        let marker = chunk
            .marker_id
            .map(|m| format!("#{m}"))
            .unwrap_or_else(|| "end".to_string());
        println!(
            "{} {} {}",
            theme.secondary_text(&format!("{index:>3}")),
            theme.secondary_text(&format!("[{marker}]")),
            theme.primary_text(&chunk.text)
        );
    }
    Ok(())
}
