//! Echo classification: would the recognizer's transcript be taken as a
//! command, or discarded as narration feedback?

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use zvox::cli::EchoArgs;
use zvox::theme::current_theme;
use zvox::voice::Rejection;
use zvox::{CommandGate, EchoGuard};

pub fn handle(args: EchoArgs) -> Result<()> {
    let config = super::load_config()?;
    let theme = current_theme();

    let mut guard = EchoGuard::new(config.echo.clone());
    for text in &args.spoken {
        guard.record(text);
    }
    let gate = CommandGate::new(Arc::new(Mutex::new(guard)));

    for transcript in &args.transcripts {
        let verdict = match gate.admit(transcript) {
            Ok(command) => theme.success_text(&format!("command  {command}")),
            Err(Rejection::Echo) => theme.secondary_text(&format!("echo     {}", transcript.trim())),
            Err(Rejection::Empty) => theme.secondary_text("empty"),
        };
        println!("{verdict}");
    }
    Ok(())
}
