//! `zvox play`: drive the display adapter from a recorded VM transcript.
//!
//! Each message of the transcript goes through the adapter exactly as a live
//! VM's would. Pending input requests are answered from `--command` values,
//! which pass through the voice command gate first, so a command that echoes
//! the narration is dropped like a misheard transcript would be.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use zvox::adapter::{drive, ChannelHooks, HookEvent};
use zvox::cli::PlayArgs;
use zvox::narration::{ConsoleSpeech, SpeechEngine};
use zvox::protocol::{InputKind, Metrics};
use zvox::theme::{current_theme, Theme};
use zvox::vm::{FileSaveStore, ScriptedVm};
use zvox::voice::Rejection;
use zvox::{
    AdapterSettings, CommandGate, Config, DisplayAdapter, EchoGuard, NarrationEvent,
    NarrationPlayer, PlayerSettings, Screen, Zone,
};

/// Key sent for character input requests.
const CHAR_KEY: &str = "return";

#[cfg(not(tarpaulin_include))]
pub fn handle(args: PlayArgs) -> Result<()> {
    let config = super::load_config()?;
    let vm = ScriptedVm::load(&args.transcript)
        .with_context(|| format!("Failed to load transcript {}", args.transcript.display()))?;
    let store = FileSaveStore::locate(args.save_dir.clone().or_else(|| config.save_dir()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(async {
        let mut session = PlaySession::new(&args, &config, vm.clone(), store);
        session.install_interrupt_handler();
        session.run(&vm, args.restore).await?;
        println!(
            "{}",
            session
                .theme
                .secondary_text(&format!("Transcript finished: {} replies sent.", vm.replies().len()))
        );
        Ok(())
    })
}

struct Narrator {
    player: NarrationPlayer,
    events: UnboundedReceiver<NarrationEvent>,
}

struct PlaySession {
    adapter: Mutex<DisplayAdapter>,
    hooks: UnboundedReceiver<HookEvent>,
    screen: Arc<Mutex<Screen>>,
    narrator: Option<Narrator>,
    gate: CommandGate,
    commands: VecDeque<String>,
    interrupted: Arc<AtomicBool>,
    shown_revision: u64,
    theme: Theme,
}

impl PlaySession {
    fn new(args: &PlayArgs, config: &Config, vm: ScriptedVm, store: FileSaveStore) -> Self {
        let mut screen = Screen::headless();
        screen.set_narrated_zones(&config.narration.zones);
        let screen = Arc::new(Mutex::new(screen));
        let echo = Arc::new(Mutex::new(EchoGuard::new(config.echo.clone())));

        let narrate = args.narrate || config.narration.autoplay;
        let narrator = narrate.then(|| {
            let engine: Arc<dyn SpeechEngine> =
                Arc::new(ConsoleSpeech::new(config.narration.words_per_minute));
            let (player, events) = NarrationPlayer::new(
                screen.clone(),
                echo.clone(),
                engine,
                config.voices.clone(),
                PlayerSettings::from(&config.narration),
            );
            Narrator { player, events }
        });

        let (hooks, hook_events) = ChannelHooks::new();
        let mut settings = AdapterSettings::from(config);
        settings.autoplay = narrate;
        let adapter = DisplayAdapter::new(
            screen.clone(),
            vm,
            Arc::new(store),
            settings,
        )
        .with_hooks(hooks);

        Self {
            adapter: Mutex::new(adapter),
            hooks: hook_events,
            screen,
            narrator,
            gate: CommandGate::new(echo),
            commands: args.commands.iter().cloned().collect(),
            interrupted: Arc::new(AtomicBool::new(false)),
            shown_revision: 0,
            theme: current_theme(),
        }
    }

    /// Ctrl-C stops narration and ends the replay after the current turn.
    fn install_interrupt_handler(&self) {
        let interrupted = self.interrupted.clone();
        let player = self.narrator.as_ref().map(|n| n.player.clone());
        let result = ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
            if let Some(player) = &player {
                player.stop(false);
            }
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
    }

    async fn run(&mut self, vm: &ScriptedVm, restore: bool) -> Result<()> {
        {
            let mut adapter = self.adapter.lock();
            adapter.init(Metrics::default())?;
            if restore {
                adapter.arm_restore();
            }
        }

        while let Some(message) = vm.next_message() {
            if self.interrupted.load(Ordering::SeqCst) {
                println!("{}", self.theme.secondary_text("Interrupted."));
                break;
            }
            let tasks = self.adapter.lock().handle(message);
            drive(&self.adapter, tasks).await;

            if !self.present_turn().await {
                break;
            }
            self.answer_input()?;
        }
        Ok(())
    }

    /// Speak or print what the turn put on screen. Returns false once the
    /// VM has halted.
    async fn present_turn(&mut self) -> bool {
        let mut spoke = false;
        while let Ok(event) = self.hooks.try_recv() {
            match event {
                HookEvent::Narrate(_) => {
                    if let Some(narrator) = &mut self.narrator {
                        narrator.player.speak(0).await;
                        while let Ok(event) = narrator.events.try_recv() {
                            if let NarrationEvent::Status(status) = event {
                                eprintln!("{}", self.theme.error_text(&status));
                            }
                        }
                        spoke = true;
                    }
                }
                HookEvent::Notice(message) => {
                    eprintln!("{}", self.theme.error_text(&format!("VM error: {message}")));
                    return false;
                }
            }
        }

        let mut screen = self.screen.lock();
        if screen.revision() != self.shown_revision {
            self.shown_revision = screen.revision();
            if !spoke {
                print_screen(&mut screen, &self.theme);
            }
        }
        true
    }

    /// Answer a pending prompt or input request from the command queue.
    fn answer_input(&mut self) -> Result<()> {
        let mut adapter = self.adapter.lock();
        if adapter.state().prompt.is_some() {
            let value = self.commands.pop_front();
            println!(
                "{}",
                self.theme
                    .accent_text(&format!("file> {}", value.as_deref().unwrap_or("(cancel)")))
            );
            adapter.answer_special(value.as_deref())?;
            return Ok(());
        }

        let Some(request) = adapter.pending_input() else {
            return Ok(());
        };
        match request.kind {
            InputKind::Char => {
                println!("{}", self.theme.accent_text(&format!("[{CHAR_KEY}]")));
                adapter.send_char(CHAR_KEY)?;
            }
            InputKind::Line => {
                while let Some(transcript) = self.commands.pop_front() {
                    match self.gate.admit(&transcript) {
                        Ok(command) => {
                            println!("{}", self.theme.accent_text(&format!("> {command}")));
                            adapter.send_line(&command)?;
                            break;
                        }
                        Err(Rejection::Echo) => println!(
                            "{}",
                            self.theme
                                .secondary_text(&format!("(ignored echo: {})", transcript.trim()))
                        ),
                        Err(Rejection::Empty) => {}
                    }
                }
            }
        }
        Ok(())
    }
}

/// Print the narration units of each zone: status and upper dimmed, main
/// text one sentence per line.
fn print_screen(screen: &mut Screen, theme: &Theme) {
    let chunks = screen.chunks().to_vec();
    for zone in Zone::ALL {
        let texts: Vec<&str> = chunks
            .iter()
            .filter(|c| c.zone == zone)
            .map(|c| c.text.as_str())
            .collect();
        if texts.is_empty() {
            continue;
        }
        match zone {
            Zone::Status | Zone::Upper => {
                println!("{}", theme.secondary_text(&format!("[{}]", texts.join(" "))));
            }
            Zone::Main => {
                for text in texts {
                    println!("{}", theme.primary_text(text));
                }
            }
        }
    }
}
