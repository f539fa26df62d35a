//! The protocol bridge between the VM and the screen.
//!
//! [`DisplayAdapter::update`] is the single per-turn entry point. Work that
//! must happen later (autosave, restore, the bootstrap input after a
//! restore) is returned as [`AdapterTask`]s for [`drive`] to run in order.
//!
//! - [`state`] - the explicit per-session state, reset by `init`
//! - [`stores`] - per-window grid/buffer stores
//! - [`hooks`] - narrate/notice callbacks
//! - [`driver`] - async execution of deferred tasks

mod driver;
mod hooks;
mod snapshot;
mod state;
mod stores;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

pub use driver::drive;
pub use hooks::{AdapterHooks, ChannelHooks, HookEvent, NoHooks};
pub use snapshot::DisplaySnapshot;
pub use state::{AdapterState, FilePrompt, InputRequest, RestorePhase};
pub use stores::WindowStores;

use crate::config::Config;
use crate::error::AdapterError;
use crate::protocol::{InputDescriptor, InputKind, InputReply, Metrics, UpdateEvent, VmMessage};
use crate::render::render_turn;
use crate::screen::{Screen, Zone};
use crate::vm::{SaveRecord, SaveStore, VmLink};

/// Generation carried by the synthetic input sent after a restore.
pub const BOOTSTRAP_GENERATION: u64 = 1;

/// Deferred work scheduled by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterTask {
    Autosave,
    Restore,
    /// Send the synthetic input once `after` has elapsed
    Bootstrap { after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSettings {
    /// Narrate every turn without an explicit per-event request
    pub autoplay: bool,
    pub autosave: bool,
    /// Line-input turns to let pass before the first autosave
    pub autosave_skip_turns: u32,
    pub restore_settle: Duration,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AdapterSettings {
    fn from(config: &Config) -> Self {
        Self {
            autoplay: config.narration.autoplay,
            autosave: config.adapter.autosave,
            autosave_skip_turns: config.adapter.autosave_skip_turns,
            restore_settle: Duration::from_millis(config.adapter.restore_settle_ms),
        }
    }
}

/// Aggregate the input descriptors of one update. Char wins over line.
fn negotiate(inputs: &[InputDescriptor], generation: u64) -> Option<InputRequest> {
    let chosen = inputs
        .iter()
        .find(|d| d.kind == InputKind::Char)
        .or_else(|| inputs.first())?;
    Some(InputRequest {
        kind: chosen.kind,
        window: chosen.id,
        generation: chosen.generation.unwrap_or(generation),
    })
}

fn kind_name(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Line => "line",
        InputKind::Char => "char",
    }
}

pub struct DisplayAdapter {
    state: AdapterState,
    settings: AdapterSettings,
    screen: Arc<Mutex<Screen>>,
    link: Box<dyn VmLink>,
    store: Arc<dyn SaveStore>,
    hooks: Box<dyn AdapterHooks>,
}

impl std::fmt::Debug for DisplayAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayAdapter")
            .field("generation", &self.state.generation)
            .field("input", &self.state.input)
            .field("restore", &self.state.restore)
            .finish_non_exhaustive()
    }
}

impl DisplayAdapter {
    pub fn new(
        screen: Arc<Mutex<Screen>>,
        link: impl VmLink + 'static,
        store: Arc<dyn SaveStore>,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            state: AdapterState::default(),
            settings,
            screen,
            link: Box::new(link),
            store,
            hooks: Box::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl AdapterHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn state(&self) -> &AdapterState {
        &self.state
    }

    pub fn screen(&self) -> &Arc<Mutex<Screen>> {
        &self.screen
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn pending_input(&self) -> Option<InputRequest> {
        self.state.input
    }

    pub fn input_enabled(&self) -> bool {
        self.state.input_enabled()
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.settings.autoplay = autoplay;
    }

    /// Start a new VM session.
    pub fn init(&mut self, metrics: Metrics) -> Result<(), AdapterError> {
        self.state = AdapterState::default();
        self.screen.lock().reset();
        tracing::debug!(?metrics, "adapter init");
        self.link.send(InputReply::Init {
            generation: 0,
            metrics,
        })?;
        Ok(())
    }

    pub fn arrange(&mut self, metrics: Metrics) -> Result<(), AdapterError> {
        self.link.send(InputReply::Arrange {
            generation: self.state.generation,
            metrics,
        })?;
        Ok(())
    }

    /// Ask for the autosave to be restored after the first update.
    ///
    /// Returns false once the session has seen an update.
    pub fn arm_restore(&mut self) -> bool {
        if self.state.updates > 0 {
            tracing::warn!("restore requested after the first update; ignoring");
            return false;
        }
        self.state.restore = RestorePhase::Armed;
        true
    }

    /// Process one turn. State is staged and committed only at the end.
    pub fn update(&mut self, event: &UpdateEvent) -> Result<Vec<AdapterTask>, AdapterError> {
        if let Some(message) = &self.state.halted {
            return Err(AdapterError::Halted(message.clone()));
        }

        let mut next = self.state.clone();
        let mut tasks = Vec::new();
        next.updates += 1;
        next.generation = next.generation.max(event.generation);
        if let Some(windows) = &event.windows {
            next.registry.merge(windows);
        }

        let suppress = next.restore == RestorePhase::Bootstrapping;
        let mut writes: Vec<(Zone, String)> = Vec::new();
        let mut retired: Vec<String> = Vec::new();
        let mut wipe_scrollback = false;
        let mut text = String::new();

        match &event.content {
            Some(_) if suppress => {
                tracing::debug!(generation = event.generation, "suppressing post-restore render");
            }
            Some(content) => {
                let merged = next.stores.merge(content, &next.registry);
                wipe_scrollback = merged
                    .cleared
                    .iter()
                    .any(|id| next.registry.zone_of(*id) == Some(Zone::Main));
                retired = merged
                    .retired
                    .iter()
                    .filter_map(|id| next.rendered.get(id))
                    .map(|w| w.html.clone())
                    .collect();
                let turn = render_turn(&merged.entries, &next.registry);
                text = turn.plain_text();
                for window in &turn.windows {
                    next.rendered.insert(window.window, window.clone());
                }
                for zone in Zone::ALL {
                    if turn.zone_html(zone).is_some() {
                        let html: String = next
                            .rendered
                            .values()
                            .filter(|w| w.zone == zone)
                            .map(|w| w.html.as_str())
                            .collect();
                        writes.push((zone, html));
                    }
                }
            }
            None => {}
        }
        if suppress {
            next.restore = RestorePhase::Idle;
        }

        if let Some(inputs) = &event.input {
            next.input = negotiate(inputs, next.generation);
            next.prompt = None;
            if let Some(request) = next.input {
                if request.generation == BOOTSTRAP_GENERATION && next.intro.is_none() {
                    next.intro = Some(request.kind);
                }
                if request.kind == InputKind::Line {
                    next.line_turns += 1;
                    if self.settings.autosave
                        && !suppress
                        && next.restore == RestorePhase::Idle
                        && next.line_turns > self.settings.autosave_skip_turns
                    {
                        tasks.push(AdapterTask::Autosave);
                    }
                }
            }
        }
        if let Some(special) = &event.specialinput {
            next.prompt = Some(FilePrompt {
                generation: next.generation,
                kind: special.kind.clone(),
            });
        }

        if next.restore == RestorePhase::Armed {
            next.restore = RestorePhase::Restoring;
            tasks.push(AdapterTask::Restore);
            tasks.push(AdapterTask::Bootstrap {
                after: self.settings.restore_settle,
            });
        }

        // Commit.
        self.state = next;
        {
            let mut screen = self.screen.lock();
            if wipe_scrollback {
                screen.clear_scrollback();
            }
            for html in retired {
                screen.push_scrollback(html);
            }
            for (zone, html) in writes {
                screen.write_zone(zone, html);
            }
        }
        tracing::debug!(
            generation = self.state.generation,
            input = ?self.state.input,
            tasks = tasks.len(),
            "update applied"
        );

        let autoplay = event.autoplay.unwrap_or(self.settings.autoplay);
        if autoplay && !text.trim().is_empty() {
            self.hooks.narrate(&text);
        }
        Ok(tasks)
    }

    fn take_input(&mut self, kind: InputKind) -> Result<InputRequest, AdapterError> {
        if let Some(message) = &self.state.halted {
            return Err(AdapterError::Halted(message.clone()));
        }
        match self.state.input {
            Some(request) if request.kind == kind => {
                self.state.input = None;
                Ok(request)
            }
            Some(_) => Err(AdapterError::NoPendingInput {
                expected: kind_name(kind),
            }),
            None => Err(AdapterError::InputDisabled),
        }
    }

    /// Answer the pending line request.
    pub fn send_line(&mut self, text: &str) -> Result<(), AdapterError> {
        let request = self.take_input(InputKind::Line)?;
        tracing::debug!(generation = request.generation, "sending line input");
        self.link.send(InputReply::Line {
            generation: request.generation,
            window: request.window,
            value: text.to_string(),
            terminator: None,
        })?;
        Ok(())
    }

    /// Answer the pending char request with a key name.
    pub fn send_char(&mut self, key: &str) -> Result<(), AdapterError> {
        let request = self.take_input(InputKind::Char)?;
        self.link.send(InputReply::Char {
            generation: request.generation,
            window: request.window,
            value: key.to_string(),
        })?;
        Ok(())
    }

    /// Answer a pending file prompt; `None` cancels it.
    pub fn answer_special(&mut self, value: Option<&str>) -> Result<(), AdapterError> {
        let prompt = self.state.prompt.take().ok_or(AdapterError::NoPendingPrompt)?;
        tracing::debug!(kind = %prompt.kind, "answering file prompt");
        self.link.send(InputReply::SpecialResponse {
            generation: prompt.generation,
            response: "fileref_prompt".to_string(),
            value: value.map(str::to_string),
        })?;
        Ok(())
    }

    /// The VM died. Input stays disabled until the next `init`.
    pub fn fatal(&mut self, message: &str) {
        tracing::error!(%message, "fatal VM error");
        self.state.halted = Some(message.to_string());
        self.state.input = None;
        self.state.prompt = None;
        self.hooks.notice(message);
    }

    pub fn log(&self, message: &str) {
        tracing::debug!(%message, "VM log");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(%message, "VM warning");
    }

    /// Dispatch one VM message, returning any deferred tasks.
    pub fn handle(&mut self, message: VmMessage) -> Vec<AdapterTask> {
        match message {
            VmMessage::Update(event) => match self.update(&event) {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::error!(error = %e, generation = event.generation, "update failed");
                    Vec::new()
                }
            },
            VmMessage::Error { message } => {
                self.fatal(&message);
                Vec::new()
            }
            VmMessage::Log { message } => {
                self.log(&message);
                Vec::new()
            }
            VmMessage::Warning { message } => {
                self.warn(&message);
                Vec::new()
            }
            VmMessage::Pass => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let screen = self.screen.lock();
        DisplaySnapshot {
            generation: self.state.generation,
            input_window_id: self.state.input.map(|r| r.window),
            status_bar_html: screen.zone_html(Zone::Status).to_string(),
            upper_window_html: screen.zone_html(Zone::Upper).to_string(),
            lower_window_html: screen.zone_html(Zone::Main).to_string(),
        }
    }

    /// Save the display and the VM state to the store.
    pub fn autosave(&mut self) -> Result<(), AdapterError> {
        if self.state.halted.is_some() {
            return Ok(());
        }
        let vm = self.link.save_state()?;
        let record = SaveRecord::new(self.snapshot(), vm);
        self.store.save(&record)?;
        tracing::debug!(generation = record.display.generation, "autosaved");
        Ok(())
    }

    /// Load the autosave and put the VM and the display back.
    pub fn perform_restore(&mut self) -> Result<(), AdapterError> {
        let result = self.restore_from_store();
        if result.is_err() {
            self.state.restore = RestorePhase::Idle;
        }
        result
    }

    fn restore_from_store(&mut self) -> Result<(), AdapterError> {
        let record = self.store.load()?.ok_or(AdapterError::NothingToRestore)?;
        self.link.restore_state(&record.vm)?;

        let display = &record.display;
        {
            let mut screen = self.screen.lock();
            screen.reset();
            for (zone, html) in [
                (Zone::Status, &display.status_bar_html),
                (Zone::Upper, &display.upper_window_html),
                (Zone::Main, &display.lower_window_html),
            ] {
                if !html.is_empty() {
                    screen.write_zone(zone, html.as_str());
                }
            }
        }
        self.state.stores = WindowStores::default();
        self.state.rendered.clear();
        self.state.generation = self.state.generation.max(display.generation);
        self.state.restored_window = display.input_window_id;
        tracing::info!(
            saved_at = %record.saved_at,
            generation = self.state.generation,
            "restored autosave"
        );
        Ok(())
    }

    /// Send the synthetic input that lets the restored VM continue.
    ///
    /// On failure the restore is abandoned and the session carries on as
    /// if none had been requested.
    pub fn send_bootstrap_input(&mut self) -> Result<(), AdapterError> {
        if self.state.restore != RestorePhase::Restoring {
            tracing::debug!(phase = ?self.state.restore, "no restore in progress; skipping bootstrap");
            return Ok(());
        }
        let result = self.bootstrap();
        if result.is_err() {
            self.state.restore = RestorePhase::Idle;
        }
        result
    }

    fn bootstrap(&mut self) -> Result<(), AdapterError> {
        let kind = self
            .state
            .intro
            .or(self.state.input.map(|r| r.kind))
            .unwrap_or(InputKind::Line);
        let window = self
            .state
            .input
            .map(|r| r.window)
            .or(self.state.restored_window)
            .ok_or(AdapterError::NoPendingInput {
                expected: kind_name(kind),
            })?;
        let reply = match kind {
            InputKind::Line => InputReply::Line {
                generation: BOOTSTRAP_GENERATION,
                window,
                value: String::new(),
                terminator: None,
            },
            InputKind::Char => InputReply::Char {
                generation: BOOTSTRAP_GENERATION,
                window,
                value: "return".to_string(),
            },
        };
        self.link.send(reply)?;
        self.state.input = None;
        self.state.restore = RestorePhase::Bootstrapping;
        Ok(())
    }
}
