//! The display adapter driven by a recorded transcript.

use std::sync::Arc;

use parking_lot::Mutex;

use super::helpers::read_fixture;
use zvox::adapter::{drive, AdapterTask, ChannelHooks, HookEvent};
use zvox::protocol::{InputKind, InputReply, Metrics};
use zvox::vm::{FileSaveStore, SaveStore, ScriptedVm};
use zvox::{AdapterSettings, DisplayAdapter, Screen, Zone};

fn cellar() -> ScriptedVm {
    ScriptedVm::parse(&read_fixture("cellar.jsonl")).unwrap()
}

#[test]
fn transcript_replay_tracks_generation_and_scrollback() {
    let vm = cellar();
    let screen = Arc::new(Mutex::new(Screen::headless()));
    let store = Arc::new(zvox::vm::MemorySaveStore::new());
    let mut adapter = DisplayAdapter::new(screen.clone(), vm.clone(), store, AdapterSettings::default());
    adapter.init(Metrics::default()).unwrap();

    let mut kinds = Vec::new();
    while let Some(message) = vm.next_message() {
        adapter.handle(message);
        kinds.push(adapter.pending_input().map(|r| r.kind));
        if let Some(request) = adapter.pending_input() {
            match request.kind {
                InputKind::Line => adapter.send_line("wait").unwrap(),
                InputKind::Char => adapter.send_char("return").unwrap(),
            }
        }
    }

    assert_eq!(adapter.generation(), 5);
    assert_eq!(
        kinds,
        vec![
            Some(InputKind::Line),
            Some(InputKind::Line),
            None,
            Some(InputKind::Line),
            Some(InputKind::Char),
            None,
        ]
    );

    let screen = screen.lock();
    assert!(screen.zone_html(Zone::Main).contains("Thanks for playing."));
    assert_eq!(screen.scrollback().len(), 4);
    assert!(screen.zone_html(Zone::Status).contains("Moves: 2"));

    let generations: Vec<u64> = vm.replies().iter().map(InputReply::generation).collect();
    assert_eq!(generations, vec![0, 1, 2, 3, 4]);
}

#[test]
fn autoplay_hook_receives_turn_text() {
    let vm = cellar();
    let (hooks, mut events) = ChannelHooks::new();
    let mut adapter = DisplayAdapter::new(
        Arc::new(Mutex::new(Screen::headless())),
        vm.clone(),
        Arc::new(zvox::vm::MemorySaveStore::new()),
        AdapterSettings {
            autoplay: true,
            ..AdapterSettings::default()
        },
    )
    .with_hooks(hooks);

    adapter.handle(vm.next_message().unwrap());
    assert_eq!(
        events.try_recv().unwrap(),
        HookEvent::Narrate(
            "Cellar, Score: 0, Moves: 1\nYou are in a dark cellar. A staircase leads up.".into()
        )
    );
}

#[tokio::test(start_paused = true)]
async fn autosave_then_restore_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SaveStore> = Arc::new(FileSaveStore::new(dir.path()));
    let settings = AdapterSettings {
        autosave_skip_turns: 1,
        ..AdapterSettings::default()
    };

    // First session: play through turn 3, autosaving from the second line turn.
    let vm = cellar();
    let adapter = Mutex::new(DisplayAdapter::new(
        Arc::new(Mutex::new(Screen::headless())),
        vm.clone(),
        store.clone(),
        settings,
    ));
    let mut scheduled = Vec::new();
    for _ in 0..4 {
        let message = vm.next_message().unwrap();
        let tasks = adapter.lock().handle(message);
        scheduled.extend(tasks.iter().copied());
        drive(&adapter, tasks).await;
        let pending = adapter.lock().pending_input();
        if pending.is_some() {
            adapter.lock().send_line("look").unwrap();
        }
    }
    assert_eq!(scheduled, vec![AdapterTask::Autosave, AdapterTask::Autosave]);
    let saved = store.load().unwrap().unwrap();
    assert!(saved.display.lower_window_html.contains("Taken."));

    // Second session restores after its first render.
    let vm = cellar();
    let screen = Arc::new(Mutex::new(Screen::headless()));
    let adapter = Mutex::new(DisplayAdapter::new(screen.clone(), vm.clone(), store, settings));
    adapter.lock().init(Metrics::default()).unwrap();
    assert!(adapter.lock().arm_restore());
    let tasks = adapter.lock().handle(vm.next_message().unwrap());
    drive(&adapter, tasks).await;

    assert!(screen.lock().zone_html(Zone::Main).contains("Taken."));
    assert_eq!(vm.remaining(), 2);
    let replies = vm.replies();
    assert!(matches!(
        replies.last(),
        Some(InputReply::Line { generation: 1, value, .. }) if value.is_empty()
    ));
}
