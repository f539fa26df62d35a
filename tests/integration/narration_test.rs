//! Adapter, screen and narration player working together.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::helpers::read_fixture;
use zvox::config::VoicesConfig;
use zvox::narration::MemorySpeech;
use zvox::protocol::Metrics;
use zvox::vm::{MemorySaveStore, ScriptedVm};
use zvox::voice::Rejection;
use zvox::{
    AdapterSettings, CommandGate, DisplayAdapter, EchoGuard, NarrationEvent, NarrationPlayer,
    PlayerSettings, Screen,
};

struct Rig {
    vm: ScriptedVm,
    adapter: DisplayAdapter,
    player: NarrationPlayer,
    events: tokio::sync::mpsc::UnboundedReceiver<NarrationEvent>,
    speech: Arc<MemorySpeech>,
    echo: Arc<Mutex<EchoGuard>>,
}

fn rig() -> Rig {
    let vm = ScriptedVm::parse(&read_fixture("cellar.jsonl")).unwrap();
    let screen = Arc::new(Mutex::new(Screen::headless()));
    let echo = Arc::new(Mutex::new(EchoGuard::default()));
    let speech = Arc::new(MemorySpeech::new(Duration::from_millis(500)));
    let (player, events) = NarrationPlayer::new(
        screen.clone(),
        echo.clone(),
        speech.clone(),
        VoicesConfig::default(),
        PlayerSettings::default(),
    );
    let mut adapter = DisplayAdapter::new(
        screen,
        vm.clone(),
        Arc::new(MemorySaveStore::new()),
        AdapterSettings::default(),
    );
    adapter.init(Metrics::default()).unwrap();
    Rig {
        vm,
        adapter,
        player,
        events,
        speech,
        echo,
    }
}

#[tokio::test(start_paused = true)]
async fn turn_is_spoken_in_order_and_echo_is_rejected() {
    let mut rig = rig();
    rig.adapter.handle(rig.vm.next_message().unwrap());

    rig.player.speak(0).await;
    assert_eq!(
        rig.speech.spoken(),
        vec![
            "Cellar, Score: 0, Moves: 1",
            "You are in a dark cellar.",
            "A staircase leads up.",
        ]
    );

    let mut highlighted = Vec::new();
    let mut finished = false;
    while let Ok(event) = rig.events.try_recv() {
        match event {
            NarrationEvent::Highlighted {
                chunk_index,
                success,
                ..
            } => highlighted.push((chunk_index, success)),
            NarrationEvent::Finished => finished = true,
            _ => {}
        }
    }
    assert_eq!(highlighted, vec![(0, true), (1, true), (2, true)]);
    assert!(finished);

    let gate = CommandGate::new(rig.echo.clone());
    assert_eq!(gate.admit("a staircase leads up"), Err(Rejection::Echo));
    assert_eq!(gate.admit("open the trapdoor"), Ok("open the trapdoor".to_string()));
}

#[tokio::test(start_paused = true)]
async fn new_turn_ends_narration_of_old_text() {
    let mut rig = rig();
    rig.adapter.handle(rig.vm.next_message().unwrap());

    let Rig {
        vm,
        adapter,
        player,
        speech,
        ..
    } = &mut rig;
    tokio::join!(player.speak(0), async {
        tokio::time::sleep(Duration::from_millis(600)).await;
        adapter.handle(vm.next_message().unwrap());
    });

    assert_eq!(
        speech.spoken(),
        vec!["Cellar, Score: 0, Moves: 1", "You are in a dark cellar."]
    );
    assert!(!player.status().speaking);
}

#[tokio::test(start_paused = true)]
async fn restart_after_skip_reads_from_the_top() {
    let mut rig = rig();
    rig.adapter.handle(rig.vm.next_message().unwrap());
    rig.player.speak(0).await;

    assert_eq!(rig.player.restart(), Some(0));
    let status = rig.player.status();
    assert_eq!(status.index, 0);
    assert!(status.paused);
    rig.player.resume().await;
    assert_eq!(rig.speech.spoken().len(), 6);
}
