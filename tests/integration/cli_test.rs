//! End-to-end tests of the `zvox` binary.

use predicates::prelude::*;

use super::helpers::{fixture, temp_config, zvox, FAST_CONFIG};

#[test]
fn play_prints_turns_and_answers_commands() {
    let (dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .arg("play")
        .arg(fixture("cellar.jsonl"))
        .args(["-c", "look", "-c", "take lamp"])
        .arg("--save-dir")
        .arg(dir.path().join("saves"))
        .assert()
        .success()
        .stdout(predicate::str::contains("You are in a dark cellar."))
        .stdout(predicate::str::contains("A staircase leads up."))
        .stdout(predicate::str::contains("> look"))
        .stdout(predicate::str::contains("> take lamp"))
        .stdout(predicate::str::contains("[return]"))
        .stdout(predicate::str::contains("Thanks for playing."))
        // init, two lines and one key press
        .stdout(predicate::str::contains("Transcript finished: 4 replies sent."));
}

#[test]
fn play_narrates_and_drops_echoed_commands() {
    let (dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .arg("play")
        .arg(fixture("cellar.jsonl"))
        .args(["--narrate", "-c", "a staircase leads up", "-c", "look"])
        .arg("--save-dir")
        .arg(dir.path().join("saves"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{bb} You are in a dark cellar."))
        .stdout(predicate::str::contains("(ignored echo: a staircase leads up)"))
        .stdout(predicate::str::contains("> look"));
}

#[test]
fn play_restores_autosave() {
    let (dir, config) = temp_config(&format!(
        "{FAST_CONFIG}\n[adapter]\nautosave_skip_turns = 0\nrestore_settle_ms = 1\n"
    ));
    let saves = dir.path().join("saves");

    zvox(&config)
        .arg("play")
        .arg(fixture("cellar.jsonl"))
        .args(["-c", "look", "-c", "take lamp", "-c", "up"])
        .arg("--save-dir")
        .arg(&saves)
        .assert()
        .success();
    let saved = std::fs::read_to_string(saves.join("autosave.json")).unwrap();
    assert!(saved.contains("lowerWindowHTML"));
    assert!(saved.contains("Taken."));

    zvox(&config)
        .arg("play")
        .arg(fixture("cellar.jsonl"))
        .arg("--restore")
        .arg("--save-dir")
        .arg(&saves)
        .assert()
        .success()
        .stdout(predicate::str::contains("Taken."))
        .stdout(predicate::str::contains("You climb the stairs.").not())
        .stdout(predicate::str::contains("Thanks for playing."))
        // init, bootstrap line and one key press
        .stdout(predicate::str::contains("3 replies sent."));
}

#[test]
fn play_reports_missing_transcript() {
    let (dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .arg("play")
        .arg(dir.path().join("missing.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load transcript"));
}

#[test]
fn chunks_lists_sentences() {
    let (_dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .arg("chunks")
        .arg(fixture("room.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("You are in a dark room."))
        .stdout(predicate::str::contains("There is a door to the north."))
        .stdout(predicate::str::contains("Dr. Smith enters."))
        .stdout(predicate::str::contains("He nods."));
}

#[test]
fn chunks_reads_stdin_and_prints_markers() {
    let (_dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .args(["chunks", "-", "--markers"])
        .write_stdin("<p>One. Two.</p>")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<span class=\"chunk-start\" data-chunk=\"0\"></span>",
        ))
        .stdout(predicate::str::contains("data-chunk=\"1\""));
}

#[test]
fn echo_classifies_transcripts() {
    let (_dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .args([
            "echo",
            "--spoken",
            "You are in a dark cellar.",
            "dark cellar",
            "open the door",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("echo     dark cellar"))
        .stdout(predicate::str::contains("command  open the door"));
}

#[test]
fn config_show_prints_defaults() {
    let (dir, _) = temp_config("");
    let missing = dir.path().join("none.toml");
    zvox(&missing)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[narration]"))
        .stdout(predicate::str::contains("autosave_skip_turns = 3"));
}

#[test]
fn config_migrate_adds_missing_fields() {
    let (_dir, config) = temp_config("[narration]\nautoplay = true\n");
    zvox(&config)
        .args(["config", "migrate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config updated successfully."));

    let migrated = std::fs::read_to_string(&config).unwrap();
    assert!(migrated.contains("autoplay = true"));
    assert!(migrated.contains("[echo]"));
    assert!(migrated.contains("double_tap_ms"));
}

#[test]
fn config_migrate_without_tty_changes_nothing() {
    let (_dir, config) = temp_config("[narration]\nautoplay = true\n");
    zvox(&config)
        .args(["config", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes made."));
    assert_eq!(
        std::fs::read_to_string(&config).unwrap(),
        "[narration]\nautoplay = true\n"
    );
}

#[test]
fn completions_generate_for_bash() {
    let (_dir, config) = temp_config(FAST_CONFIG);
    zvox(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zvox"));
}
