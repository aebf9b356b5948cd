//! End-to-end scenarios for the warden loop.
//!
//! These tests drive `Warden::run` with scripted process queries, a virtual
//! clock, and scripted prompts against a real temporary saves root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use savewarden::app::{IterationReport, Warden};
use savewarden::core::layout::SaveLayout;
use savewarden::core::lifecycle::LifecycleLimits;
use savewarden::io::monitor::ProcessMonitor;
use savewarden::io::process::LaunchRequest;
use savewarden::session::SessionEnd;
use savewarden::swap::PersistOutcome;
use savewarden::test_support::{
    RecordingLauncher, ScriptedPrompt, ScriptedQuery, VirtualClock, write_save,
};

const ARTIFACT: &str = "world.dat";

fn warden(
    root: &Path,
    query: ScriptedQuery,
) -> Warden<ScriptedQuery, VirtualClock, RecordingLauncher> {
    Warden {
        layout: SaveLayout::new(root, "save", ARTIFACT, 10),
        request: LaunchRequest {
            executable: PathBuf::from("/games/tiny/tiny"),
            args: Vec::new(),
            workdir: PathBuf::from("/games/tiny"),
        },
        process_name: "tiny".to_string(),
        monitor: ProcessMonitor::new(query),
        clock: VirtualClock::default(),
        launcher: RecordingLauncher::default(),
        poll_interval: Duration::from_secs(2),
        limits: LifecycleLimits {
            start_attempts: 15,
            autosave_every: 15,
        },
    }
}

fn slot_dirs(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root)
        .expect("read root")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains("autosave"))
        .collect();
    names.sort();
    names
}

/// Scenario: `save` and `save - alpha` exist; `save - alpha` is selected.
///
/// 1. Swap-in replaces `save` with the contents of `save - alpha`.
/// 2. The game is seen on poll 1 and runs for 16 polls.
/// 3. On poll 5 the game rewrites its state artifact once.
/// 4. The autosave check on running poll 15 (poll 16) writes slot 1.
/// 5. On exit the run differs from `save - alpha`, so the user is asked for
///    a name and declines.
#[test]
fn selected_save_is_swapped_in_and_autosaved_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_path_buf();
    write_save(&root.join("save"), ARTIFACT, b"original").expect("save");
    write_save(&root.join("save - alpha"), ARTIFACT, b"alpha").expect("alpha");

    let active_artifact = root.join("save").join(ARTIFACT);
    let query = ScriptedQuery::from_pattern(&[(true, 16)]).with_hook(move |poll| {
        if poll == 5 {
            fs::write(&active_artifact, b"alpha+progress").expect("game writes save");
        }
    });
    let warden = warden(&root, query);
    let mut prompt = ScriptedPrompt::new(vec![Some("save - alpha"), None], vec![None]);

    let mut reports: Vec<IterationReport> = Vec::new();
    warden
        .run(&mut prompt, |report| reports.push(report.clone()))
        .expect("run");

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.chosen, "save - alpha");
    assert_eq!(report.session.end, SessionEnd::Exited);
    assert_eq!(report.session.polls, 17);
    assert_eq!(report.session.autosaves, 1);
    assert_eq!(report.persist, PersistOutcome::Skipped);
    assert_eq!(prompt.namer.asked, 1);
    assert_eq!(warden.launcher.launches(), 1);

    let offered: Vec<&str> = prompt.selector.offered[0]
        .iter()
        .map(|choice| choice.value.as_str())
        .collect();
    assert!(offered.contains(&"save"));
    assert!(offered.contains(&"save - alpha"));

    assert_eq!(slot_dirs(&root), vec!["save - autosave 1"]);
    assert_eq!(
        fs::read(root.join("save - autosave 1").join(ARTIFACT)).expect("slot artifact"),
        b"alpha+progress"
    );
    assert_eq!(
        fs::read(root.join("save - alpha").join(ARTIFACT)).expect("alpha artifact"),
        b"alpha"
    );
}

/// The game never shows up: no autosave runs and an untouched save is not
/// offered for naming.
#[test]
fn undetected_game_takes_no_autosaves() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_path_buf();
    write_save(&root.join("save"), ARTIFACT, b"original").expect("save");

    let warden = warden(&root, ScriptedQuery::from_pattern(&[]));
    let mut prompt = ScriptedPrompt::new(vec![Some("save"), None], vec![Some("never")]);

    let mut reports = Vec::new();
    warden
        .run(&mut prompt, |report| reports.push(report.clone()))
        .expect("run");

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].session.end, SessionEnd::NeverStarted);
    assert_eq!(reports[0].session.polls, 15);
    assert_eq!(reports[0].session.autosaves, 0);
    assert_eq!(reports[0].persist, PersistOutcome::Unchanged);
    assert_eq!(prompt.namer.asked, 0);
    assert!(slot_dirs(&root).is_empty());
    assert_eq!(warden.clock.elapsed(), Duration::from_secs(30));
}

/// A changed run is kept under the label the user types.
#[test]
fn changed_run_is_saved_under_new_name() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_path_buf();
    write_save(&root.join("save"), ARTIFACT, b"v0").expect("save");
    write_save(&root.join("save - start"), ARTIFACT, b"v1").expect("start");

    let active_artifact = root.join("save").join(ARTIFACT);
    let query = ScriptedQuery::from_pattern(&[(false, 1), (true, 3)]).with_hook(move |poll| {
        if poll == 3 {
            fs::write(&active_artifact, b"v2").expect("game writes save");
        }
    });
    let warden = warden(&root, query);
    let mut prompt =
        ScriptedPrompt::new(vec![Some("save - start"), None], vec![Some("after boss")]);

    let mut reports = Vec::new();
    warden
        .run(&mut prompt, |report| reports.push(report.clone()))
        .expect("run");

    assert_eq!(
        reports[0].persist,
        PersistOutcome::Saved {
            name: "save - after boss".to_string()
        }
    );
    assert_eq!(
        fs::read(root.join("save - after boss").join(ARTIFACT)).expect("new save"),
        b"v2"
    );
    assert_eq!(
        fs::read(root.join("save - start").join(ARTIFACT)).expect("start save"),
        b"v1"
    );
    // Too short a run for the 15-poll autosave cadence.
    assert!(slot_dirs(&root).is_empty());
}

/// An empty saves root gets an empty active save so a first run can start.
#[test]
fn empty_root_offers_fresh_active_save() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("saves");

    let warden = warden(&root, ScriptedQuery::from_pattern(&[]));
    let mut prompt = ScriptedPrompt::new(vec![None], Vec::new());
    warden.run(&mut prompt, |_| {}).expect("run");

    assert!(root.join("save").is_dir());
    assert_eq!(prompt.selector.offered[0].len(), 1);
    assert_eq!(prompt.selector.offered[0][0].label, "save (active)");
    assert_eq!(warden.launcher.launches(), 0);
}

/// A failed swap-in aborts only that iteration; the user is asked again.
#[test]
fn failed_iteration_returns_to_selection() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_path_buf();
    write_save(&root.join("save"), ARTIFACT, b"v1").expect("save");
    write_save(&root.join("save - doomed"), ARTIFACT, b"d").expect("doomed");

    let mut warden = warden(&root, ScriptedQuery::from_pattern(&[]));
    warden.launcher = RecordingLauncher::failing();
    let mut prompt = ScriptedPrompt::new(vec![Some("save - doomed"), None], Vec::new());

    let mut reports = Vec::new();
    warden
        .run(&mut prompt, |report| reports.push(report.clone()))
        .expect("run");

    assert!(reports.is_empty());
    assert_eq!(prompt.selector.offered.len(), 2);
    // The swap-in itself completed before the launch failed.
    assert_eq!(
        fs::read(root.join("save").join(ARTIFACT)).expect("active"),
        b"d"
    );
}

/// Losing the process query mid-run still offers to keep the progress, then
/// stops instead of offering another save while the game may be running.
#[test]
fn failed_process_query_persists_then_stops() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_path_buf();
    write_save(&root.join("save"), ARTIFACT, b"v0").expect("save");
    write_save(&root.join("save - start"), ARTIFACT, b"v1").expect("start");

    let active_artifact = root.join("save").join(ARTIFACT);
    let query = ScriptedQuery::from_pattern(&[(true, 3)])
        .with_hook(move |poll| {
            if poll == 2 {
                fs::write(&active_artifact, b"v2").expect("game writes save");
            }
        })
        .failing_from(4);
    let warden = warden(&root, query);
    let mut prompt = ScriptedPrompt::new(
        vec![Some("save - start"), Some("save")],
        vec![Some("keep")],
    );

    let mut reports = Vec::new();
    let err = warden
        .run(&mut prompt, |report| reports.push(report.clone()))
        .unwrap_err();

    assert!(format!("{err:#}").contains("lost track of tiny"));
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].session.end, SessionEnd::MonitorFailed);
    assert_eq!(reports[0].session.polls, 3);
    assert_eq!(
        reports[0].persist,
        PersistOutcome::Saved {
            name: "save - keep".to_string()
        }
    );
    assert_eq!(prompt.namer.asked, 1);
    assert_eq!(prompt.selector.offered.len(), 1);
    assert_eq!(
        fs::read(root.join("save - keep").join(ARTIFACT)).expect("kept save"),
        b"v2"
    );
}
