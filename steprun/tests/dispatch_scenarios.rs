//! End-to-end dispatcher scenarios against a real filesystem and real processes.
//!
//! These drive `run_steps` / `Dispatcher::run` over whole step lists to verify
//! ordering, halt policy, dry-run isolation and command timeouts.

use std::time::{Duration, Instant};

use steprun::core::types::{FailureKind, RunStatus, Step, StepDetails};
use steprun::dispatch::{Dispatcher, run_steps};
use steprun::io::config::RunnerConfig;
use steprun::test_support::{
    TempWorkspace, cmd, patch, patch_n, shell_cmd, unknown, write, write_no_overwrite,
};

#[test]
fn write_then_patch_produces_patched_content() {
    let ws = TempWorkspace::new().expect("workspace");
    let steps = vec![write("a.txt", "hello\n"), patch("a.txt", "hello", "hi")];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.results.iter().all(|r| r.ok));
    assert_eq!(ws.read("a.txt").expect("read"), "hi\n");
}

#[test]
fn repeated_write_is_idempotent() {
    let ws = TempWorkspace::new().expect("workspace");
    let steps = vec![write("a.txt", "same\n"), write("a.txt", "same\n")];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert!(run.results[0].changed);
    assert!(!run.results[1].changed);
    assert_eq!(ws.read("a.txt").expect("read"), "same\n");
}

#[test]
fn dry_run_write_reports_change_but_creates_nothing() {
    let ws = TempWorkspace::new().expect("workspace");
    let run = run_steps(&[write("b.txt", "x")], ws.path(), true).expect("run");

    assert_eq!(run.results.len(), 1);
    assert!(run.results[0].ok);
    assert!(run.results[0].changed);
    assert!(!ws.exists("b.txt"));
}

#[test]
fn dry_run_matches_live_results_for_file_steps() {
    let ws = TempWorkspace::new().expect("workspace");
    ws.seed("src/lib.rs", "fn old() {}\nfn old_two() {}\n").expect("seed");
    let steps = vec![
        patch_n("src/lib.rs", "old", "new", 1),
        write("docs/readme.md", "# docs\n"),
    ];

    let dry = run_steps(&steps, ws.path(), true).expect("dry");
    assert_eq!(ws.read("src/lib.rs").expect("read"), "fn old() {}\nfn old_two() {}\n");
    assert!(!ws.exists("docs/readme.md"));

    let live = run_steps(&steps, ws.path(), false).expect("live");
    assert_eq!(dry.results, live.results);
    assert_eq!(ws.read("src/lib.rs").expect("read"), "fn new() {}\nfn old_two() {}\n");
}

#[test]
fn not_found_patch_halts_before_command() {
    let ws = TempWorkspace::new().expect("workspace");
    let steps = vec![
        write("ok.txt", "fine"),
        patch("missing.txt", "a", "b"),
        shell_cmd("touch ran.txt", 10),
    ];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert_eq!(run.status, RunStatus::Halted);
    assert_eq!(run.results.len(), 2);
    assert_eq!(run.results[1].failure, Some(FailureKind::NotFound));
    assert!(!ws.exists("missing.txt"));
    assert!(!ws.exists("ran.txt"));
}

#[test]
fn conflict_leaves_file_untouched_and_halts() {
    let ws = TempWorkspace::new().expect("workspace");
    ws.seed("config.ini", "a=1\n").expect("seed");
    let steps = vec![write_no_overwrite("config.ini", "a=2\n"), write("next.txt", "n")];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert!(run.is_halted());
    assert_eq!(run.results.len(), 1);
    let result = &run.results[0];
    assert!(!result.ok);
    assert!(!result.changed);
    assert_eq!(ws.read("config.ini").expect("read"), "a=1\n");
    assert!(!ws.exists("next.txt"));
}

#[test]
fn directory_in_place_of_file_aborts_run() {
    let ws = TempWorkspace::new().expect("workspace");
    ws.seed("dir/inner/keep.txt", "k").expect("seed");
    let steps = vec![
        write("a.txt", "x"),
        write("dir", "y"),
        shell_cmd("touch ran.txt", 10),
    ];

    let result = run_steps(&steps, ws.path(), false);

    assert!(result.is_err());
    assert_eq!(ws.read("a.txt").expect("read"), "x");
    assert_eq!(ws.read("dir/inner/keep.txt").expect("read"), "k");
    assert!(!ws.exists("ran.txt"));
}

#[test]
fn empty_find_inserts_replacement_and_run_continues() {
    let ws = TempWorkspace::new().expect("workspace");
    ws.seed("a.txt", "ab").expect("seed");
    let steps = vec![patch("a.txt", "", "-"), write("z.txt", "z")];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.all_ok());
    assert_eq!(ws.read("a.txt").expect("read"), "-a-b-");
    assert!(ws.exists("z.txt"));
}

#[test]
fn unknown_step_is_reported_without_halting() {
    let ws = TempWorkspace::new().expect("workspace");
    let steps: Vec<Step> = vec![unknown("deploy"), write("after.txt", "x")];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.results[0].failure, Some(FailureKind::UnknownStepKind));
    assert!(ws.exists("after.txt"));
}

#[cfg(unix)]
#[test]
fn command_output_is_captured() {
    let ws = TempWorkspace::new().expect("workspace");
    let run = run_steps(&[cmd(r#"sh -c "echo 'ok'""#)], ws.path(), false).expect("run");

    let result = &run.results[0];
    assert!(result.ok, "stderr: {}", result.stderr);
    assert!(result.changed);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.contains("ok"));
}

#[cfg(unix)]
#[test]
fn failing_command_does_not_halt() {
    let ws = TempWorkspace::new().expect("workspace");
    let steps = vec![shell_cmd("echo bad >&2; exit 4", 10), write("after.txt", "x")];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    assert_eq!(run.status, RunStatus::Completed);
    let failed = &run.results[0];
    assert!(!failed.ok);
    assert!(failed.changed);
    assert_eq!(failed.exit_code, Some(4));
    assert_eq!(failed.stderr, "bad\n");
    assert_eq!(failed.failure, Some(FailureKind::NonZeroExit));
    assert!(ws.exists("after.txt"));
}

#[cfg(unix)]
#[test]
fn command_timeout_kills_process_and_reports() {
    let ws = TempWorkspace::new().expect("workspace");
    let start = Instant::now();
    let steps = vec![shell_cmd("sleep 30; touch late.txt", 1)];

    let run = run_steps(&steps, ws.path(), false).expect("run");

    let result = &run.results[0];
    assert!(!result.ok);
    assert!(!result.changed);
    assert_eq!(result.exit_code, None);
    assert_eq!(result.failure, Some(FailureKind::Timeout));
    assert!(result.stderr.contains("timeout"));
    assert!(start.elapsed() < Duration::from_secs(15));

    std::thread::sleep(Duration::from_millis(200));
    assert!(!ws.exists("late.txt"));
}

#[cfg(unix)]
#[test]
fn dry_run_spawns_no_process() {
    let ws = TempWorkspace::new().expect("workspace");
    let run = run_steps(&[shell_cmd("touch spawned.txt", 5)], ws.path(), true).expect("run");

    let result = &run.results[0];
    assert!(result.ok);
    assert!(!result.changed);
    assert_eq!(result.exit_code, None);
    assert!(!ws.exists("spawned.txt"));
    let StepDetails::Command(details) = &result.details else {
        panic!("expected command details");
    };
    assert!(details.planned);
    assert!(details.shell);
    assert_eq!(details.timeout_secs, 5);
}

#[cfg(unix)]
#[test]
fn output_limit_from_config_bounds_capture() {
    let ws = TempWorkspace::new().expect("workspace");
    let config = RunnerConfig {
        output_limit_bytes: 8,
        ..RunnerConfig::default()
    };
    let run = Dispatcher::with_config(config)
        .run(&[shell_cmd("printf '0123456789abcdef'", 10)], ws.path(), false)
        .expect("run");

    let stdout = &run.results[0].stdout;
    assert!(stdout.starts_with("01234567"));
    assert!(stdout.contains("[stdout truncated 8 bytes]"));
}
