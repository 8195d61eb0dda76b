// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{alertsim, get_cmd_output, get_test_files, Files};

#[test]
fn test_checkpoint_after_full_history_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let out = tmp_dir.path().join("alerts").display().to_string();
    let state = tmp_dir.path().join("state").display().to_string();
    let Files { survey, catalog } = get_test_files();

    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--sink", "json",
            "--output", &out,
            "--history", "full",
            "--token", "light-curves",
            "--state-dir", &state,
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    let cmd = alertsim()
        .args(["checkpoint", "light-curves", "--state-dir", &state])
        .ok();
    assert!(cmd.is_ok(), "checkpoint failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains(r#""token": "light-curves""#), "{stdout}");
    // The newest visit is handled first.
    assert!(stdout.contains(r#""last_obsHistID": 6"#), "{stdout}");
    assert!(stdout.contains(r#""fieldIDs": ["#), "{stdout}");

    let cmd = alertsim().args(["checkpoint", "--state-dir", &state]).ok();
    assert!(cmd.is_ok(), "checkpoint failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.lines().any(|l| l == "light-curves"), "{stdout}");

    let cmd = alertsim()
        .args(["checkpoint", "someone-else", "--state-dir", &state])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("no checkpoint for 'someone-else'"), "{stderr}");
}

#[test]
fn test_checkpoint_without_store() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let state = tmp_dir.path().join("nothing");
    let cmd = alertsim()
        .args(["checkpoint", "--state-dir", &state.display().to_string()])
        .ok();
    assert!(cmd.is_err());
    assert!(!state.exists());
}
