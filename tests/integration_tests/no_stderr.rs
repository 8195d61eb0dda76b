// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{alertsim, get_cmd_output, get_test_files, Files};

#[test]
fn test_simulate_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let out = tmp_dir.path().join("alerts");
    let Files { survey, catalog } = get_test_files();

    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--sink", "avro",
            "--output", &out.display().to_string(),
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "simulate failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_checkpoint_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let state = tmp_dir.path().join("state");
    std::fs::create_dir(&state).unwrap();

    let cmd = alertsim()
        .args(["checkpoint", "--state-dir", &state.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "checkpoint failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
