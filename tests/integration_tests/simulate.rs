// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs::read_to_string;

use tempfile::TempDir;

use crate::{alertsim, get_cmd_output, get_test_files, Files};

#[test]
fn test_simulate_to_json_files() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let out = tmp_dir.path().join("alerts");
    let Files { survey, catalog } = get_test_files();

    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--sink", "json",
            "--output", &out.display().to_string(),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Alerts: 9 in 6 batches"), "{stdout}");

    let num_alerts: usize = ["1201.json", "2211.json", "3122.json"]
        .iter()
        .map(|f| read_to_string(out.join(f)).unwrap().lines().count())
        .sum();
    assert_eq!(num_alerts, 9);
}

#[test]
fn test_resume_skips_delivered_pointings() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let db = tmp_dir.path().join("alerts.db").display().to_string();
    let state = tmp_dir.path().join("state").display().to_string();
    let Files { survey, catalog } = get_test_files();

    #[rustfmt::skip]
    let args = [
        "simulate",
        "--survey", &survey,
        "--catalog", &catalog,
        "--sink", "docstore",
        "--output", &db,
        "--token", "nightly",
        "--state-dir", &state,
        "--no-progress-bars",
    ];

    // Only the first night.
    let mut first_night = args.to_vec();
    first_night.extend(["--night", "0"]);
    let cmd = alertsim().args(&first_night).ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Processed: 1"), "{stdout}");

    // Everything else.
    let cmd = alertsim().args(args).ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Skipped (already delivered): 1"), "{stdout}");
    assert!(stdout.contains("Processed: 5"), "{stdout}");

    // Nothing left.
    let cmd = alertsim().args(args).ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Skipped (already delivered): 6"), "{stdout}");
    assert!(stdout.contains("Alerts: 0"), "{stdout}");
}

#[test]
fn test_dry_run_and_save_toml() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let out = tmp_dir.path().join("alerts");
    let toml = tmp_dir.path().join("args.toml");
    let Files { survey, catalog } = get_test_files();

    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--sink", "avro",
            "--output", &out.display().to_string(),
            "--history", "full",
            "--save-toml", &toml.display().to_string(),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run -- exiting now."), "{stdout}");
    assert!(!out.exists());

    let saved = read_to_string(&toml).unwrap();
    assert!(saved.contains("history = \"full\""), "{saved}");

    // The saved arguments are enough to run again.
    let cmd = alertsim()
        .args(["simulate", &toml.display().to_string(), "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    // Full history: one alert per object per field, so one file per field.
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
}

#[test]
fn test_missing_catalog() {
    let Files { survey, .. } = get_test_files();
    let cmd = alertsim()
        .args(["simulate", "--survey", &survey, "--dry-run"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No object catalog was supplied"), "{stderr}");
}

#[test]
fn test_unreachable_broker() {
    let Files { survey, catalog } = get_test_files();
    // Nothing listens on port 1.
    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--port", "1",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Is anything listening?"), "{stderr}");
}

#[test]
fn test_build_info_is_logged() {
    let Files { survey, catalog } = get_test_files();
    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Compiled on git commit hash: "), "{stdout}");
    assert!(stdout.contains("with compiler"), "{stdout}");
}
