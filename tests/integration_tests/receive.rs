// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    io::{BufRead, BufReader, Lines},
    net::TcpListener,
    path::Path,
    process::{Child, ChildStdout, Stdio},
};

use tempfile::TempDir;

use crate::{alertsim, get_test_files, Files};

fn free_port() -> String {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
        .to_string()
}

/// Start `alertsim receive` in the background and wait until it is
/// listening.
fn spawn_receiver(args: &[&str]) -> (Child, Lines<BufReader<ChildStdout>>) {
    let mut receiver = std::process::Command::new(assert_cmd::cargo::cargo_bin("alertsim"))
        .arg("receive")
        .args(args)
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut lines = BufReader::new(receiver.stdout.take().unwrap()).lines();
    loop {
        match lines.next() {
            Some(Ok(line)) if line.contains("Listening on port") => break,
            Some(_) => (),
            None => panic!("the receiver exited early"),
        }
    }
    (receiver, lines)
}

fn read_alerts(file: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(file)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

/// Run the receiver in the background and send it every alert over TCP.
#[test]
fn test_simulate_to_receiver() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let received = tmp_dir.path().join("received.txt");
    let Files { survey, catalog } = get_test_files();
    let port = free_port();

    #[rustfmt::skip]
    let (mut receiver, lines) = spawn_receiver(&[
        "--port", &port,
        "--output", &received.display().to_string(),
    ]);

    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--port", &port,
            "--payload", "json",
            "--chunk-size", "2",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    // Drain the rest of the receiver's output so it can't block.
    for _ in lines {}
    assert!(receiver.wait().unwrap().success());

    let alerts = read_alerts(&received);
    assert_eq!(alerts.len(), 9);
    assert!(alerts.iter().all(|a| a["alertId"].is_u64()));
}

/// Datagrams from the unicast sink are answered and kept.
#[test]
fn test_simulate_to_udp_receiver() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let received = tmp_dir.path().join("received.txt");
    let Files { survey, catalog } = get_test_files();
    let port = free_port();

    #[rustfmt::skip]
    let (mut receiver, lines) = spawn_receiver(&[
        "--udp",
        "--port", &port,
        "--max-messages", "9",
        "--output", &received.display().to_string(),
    ]);

    #[rustfmt::skip]
    let cmd = alertsim()
        .args([
            "simulate",
            "--survey", &survey,
            "--catalog", &catalog,
            "--sink", "unicast",
            "--port", &port,
            "--payload", "json",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "simulate failed: {}", cmd.err().unwrap());

    for _ in lines {}
    assert!(receiver.wait().unwrap().success());
    assert_eq!(read_alerts(&received).len(), 9);
}

#[test]
fn test_receive_dry_run() {
    let port = free_port();
    let cmd = alertsim()
        .args(["receive", "--port", &port, "--dry-run"])
        .ok();
    assert!(cmd.is_ok(), "receive failed: {}", cmd.err().unwrap());
}

#[test]
fn test_receive_bad_group() {
    let cmd = alertsim()
        .args(["receive", "--port", &free_port(), "--group", "10.0.0.1"])
        .ok();
    assert!(cmd.is_err());
}
