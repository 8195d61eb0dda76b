// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod checkpoint;
mod no_stderr;
mod receive;
mod simulate;

use std::{path::PathBuf, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};

fn alertsim() -> Command {
    Command::cargo_bin("alertsim").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

struct Files {
    survey: String,
    catalog: String,
}

/// The small survey and catalog in the repo: two fields with three visits
/// each, and three variable objects that are bright enough to be seen.
fn get_test_files() -> Files {
    // Use absolute paths.
    let test_files = PathBuf::from("test_files").canonicalize().unwrap();
    let survey = test_files.join("survey.json");
    let catalog = test_files.join("catalog.yaml");
    for file in [&survey, &catalog] {
        assert!(
            file.exists(),
            "Could not find '{}', which is required for this test",
            file.display()
        );
    }
    Files {
        survey: survey.display().to_string(),
        catalog: catalog.display().to_string(),
    }
}
