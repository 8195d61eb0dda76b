// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs::File, io::Write};

use clap::Parser;
use tempfile::TempDir;

use super::*;

const SURVEY: &str = "test_files/survey.json";
const CATALOG: &str = "test_files/catalog.yaml";

fn args(extra: &[&str]) -> SimulateArgs {
    let mut v = vec!["simulate", "--survey", SURVEY, "--catalog", CATALOG];
    v.extend_from_slice(extra);
    SimulateArgs::parse_from(v)
}

fn parse_err(extra: &[&str]) -> String {
    match args(extra).parse() {
        Ok(_) => panic!("expected an error for {extra:?}"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn test_cli_args_override_arg_file() {
    let tmp = TempDir::new().unwrap();
    let arg_file = tmp.path().join("args.toml");
    let mut f = File::create(&arg_file).unwrap();
    writeln!(
        f,
        r#"
[survey]
survey = "{SURVEY}"
night = "0,2"

[catalog]
catalog = "{CATALOG}"
radius = 1.0

[output]
port = 9000
token = "from-file"
"#
    )
    .unwrap();
    drop(f);

    let arg_file = arg_file.display().to_string();
    let merged = SimulateArgs::parse_from(["simulate", arg_file.as_str(), "--port", "9100", "--no-header"])
        .merge()
        .unwrap();
    assert!(merged.args_file.is_none());
    assert_eq!(merged.survey_args.survey.as_deref(), Some(std::path::Path::new(SURVEY)));
    assert_eq!(merged.survey_args.night.as_deref(), Some("0,2"));
    assert_eq!(merged.catalog_args.radius, Some(1.0));
    assert_eq!(merged.output_args.port, Some(9100));
    assert!(merged.output_args.no_header);
    assert_eq!(merged.output_args.token.as_deref(), Some("from-file"));

    let params = merged.parse().unwrap();
    assert_eq!(params.constraint.night, Some(NumberOrRange::Range(0, 2)));
    assert_eq!(params.token.as_deref(), Some("from-file"));
    match params.sink {
        SinkParams::Tcp { addr, header, .. } => {
            assert_eq!(addr.port(), 9100);
            assert!(!header);
        }
        other => panic!("unexpected sink {other:?}"),
    }
}

#[test]
fn test_json_arg_file() {
    let tmp = TempDir::new().unwrap();
    let arg_file = tmp.path().join("args.json");
    std::fs::write(
        &arg_file,
        format!(
            r#"{{"survey": {{"survey": "{SURVEY}"}}, "catalog": {{"catalog": "{CATALOG}", "all_objects": true}}, "alerts": {{"history": "full"}}}}"#
        ),
    )
    .unwrap();

    let arg_file = arg_file.display().to_string();
    let params = SimulateArgs::parse_from(["simulate", arg_file.as_str()])
        .merge()
        .unwrap()
        .parse()
        .unwrap();
    assert!(!params.selection.variable_only);
    assert_eq!(params.assemble.history, HistoryMode::Full);
}

#[test]
fn test_saved_toml_can_be_read_back() {
    let tmp = TempDir::new().unwrap();
    let original = args(&["--mag-limit", "r=24", "--mag-limit", "g=25.5", "--no-dia"]);
    let toml_file = tmp.path().join("saved.toml");
    std::fs::write(&toml_file, toml::to_string(&original).unwrap()).unwrap();

    let toml_file = toml_file.display().to_string();
    let read_back = SimulateArgs::parse_from(["simulate", toml_file.as_str()])
        .merge()
        .unwrap();
    assert_eq!(read_back.survey_args.survey, original.survey_args.survey);
    assert_eq!(
        read_back.catalog_args.mag_limit,
        Some(vec!["r=24".to_string(), "g=25.5".to_string()])
    );
    assert!(read_back.alert_args.no_dia);
}

#[test]
fn test_bad_arg_file_extension() {
    let tmp = TempDir::new().unwrap();
    let arg_file = tmp.path().join("args.ini");
    std::fs::write(&arg_file, "").unwrap();
    let arg_file = arg_file.display().to_string();
    let result = SimulateArgs::parse_from(["simulate", arg_file.as_str()]).merge();
    assert!(matches!(result, Err(AlertsimError::ArgFile(_))));
}

#[test]
fn test_defaults() {
    let params = args(&[]).parse().unwrap();
    assert_eq!(params.constraint, SurveyConstraint::default());
    assert_eq!(params.lookback_days, DEFAULT_LOOKBACK_DAYS);
    assert_eq!(params.selection, CatalogSelection::default());
    assert_eq!(params.assemble.history, HistoryMode::Incremental);
    assert!(params.assemble.full_dia);
    assert_eq!(params.chunk_size.get(), DEFAULT_CHUNK_SIZE);
    assert!(params.token.is_none());
    assert_eq!(params.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
    match params.sink {
        SinkParams::Tcp {
            addr,
            header,
            format,
        } => {
            assert_eq!(addr.port(), DEFAULT_PORT);
            assert!(addr.ip().is_loopback());
            assert!(header);
            assert_eq!(format, PayloadFormat::VoEvent);
        }
        other => panic!("unexpected sink {other:?}"),
    }
}

#[test]
fn test_sink_choices() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().display().to_string();

    let params = args(&["--sink", "JSON", "-o", &out]).parse().unwrap();
    assert_eq!(params.sink, SinkParams::JsonFiles { dir: tmp.path().to_path_buf() });

    let params = args(&["--sink", "avro", "-o", &out]).parse().unwrap();
    assert_eq!(params.sink.sink_type(), SinkType::Avro);

    let params = args(&["--sink", "docstore", "-o", &out]).parse().unwrap();
    assert_eq!(params.sink.sink_type(), SinkType::DocStore);

    let params = args(&["--sink", "multicast", "--host", "239.0.0.1", "--ttl", "3", "--payload", "json"])
        .parse()
        .unwrap();
    match params.sink {
        SinkParams::Multicast { addr, ttl, format } => {
            assert!(addr.ip().is_multicast());
            assert_eq!(ttl, 3);
            assert_eq!(format, PayloadFormat::Json);
        }
        other => panic!("unexpected sink {other:?}"),
    }

    let params = args(&["--sink", "unicast", "-p", "9999"]).parse().unwrap();
    assert_eq!(params.sink.sink_type(), SinkType::Unicast);
}

#[test]
fn test_constraints_and_limits() {
    let params = args(&[
        "--night",
        "1",
        "--filter",
        "G",
        "--mjd",
        "59580,59582.5",
        "--lookback",
        "30",
        "--radius",
        "0.5",
        "--all-objects",
        "--mag-limit",
        "i=23.5",
    ])
    .parse()
    .unwrap();
    assert_eq!(params.constraint.night, Some(NumberOrRange::Single(1)));
    assert_eq!(params.constraint.filter, Some(Band::G));
    assert_eq!(
        params.constraint.mjd,
        Some(NumberOrRange::Range(59580.0, 59582.5))
    );
    assert_eq!(params.lookback_days, 30.0);
    assert!(!params.selection.variable_only);
    assert_eq!(params.selection.mag_limits, vec![(Band::I, 23.5)]);
}

#[test]
fn test_parse_errors() {
    let no_survey = SimulateArgs::parse_from(["simulate", "--catalog", CATALOG]).parse();
    assert!(matches!(no_survey, Err(AlertsimError::Simulate(_))));

    let no_catalog = SimulateArgs::parse_from(["simulate", "--survey", SURVEY]).parse();
    assert!(matches!(no_catalog, Err(AlertsimError::Simulate(_))));

    assert!(parse_err(&["--history", "everything"]).contains("everything"));
    assert!(parse_err(&["--sink", "kafka"]).contains("kafka"));
    assert!(parse_err(&["--payload", "xml"]).contains("xml"));
    assert!(parse_err(&["--filter", "q"]).contains("'q'"));
    assert!(parse_err(&["--mag-limit", "r24"]).contains("r24"));
    assert!(parse_err(&["--mag-limit", "q=24"]).contains("q=24"));
    assert!(parse_err(&["--chunk-size", "0"]).contains("chunk size"));
    assert!(parse_err(&["--token", ""]).contains("token"));
    assert!(parse_err(&["--lookback=-1"]).contains("lookback"));
    assert!(parse_err(&["--sink", "json"]).contains("--output"));
    assert!(parse_err(&["--night", "5,1"]).contains("5,1"));

    let missing = SimulateArgs::parse_from([
        "simulate",
        "--survey",
        "test_files/nothing_here.json",
        "--catalog",
        CATALOG,
    ])
    .parse();
    assert!(matches!(missing, Err(AlertsimError::Survey(_))));

    assert!(matches!(
        args(&["--radius=-1"]).parse(),
        Err(AlertsimError::Catalog(_))
    ));
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("alerts");
    let state = tmp.path().join("state");
    let out_str = out.display().to_string();
    let state_str = state.display().to_string();
    let a = args(&[
        "--sink",
        "json",
        "-o",
        &out_str,
        "--token",
        "dry",
        "--state-dir",
        &state_str,
    ]);
    a.run(true).unwrap();
    assert!(!out.exists());
    assert!(!state.exists());
}

#[test]
fn test_run_to_json_files() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("alerts");
    let out_str = out.display().to_string();
    args(&["--sink", "json", "-o", &out_str]).run(false).unwrap();

    // Objects 1001, 1002 and 2001 are on chips 2211, 1201 and 3122.
    let mut files: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort_unstable();
    assert_eq!(files, ["1201.json", "2211.json", "3122.json"]);

    // Three pointings per field, one alert per object per pointing.
    let alerts = std::fs::read_to_string(out.join("2211.json")).unwrap();
    assert_eq!(alerts.lines().count(), 3);
    let last: serde_json::Value = serde_json::from_str(alerts.lines().last().unwrap()).unwrap();
    assert_eq!(last["alertId"], 10_010_000_005_u64);
    assert_eq!(last["prvDiaSources"].as_array().unwrap().len(), 2);
}
