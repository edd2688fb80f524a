//! Focused unit tests covering ingest CLI configuration and validation.

use super::helpers::Workspace;
use super::*;
use camino::Utf8PathBuf;
use geozip_ingest::{DEFAULT_ITEM_SIZE_LIMIT, DecodeFailurePolicy, ProbeFailurePolicy};
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn unset_arguments_fall_back_to_defaults() {
    let config = IngestConfig::from(IngestArgs::default());

    assert_eq!(config.input, Utf8PathBuf::from("output.txt"));
    assert_eq!(config.store, Utf8PathBuf::from("geo_zip.db"));
    assert_eq!(config.ledger, Utf8PathBuf::from("new_errors.csv"));
    assert_eq!(config.retry_ledger, Utf8PathBuf::from("errors.csv"));
    assert_eq!(config.cursor, 0);
    assert_eq!(config.mode, ModeArg::Full);
    assert_eq!(config.decode_policy, DecodeFailurePolicy::Abort);
    assert_eq!(config.probe_policy, ProbeFailurePolicy::Insert);
    assert_eq!(config.item_size_limit, DEFAULT_ITEM_SIZE_LIMIT);
}

#[rstest]
fn flags_parse_into_ingest_arguments() {
    let cli = Cli::try_parse_from([
        "geozip",
        "ingest",
        "--input",
        "regions.ndjson",
        "--cursor",
        "42",
        "--mode",
        "retry-only",
        "--retry-ledger",
        "old.csv",
        "--on-decode-error",
        "record",
        "--on-probe-error",
        "record",
        "--item-size-limit",
        "1024",
    ])
    .expect("flags should parse");

    let Command::Ingest(args) = cli.command;
    let config = IngestConfig::from(args);
    assert_eq!(config.input, Utf8PathBuf::from("regions.ndjson"));
    assert_eq!(config.cursor, 42);
    assert_eq!(config.mode, ModeArg::RetryOnly);
    assert_eq!(config.retry_ledger, Utf8PathBuf::from("old.csv"));
    assert_eq!(config.decode_policy, DecodeFailurePolicy::Record);
    assert_eq!(config.probe_policy, ProbeFailurePolicy::Record);
    assert_eq!(config.item_size_limit, 1024);
}

#[rstest]
#[case("--mode", "partial")]
#[case("--cursor", "-3")]
#[case("--on-probe-error", "ignore")]
fn invalid_flag_values_are_rejected(#[case] flag: &str, #[case] value: &str) {
    let err = Cli::try_parse_from(["geozip", "ingest", flag, value])
        .expect_err("invalid value should fail");
    assert_ne!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[rstest]
fn validate_sources_reports_missing_input() {
    let workspace = Workspace::new();
    let config = IngestConfig::from(workspace.args());

    let err = config.validate_sources().expect_err("missing input");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(path, workspace.input());
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let workspace = Workspace::new();
    let config = IngestConfig {
        input: workspace.path(""),
        ..IngestConfig::from(workspace.args())
    };

    let err = config.validate_sources().expect_err("directory input");
    match err {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_INPUT),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
#[case(ModeArg::Full, true)]
#[case(ModeArg::RetryOnly, false)]
fn retry_ledger_is_only_required_for_retry_runs(#[case] mode: ModeArg, #[case] valid: bool) {
    let workspace = Workspace::new();
    workspace.write_input();
    let config = IngestConfig {
        mode,
        ..IngestConfig::from(workspace.args())
    };

    match config.validate_sources() {
        Ok(()) => assert!(valid, "retry-only run should need a ledger"),
        Err(CliError::MissingSourceFile { field, .. }) => {
            assert!(!valid);
            assert_eq!(field, ARG_RETRY_LEDGER);
        }
        Err(other) => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "cursor": "not-a-number" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "input": "from-file.ndjson",
            "store": "from-file.db",
            "cursor": 10,
            "mode": "retry-only",
        }),
        None,
    );
    composer.push_environment(json!({
        "store": "from-env.db",
        "cursor": 20,
    }));
    composer.push_cli(json!({
        "cursor": 30,
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.input, Utf8PathBuf::from("from-file.ndjson"));
    assert_eq!(config.store, Utf8PathBuf::from("from-env.db"));
    assert_eq!(config.cursor, 30);
    assert_eq!(config.mode, ModeArg::RetryOnly);
    assert_eq!(config.ledger, Utf8PathBuf::from("new_errors.csv"));
}

#[rstest]
#[case(DecodeErrorArg::Abort, DecodeFailurePolicy::Abort)]
#[case(DecodeErrorArg::Record, DecodeFailurePolicy::Record)]
fn decode_arguments_map_to_policies(
    #[case] arg: DecodeErrorArg,
    #[case] expected: DecodeFailurePolicy,
) {
    assert_eq!(DecodeFailurePolicy::from(arg), expected);
}

#[rstest]
#[case(ProbeErrorArg::Insert, ProbeFailurePolicy::Insert)]
#[case(ProbeErrorArg::Record, ProbeFailurePolicy::Record)]
fn probe_arguments_map_to_policies(
    #[case] arg: ProbeErrorArg,
    #[case] expected: ProbeFailurePolicy,
) {
    assert_eq!(ProbeFailurePolicy::from(arg), expected);
}
