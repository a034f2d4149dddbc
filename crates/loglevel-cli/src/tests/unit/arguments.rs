//! Tests for the argument normalisation applied before clap parsing.

use std::ffi::OsString;

use rstest::rstest;

use crate::config::split_config_arguments;
use crate::{normalise_arguments, prepare_cli_arguments};

fn os(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}

#[rstest]
#[case(&["loglevel", "-?"], &["loglevel", "--help"])]
#[case(&["loglevel", "-help"], &["loglevel", "--help"])]
#[case(&["loglevel", "-h"], &["loglevel", "-h"])]
#[case(&["loglevel", "LIST", "1", "ROOT"], &["loglevel", "list", "1", "ROOT"])]
#[case(
    &["loglevel", "--output", "JSON", "Set", "1", "-?", "FINE"],
    &["loglevel", "--output", "JSON", "set", "1", "-?", "FINE"]
)]
#[case(&["loglevel", "--output=json", "J"], &["loglevel", "--output=json", "j"])]
fn normalises_leading_tokens(#[case] input: &[&str], #[case] expected: &[&str]) {
    assert_eq!(normalise_arguments(os(input)), os(expected));
}

#[test]
fn config_flags_are_removed_from_command_arguments() {
    let args = os(&[
        "loglevel",
        "--connect-timeout-ms",
        "250",
        "list",
        "17",
        "root",
    ]);
    let split = split_config_arguments(&args);
    assert_eq!(
        prepare_cli_arguments(&args, &split),
        os(&["loglevel", "list", "17", "root"])
    );
}
