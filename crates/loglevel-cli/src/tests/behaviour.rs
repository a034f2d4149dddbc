//! BDD step definitions for CLI behavioural tests.
//!
//! These steps map the scenarios in `tests/features/loglevel_cli.feature` to
//! harness operations that run the CLI against a fake management agent.

use super::support::*;

use std::cell::RefCell;

use loglevel_core::test_support::{BRIDGED_REGISTRY, NATIVE_REGISTRY};
use rstest_bdd_macros::{given, scenario, then, when};

fn registry_logger_name(name: &str) -> &str {
    match name.trim() {
        "root" => "",
        other => other,
    }
}

#[given("a native logger {name} with level {level}")]
fn given_native_logger(world: &RefCell<TestWorld>, name: String, level: String) {
    world
        .borrow_mut()
        .add_native_logger(registry_logger_name(&name), Some(level.trim()));
}

#[given("a bridged logger {name} with level {level}")]
fn given_bridged_logger(world: &RefCell<TestWorld>, name: String, level: String) {
    world
        .borrow_mut()
        .add_bridged_logger(registry_logger_name(&name), Some(level.trim()));
}

#[given("the management agent URL is configured")]
fn given_agent_url(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_agent()
        .expect("failed to start fake agent");
}

#[given("a JVM advertising the management agent")]
fn given_advertising_jvm(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_advertising_jvm()
        .expect("failed to publish advertising JVM");
}

#[given("a JVM without a management agent")]
fn given_unreachable_jvm(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_unreachable_jvm()
        .expect("failed to publish JVM");
}

#[when("the operator runs {command}")]
fn when_operator_runs(world: &RefCell<TestWorld>, command: String) {
    world.borrow_mut().run(&command);
}

#[then("the CLI succeeds")]
fn then_success(world: &RefCell<TestWorld>) {
    world
        .borrow()
        .assert_success()
        .expect("CLI did not succeed");
}

#[then("the CLI fails")]
fn then_failure(world: &RefCell<TestWorld>) {
    world
        .borrow()
        .assert_failure()
        .expect("CLI did not fail as expected");
}

#[then("stdout is {expected}")]
fn then_stdout_is(world: &RefCell<TestWorld>, expected: String) {
    let stdout = world.borrow().stdout_text().expect("stdout text");
    assert_eq!(stdout.trim_end(), expected.trim_matches('"'));
}

#[then("stdout contains {snippet}")]
fn then_stdout_contains(world: &RefCell<TestWorld>, snippet: String) {
    let stdout = world.borrow().stdout_text().expect("stdout text");
    let snippet = snippet.trim_matches('"');
    assert!(
        stdout.contains(snippet),
        "stdout {stdout:?} did not contain {snippet:?}"
    );
}

#[then("stderr contains {snippet}")]
fn then_stderr_contains(world: &RefCell<TestWorld>, snippet: String) {
    let stderr = world.borrow().stderr_text().expect("stderr text");
    let snippet = snippet.trim_matches('"');
    assert!(
        stderr.contains(snippet),
        "stderr {stderr:?} did not contain {snippet:?}"
    );
}

#[then("the bridged root logger has no explicit level")]
fn then_bridged_root_cleared(world: &RefCell<TestWorld>) {
    let level = world
        .borrow()
        .served_level(BRIDGED_REGISTRY, "")
        .expect("served level");
    assert_eq!(level, None);
}

#[then("the native logger {name} is at {level}")]
fn then_native_level(world: &RefCell<TestWorld>, name: String, level: String) {
    let served = world
        .borrow()
        .served_level(NATIVE_REGISTRY, registry_logger_name(&name))
        .expect("served level");
    assert_eq!(served.as_deref(), Some(level.trim()));
}

#[scenario(path = "tests/features/loglevel_cli.feature")]
fn loglevel_cli_behaviour(world: RefCell<TestWorld>) {
    let _ = world;
}
