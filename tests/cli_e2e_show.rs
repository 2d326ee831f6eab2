//! End-to-end tests for the `show` command.
//!
//! These tests invoke the actual CLI binary and validate the behavior of the
//! `show` subcommand from a user's perspective.

mod common;
use common::prelude::*;

/// Test that show --help flag shows help information
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_help() {
    let mut cmd = cargo_bin_cmd!("asset-composer");

    cmd.arg("show")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Print the resolved configuration as JSON",
        ))
        .stdout(predicate::str::contains("--context"))
        .stdout(predicate::str::contains("[JSON]"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_key_path() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);

    fixture
        .command()
        .arg("show")
        .arg("--path")
        .arg("name")
        .assert()
        .success()
        .stdout("fixture\n");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_override_and_debug_flag() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);

    fixture
        .command()
        .arg("show")
        .arg("--debug")
        .arg("--path")
        .arg("hashAlgorithm")
        .assert()
        .success()
        .stdout("md4\n");

    fixture
        .command()
        .arg("show")
        .arg("--path")
        .arg("hashAlgorithm")
        .arg(r#"{"hashAlgorithm": "sha512"}"#)
        .assert()
        .success()
        .stdout("sha512\n");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_context_from_environment() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);
    let elsewhere = assert_fs::TempDir::new().unwrap();

    let mut cmd = fixture.command();
    cmd.current_dir(elsewhere.path())
        .env("ASSET_COMPOSER_CONTEXT", fixture.context())
        .arg("show")
        .arg("--path")
        .arg("path.context")
        .assert()
        .success()
        .stdout(format!("{}/\n", fixture.context().display()));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_node_env_selects_debug() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);

    fixture
        .command()
        .env("NODE_ENV", "development")
        .arg("show")
        .arg("--path")
        .arg("debug")
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_missing_key_fails() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);

    fixture
        .command()
        .arg("show")
        .arg("--path")
        .arg("no.such.key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No configuration value at 'no.such.key'"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_show_malformed_override_fails() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);

    fixture
        .command()
        .arg("show")
        .arg("{broken")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration override"));
}
