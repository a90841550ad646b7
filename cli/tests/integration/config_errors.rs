//! Missing or invalid `AZP_*` input fails with exit 1 before any network call.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::cli_tests::pool_agent;

const URL: &str = "https://dev.azure.com/contoso";
const CLIENT_ID: &str = "11111111-2222-3333-4444-555555555555";

#[test]
fn test_run_without_url_names_azp_url() {
    pool_agent()
        .arg("run")
        .env("AZP_CLIENTID", CLIENT_ID)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AZP_URL"));
}

#[test]
fn test_run_without_client_id_names_azp_clientid() {
    pool_agent()
        .arg("run")
        .env("AZP_URL", URL)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AZP_CLIENTID"));
}

#[test]
fn test_run_with_nothing_reports_url_first() {
    pool_agent()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AZP_URL"))
        .stderr(predicate::str::contains("AZP_CLIENTID").not());
}

#[test]
fn test_blank_client_id_counts_as_missing() {
    pool_agent()
        .arg("check")
        .env("AZP_URL", URL)
        .env("AZP_CLIENTID", "   ")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AZP_CLIENTID"));
}

#[test]
fn test_non_http_url_is_invalid() {
    pool_agent()
        .arg("run")
        .env("AZP_URL", "contoso")
        .env("AZP_CLIENTID", CLIENT_ID)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid value for AZP_URL"));
}

#[test]
fn test_zero_retry_interval_is_invalid() {
    pool_agent()
        .arg("run")
        .env("AZP_URL", URL)
        .env("AZP_CLIENTID", CLIENT_ID)
        .env("AZP_REMOVE_RETRY_SECS", "0")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AZP_REMOVE_RETRY_SECS"));
}

#[test]
fn test_json_error_object_on_stdout() {
    let output = pool_agent()
        .args(["run", "--json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "configuration");
}

#[test]
fn test_remove_without_installed_agent_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    pool_agent()
        .arg("remove")
        .env("AZP_URL", URL)
        .env("AZP_CLIENTID", CLIENT_ID)
        .env("AZP_AGENT_DIR", dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no agent is installed"));
}
