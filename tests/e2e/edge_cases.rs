use super::*;

#[test]
fn scan_without_a_config_fails_with_a_hint() {
    let ctx = TestContext::new();
    let result = ctx.run_jsrecon(&["scan", "https://app.example.com"]);

    assert!(!result.success());
    assert!(
        result.stderr.contains("jsrecon.toml"),
        "stderr should mention the missing config.\n\nSTDERR:\n{}",
        result.stderr
    );
}

#[test]
fn scan_with_an_invalid_url_fails_cleanly() {
    let ctx = TestContext::new();
    assert_success(&ctx.run_jsrecon(&["init", "--yes"]));

    let result = ctx.run_jsrecon(&["scan", "not a url"]);

    assert!(!result.success());
    assert!(
        result.stderr.contains("invalid target URL") || result.stderr.contains("analysis failed"),
        "stderr should explain the failure.\n\nSTDERR:\n{}",
        result.stderr
    );
}

#[test]
fn check_in_remote_mode_requires_a_key() {
    let ctx = TestContext::new();
    ctx.write_file(
        "jsrecon.toml",
        r#"
[api]
mode = "remote"
url = "https://api.example.com/v1/chat/completions"
model = "gpt-4.1-mini"
"#,
    );

    let result = ctx.run_jsrecon(&["check"]);

    assert!(!result.success());
    assert!(
        result.stderr.contains("API key"),
        "stderr should mention the missing key.\n\nSTDERR:\n{}",
        result.stderr
    );
}

#[test]
fn malformed_config_is_rejected() {
    let ctx = TestContext::new();
    ctx.write_file("jsrecon.toml", "this is not toml = [");

    let result = ctx.run_jsrecon(&["models"]);

    assert!(!result.success());
}
