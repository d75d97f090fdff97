use super::*;

use jsrecon::config::ApiMode;

#[test]
fn init_runs_without_error() {
    let ctx = TestContext::new();
    let result = ctx.run_jsrecon(&["init", "--yes"]);

    assert_success(&result);
    ctx.assert_file_exists("jsrecon.toml");
}

#[test]
fn init_defaults_to_the_local_backend() {
    let ctx = TestContext::new();
    let result = ctx.run_jsrecon(&["init", "--yes"]);

    assert_success(&result);

    let config = ctx.load_config();
    assert_eq!(config.api.mode, ApiMode::Local);
    assert!(config.api.url.contains("127.0.0.1"));
}

#[test]
fn init_global_writes_under_the_home_dir() {
    let ctx = TestContext::new();
    let result = ctx.run_jsrecon(&["init", "--yes", "--global"]);

    assert_success(&result);
    ctx.assert_file_exists(".jsrecon/config.toml");
}

#[test]
fn help_lists_the_scan_command() {
    let ctx = TestContext::new();
    let result = ctx.run_jsrecon(&["--help"]);

    assert_success(&result);
    assert_output_contains(&result, "scan");
    assert_output_contains(&result, "chat");
}

#[test]
fn chat_clear_succeeds_with_a_config() {
    let ctx = TestContext::new();
    assert_success(&ctx.run_jsrecon(&["init", "--yes"]));

    let result = ctx.run_jsrecon(&["chat", "--clear"]);

    assert_success(&result);
    assert_output_contains(&result, "Chat history cleared");
}
