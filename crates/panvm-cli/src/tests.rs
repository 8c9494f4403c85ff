use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use clap::error::ErrorKind;
use clap::CommandFactory;
use panvm_core::{InstallSlot, ToolVersion, VersionSpec};
use panvm_installer::{ActiveVersionPolicy, AliasTarget};

use super::*;
use crate::completion::write_completions_script;
use crate::config::{select_token, ConfigPolicy, PanvmConfig};
use crate::dispatch::{ensure_snapshot_extension, exit_status_byte, managed_spec};
use crate::prompt::is_affirmative;
use crate::render::{render_installed_line, render_status_line, resolve_output_style, OutputStyle};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "panvm-cli-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&path).expect("must create test dir");
    path
}

fn v(text: &str) -> ToolVersion {
    ToolVersion::parse(text).expect("version must parse")
}

fn config_with_default(value: &str) -> PanvmConfig {
    PanvmConfig {
        default_version: Some(value.to_string()),
        ..PanvmConfig::default()
    }
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn install_parses_optional_version_and_force() {
    let cli = Cli::try_parse_from(["panvm", "install", "3.1.2", "--force"]).expect("must parse");
    match cli.command {
        Commands::Install { version, force } => {
            assert_eq!(version.as_deref(), Some("3.1.2"));
            assert!(force);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = Cli::try_parse_from(["panvm", "install"]).expect("must parse");
    assert!(matches!(
        cli.command,
        Commands::Install {
            version: None,
            force: false
        }
    ));
}

#[test]
fn global_flags_are_accepted_after_subcommand() {
    let cli = Cli::try_parse_from(["panvm", "list", "--root", "/tmp/panvm-root", "--verbose"])
        .expect("must parse");
    assert_eq!(cli.root, Some(PathBuf::from("/tmp/panvm-root")));
    assert!(cli.verbose);
}

#[test]
fn nightly_rejects_zero_n_last() {
    let cli = Cli::try_parse_from(["panvm", "nightly", "--n-last", "3"]).expect("must parse");
    assert!(matches!(cli.command, Commands::Nightly { n_last: 3 }));

    let err = Cli::try_parse_from(["panvm", "nightly", "--n-last", "0"])
        .expect_err("zero must be rejected");
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}

#[test]
fn run_forwards_hyphenated_arguments() {
    let cli = Cli::try_parse_from([
        "panvm", "run", "--use", "3.1.1", "--", "-f", "markdown", "--to", "html",
    ])
    .expect("must parse");
    match cli.command {
        Commands::Run { use_version, args } => {
            assert_eq!(use_version.as_deref(), Some("3.1.1"));
            assert_eq!(args, ["-f", "markdown", "--to", "html"]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn completions_require_known_shell() {
    let err = Cli::try_parse_from(["panvm", "completions", "tcsh"]).expect_err("must reject");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn completion_script_names_the_binary() {
    let mut script = Vec::new();
    write_completions_script(CliCompletionShell::Bash, &mut script).expect("must generate");
    let script = String::from_utf8(script).expect("must be utf-8");
    assert!(script.contains("panvm"));
    assert!(script.contains("install"));
}

#[test]
fn config_is_default_when_file_is_missing() {
    let root = test_dir();
    let config = PanvmConfig::load(&root.join("config.toml")).expect("must load");
    assert_eq!(config, PanvmConfig::default());
    assert_eq!(config.api_url(), panvm_catalog::DEFAULT_API_URL);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn config_round_trips_through_toml() {
    let root = test_dir();
    let path = root.join("nested").join("config.toml");
    let config = PanvmConfig {
        github_api_url: Some("https://ghe.example.test/api/v3".to_string()),
        default_version: Some("3.1.2".to_string()),
        ..PanvmConfig::default()
    };

    config.save(&path).expect("must save");
    let content = fs::read_to_string(&path).expect("must read");
    assert!(content.contains("default_version = \"3.1.2\""));
    assert!(!content.contains("github_token"));

    let loaded = PanvmConfig::load(&path).expect("must load");
    assert_eq!(loaded, config);
    assert_eq!(loaded.api_url(), "https://ghe.example.test/api/v3");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn malformed_config_reports_its_path() {
    let root = test_dir();
    let path = root.join("config.toml");
    fs::write(&path, "default_version = [").expect("must write");

    let err = PanvmConfig::load(&path).expect_err("must fail");
    assert!(err.to_string().contains("failed parsing config"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn token_prefers_environment_then_config() {
    assert_eq!(
        select_token([Some("env-pat".to_string()), None], Some("configured")),
        Some("env-pat".to_string())
    );
    assert_eq!(
        select_token([Some("  ".to_string()), Some("env-token".to_string())], None),
        Some("env-token".to_string())
    );
    assert_eq!(
        select_token([None, None], Some("configured")),
        Some("configured".to_string())
    );
    assert_eq!(select_token([None, None], Some(" ")), None);
}

#[test]
fn config_policy_starts_on_installed_default() {
    let policy = ConfigPolicy::new(&config_with_default("2.19.2"));
    let installed = vec![
        InstallSlot::Nightly,
        InstallSlot::Release(v("3.1.2")),
        InstallSlot::Release(v("2.19.2")),
    ];
    assert_eq!(
        policy.initial_active(&installed),
        Some(InstallSlot::Release(v("2.19.2")))
    );

    let policy = ConfigPolicy::new(&config_with_default("3.0"));
    assert_eq!(
        policy.initial_active(&installed),
        Some(InstallSlot::Release(v("3.1.2")))
    );
}

#[test]
fn config_policy_maps_only_default_alias() {
    let policy = ConfigPolicy::new(&config_with_default("nightly"));
    assert_eq!(
        policy.resolve_alias("default"),
        AliasTarget::Managed(InstallSlot::Nightly)
    );
    assert_eq!(policy.resolve_alias("system"), AliasTarget::External);

    let unset = ConfigPolicy::new(&PanvmConfig::default());
    assert_eq!(unset.resolve_alias("default"), AliasTarget::External);

    let alias_as_default = ConfigPolicy::new(&config_with_default("system"));
    assert_eq!(alias_as_default.resolve_alias("default"), AliasTarget::External);
}

#[test]
fn managed_spec_resolves_default_and_refuses_external_aliases() {
    let policy = ConfigPolicy::new(&config_with_default("3.1.1"));
    assert_eq!(
        managed_spec(&policy, VersionSpec::parse("default")).expect("must resolve"),
        VersionSpec::Specific(v("3.1.1"))
    );
    assert_eq!(
        managed_spec(&policy, VersionSpec::parse("latest")).expect("must pass through"),
        VersionSpec::Latest
    );

    let err = managed_spec(&policy, VersionSpec::parse("system")).expect_err("must refuse");
    assert!(err.to_string().contains("'system'"));
}

#[test]
fn snapshot_path_must_be_json() {
    ensure_snapshot_extension(Path::new("releases.json")).expect("json must pass");
    let err = ensure_snapshot_extension(Path::new("releases.toml")).expect_err("must fail");
    assert!(err.to_string().contains(".json"));
}

#[test]
fn exit_status_is_forwarded() {
    assert_eq!(exit_status_byte(Some(0)), 0);
    assert_eq!(exit_status_byte(Some(64)), 64);
    assert_eq!(exit_status_byte(Some(300)), 1);
    assert_eq!(exit_status_byte(Some(-1)), 1);
    assert_eq!(exit_status_byte(None), 1);
}

#[test]
fn prompt_answers_are_case_insensitive() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative("\n"));
    assert!(!is_affirmative("nope"));
}

#[test]
fn resolve_output_style_uses_rich_only_for_colored_tty() {
    assert_eq!(resolve_output_style(true, false), OutputStyle::Rich);
    assert_eq!(resolve_output_style(true, true), OutputStyle::Plain);
    assert_eq!(resolve_output_style(false, false), OutputStyle::Plain);
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "installed pandoc 3.1.2"),
        "installed pandoc 3.1.2"
    );
}

#[test]
fn render_status_line_rich_includes_ascii_badge() {
    assert_eq!(
        render_status_line(OutputStyle::Rich, "ok", "installed pandoc 3.1.2"),
        "[OK] installed pandoc 3.1.2"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "pandoc 2.9 is not installed"),
        "[WARN] pandoc 2.9 is not installed"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "step", "pandoc 3.1.2 is already installed"),
        "[..] pandoc 3.1.2 is already installed"
    );
}

#[test]
fn installed_lines_mark_the_active_version() {
    assert_eq!(render_installed_line(OutputStyle::Plain, "3.1.2", true), "* 3.1.2");
    assert_eq!(render_installed_line(OutputStyle::Plain, "2.19.2", false), "  2.19.2");
    assert!(render_installed_line(OutputStyle::Rich, "3.1.2", true).contains("3.1.2"));
}
