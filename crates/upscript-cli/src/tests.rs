use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::Parser;
use upscript_core::PackageName;
use upscript_installer::{DispatchError, InstallationFailure, StateError, SyncError, UpdateError};

use super::*;
use crate::command_flows::launch_target;
use crate::exit_code::{
    EXIT_BAD_STATE, EXIT_ENTRY_POINT_NOT_FOUND, EXIT_FAILURE, EXIT_INSTALL_FAILED,
    EXIT_INVALID_PACKAGE_NAME, EXIT_USAGE,
};
use crate::render::{
    format_launcher_summary, render_status_line, resolve_output_style, OutputStyle,
};

fn sample_failure() -> InstallationFailure {
    InstallationFailure {
        package: "demo-tool".to_string(),
        status: "exit status: 1".to_string(),
        stdout: String::new(),
        stderr: "ERROR: No matching distribution found for demo-tool\n".to_string(),
    }
}

#[test]
fn fetch_parses_with_default_index() {
    let cli = Cli::try_parse_from(["upscript", "fetch", "Demo_Tool", "tools"])
        .expect("command must parse");
    match cli.command {
        Commands::Fetch {
            package,
            destination,
            index_url,
        } => {
            assert_eq!(package, "Demo_Tool");
            assert_eq!(destination, PathBuf::from("tools"));
            assert_eq!(index_url, "https://pypi.org/simple/");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn fetch_accepts_index_override() {
    let cli = Cli::try_parse_from([
        "upscript",
        "fetch",
        "demo",
        "tools",
        "--index-url",
        "http://localhost:8080/simple",
    ])
    .expect("command must parse");
    assert!(matches!(
        cli.command,
        Commands::Fetch { ref index_url, .. } if index_url == "http://localhost:8080/simple"
    ));
}

#[test]
fn launch_forwards_hyphenated_arguments_untouched() {
    let cli = Cli::try_parse_from([
        "upscript",
        "launch",
        "--environment",
        "/tools/.files",
        "--",
        "/tools/demo",
        "--help",
        "-v",
        "positional",
    ])
    .expect("command must parse");
    assert_eq!(cli.verbose, 0);
    match cli.command {
        Commands::Launch {
            environment,
            launcher,
            args,
        } => {
            assert_eq!(environment, PathBuf::from("/tools/.files"));
            assert_eq!(launcher, PathBuf::from("/tools/demo"));
            assert_eq!(
                args,
                vec![
                    OsString::from("--help"),
                    OsString::from("-v"),
                    OsString::from("positional")
                ]
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn launch_is_hidden_from_help() {
    let err = Cli::try_parse_from(["upscript", "--help"]).expect_err("help exits early");
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    let help = err.to_string();
    let listed = help
        .lines()
        .filter_map(|line| line.trim_start().split_whitespace().next())
        .collect::<Vec<_>>();
    assert!(listed.contains(&"fetch"));
    assert!(listed.contains(&"update"));
    assert!(!listed.contains(&"launch"));
}

#[test]
fn usage_errors_map_to_usage_exit_code() {
    let err = Cli::try_parse_from(["upscript", "fetch", "demo"]).expect_err("missing destination");
    assert_eq!(usage_exit_code(&err), EXIT_USAGE);

    let err = Cli::try_parse_from(["upscript", "install", "demo"]).expect_err("unknown command");
    assert_eq!(usage_exit_code(&err), EXIT_USAGE);

    let err = Cli::try_parse_from(["upscript", "--version"]).expect_err("version exits early");
    assert_eq!(usage_exit_code(&err), 0);
}

#[test]
fn invalid_package_name_maps_to_its_exit_code() {
    let err = anyhow::Error::from(PackageName::parse("bad name!").expect_err("must reject"));
    assert_eq!(exit_code_for_error(&err), EXIT_INVALID_PACKAGE_NAME);
}

#[test]
fn install_failures_map_to_install_exit_code() {
    let err = anyhow::Error::from(UpdateError::from(sample_failure()));
    assert_eq!(exit_code_for_error(&err), EXIT_INSTALL_FAILED);

    let err = anyhow::Error::from(SyncError::PackageNotInstalled {
        package: "demo".to_string(),
    })
    .context("failed to write launchers");
    assert_eq!(exit_code_for_error(&err), EXIT_INSTALL_FAILED);
}

#[test]
fn missing_entry_point_maps_to_its_own_exit_code() {
    let err = anyhow::Error::from(DispatchError::EntryPointNotFound {
        name: "stale".to_string(),
    });
    assert_eq!(exit_code_for_error(&err), EXIT_ENTRY_POINT_NOT_FOUND);
    assert_ne!(EXIT_ENTRY_POINT_NOT_FOUND, EXIT_INVALID_PACKAGE_NAME);
}

#[test]
fn bad_state_wins_over_the_wrapping_failure_class() {
    let corrupt = || StateError::CorruptState {
        path: PathBuf::from("/tools/.files/upscript-state.json"),
        reason: "expected value at line 1 column 1".to_string(),
    };
    for err in [
        anyhow::Error::from(UpdateError::from(corrupt())),
        anyhow::Error::from(SyncError::from(corrupt())),
        anyhow::Error::from(DispatchError::from(corrupt())),
        anyhow::Error::from(corrupt()).context("update aborted"),
    ] {
        assert_eq!(exit_code_for_error(&err), EXIT_BAD_STATE, "{err:#}");
    }

    let io = anyhow::Error::from(DispatchError::from(StateError::Io {
        path: PathBuf::from("/tools/.files/upscript-state.json"),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    }));
    assert_eq!(exit_code_for_error(&io), EXIT_FAILURE);
}

#[test]
fn unclassified_errors_map_to_generic_failure() {
    let err = anyhow::anyhow!("something else went wrong");
    assert_eq!(exit_code_for_error(&err), EXIT_FAILURE);
}

#[test]
fn child_exit_codes_pass_through_when_they_fit() {
    assert_eq!(exit_status_byte(0), 0);
    assert_eq!(exit_status_byte(3), 3);
    assert_eq!(exit_status_byte(130), 130);
    assert_eq!(exit_status_byte(-1), EXIT_FAILURE);
    assert_eq!(exit_status_byte(70_000), EXIT_FAILURE);
}

#[test]
fn launch_target_splits_name_and_directory() {
    let launcher = upscript_installer::launcher_path(Path::new("/tools"), "demo-admin");
    let (name, dir) = launch_target(&launcher).expect("must derive target");
    assert_eq!(name, "demo-admin");
    assert_eq!(dir, PathBuf::from("/tools"));

    let (name, dir) = launch_target(Path::new("demo")).expect("bare name");
    assert_eq!(name, "demo");
    assert_eq!(dir, PathBuf::from("."));

    launch_target(Path::new("/")).expect_err("root has no command name");
}

#[test]
fn resolve_output_style_uses_rich_only_for_terminal_stdout() {
    assert_eq!(resolve_output_style(true, true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(true, false), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false, true), OutputStyle::Plain);
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "installed demo-tool"),
        "installed demo-tool"
    );
}

#[test]
fn render_status_line_rich_includes_ascii_badge() {
    assert_eq!(
        render_status_line(OutputStyle::Rich, "ok", "installed demo-tool"),
        "[OK] installed demo-tool"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "stale launcher demo was already removed"),
        "[WARN] stale launcher demo was already removed"
    );
}

#[test]
fn error_report_includes_package_manager_output() {
    let err = anyhow::Error::from(UpdateError::from(sample_failure()));
    let lines = render_error_lines(OutputStyle::Rich, &err);
    assert_eq!(
        lines,
        vec![
            "[ERR] unable to install demo-tool: package manager exited with exit status: 1",
            "",
            "stderr:",
            "\tERROR: No matching distribution found for demo-tool",
        ]
    );

    let plain = render_error_lines(OutputStyle::Plain, &anyhow::anyhow!("boom"));
    assert_eq!(plain, vec!["boom"]);
}

#[test]
fn launcher_summary_mentions_removals_only_when_present() {
    assert_eq!(format_launcher_summary(1, 0), "wrote 1 launcher");
    assert_eq!(format_launcher_summary(3, 2), "wrote 3 launchers, removed 2 stale");
}
