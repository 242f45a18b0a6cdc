use cfgvault_cli::cli::{Cli, Command};
use cfgvault_cli::commands::{resolve_options, run};
use cfgvault_repr::Document;
use clap::Parser;
use std::path::{Path, PathBuf};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("cfgvault").chain(args.iter().copied())).unwrap()
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Argument Parsing Tests
// ============================================================================

#[test]
fn test_parse_export_with_flags() {
    let cli = parse(&["--profile", "/p", "--read-only", "export", "out.xml"]);

    assert!(matches!(&cli.command, Command::Export { file } if file == &PathBuf::from("out.xml")));
    assert_eq!(cli.profile, Some(PathBuf::from("/p")));
    assert!(cli.read_only);
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = parse(&["import", "in.xml", "--template", "seed.xml"]);

    assert!(matches!(cli.command, Command::Import { .. }));
    assert_eq!(cli.template, Some(PathBuf::from("seed.xml")));
}

#[test]
fn test_parse_verbose_anywhere() {
    assert!(!parse(&["clear-cache"]).verbose);
    assert!(parse(&["-v", "clear-cache"]).verbose);
    assert!(parse(&["export", "out.xml", "--verbose"]).verbose);
}

#[test]
fn test_parse_clear_cache() {
    let cli = parse(&["clear-cache"]);
    assert!(matches!(cli.command, Command::ClearCache));
}

#[test]
fn test_parse_rejects_missing_file() {
    assert!(Cli::try_parse_from(["cfgvault", "export"]).is_err());
    assert!(Cli::try_parse_from(["cfgvault"]).is_err());
}

// ============================================================================
// Option Resolution Tests
// ============================================================================

#[test]
fn test_profile_flag_sets_both_directories() {
    let cli = parse(&["--profile", "/roaming", "clear-cache"]);
    let options = resolve_options(&cli).unwrap();

    assert_eq!(options.profile_path, PathBuf::from("/roaming"));
    assert_eq!(options.local_profile_path, PathBuf::from("/roaming"));
}

#[test]
fn test_local_profile_flag_wins() {
    let cli = parse(&["--profile", "/roaming", "--local-profile", "/local", "clear-cache"]);
    let options = resolve_options(&cli).unwrap();

    assert_eq!(options.profile_path, PathBuf::from("/roaming"));
    assert_eq!(options.local_profile_path, PathBuf::from("/local"));
}

#[test]
fn test_options_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("options.json");
    std::fs::write(&file, r#"{ "profile_path": "/from/file", "lock_retries": 2 }"#).unwrap();

    let cli = parse(&["--options", &path_arg(&file), "clear-cache"]);
    let options = resolve_options(&cli).unwrap();

    assert_eq!(options.profile_path, PathBuf::from("/from/file"));
    assert_eq!(options.lock_retries, 2);
}

#[test]
fn test_bad_options_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("options.json");
    std::fs::write(&file, "not json").unwrap();

    let cli = parse(&["--options", &path_arg(&file), "clear-cache"]);
    assert!(resolve_options(&cli).is_err());
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn test_export_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("profile.xml");
    let mut diagnostics = Vec::new();

    let export = parse(&["--profile", &path_arg(&dir.path().join("a")), "export", &path_arg(&file)]);
    run(&export, &mut diagnostics).unwrap();

    let document = Document::load(&file).unwrap();
    assert!(document.version().is_some());
    assert!(document.root().first_child("generalconfig").is_some());

    let import = parse(&["--profile", &path_arg(&dir.path().join("b")), "import", &path_arg(&file)]);
    run(&import, &mut diagnostics).unwrap();
    assert!(diagnostics.is_empty());
}

#[test]
fn test_import_of_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cli = parse(&[
        "--profile",
        &path_arg(dir.path()),
        "import",
        &path_arg(&dir.path().join("absent.xml")),
    ]);

    let err = run(&cli, &mut Vec::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.xml"));
}

#[test]
fn test_diagnostics_are_printed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("colors.db"), vec![0x5au8; 4096]).unwrap();
    let file = dir.path().join("profile.xml");
    let mut diagnostics = Vec::new();

    let cli = parse(&["--profile", &path_arg(dir.path()), "export", &path_arg(&file)]);
    run(&cli, &mut diagnostics).unwrap();

    let text = String::from_utf8(diagnostics).unwrap();
    assert!(text.contains("colors.db:"));
    assert!(text.contains("renamed to *.bad"));
}

#[test]
fn test_clear_cache_on_fresh_profile() {
    let dir = tempfile::tempdir().unwrap();
    let cli = parse(&["--profile", &path_arg(dir.path()), "clear-cache"]);

    run(&cli, &mut Vec::new()).unwrap();
    assert!(dir.path().join("plugincache.db").exists());
}
