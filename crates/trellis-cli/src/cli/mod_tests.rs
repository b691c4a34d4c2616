use std::path::PathBuf;

use super::build_cli;

#[test]
fn run_requires_an_input_argument() {
    let cli = build_cli();
    let result = cli.try_get_matches_from(["trellis", "run"]);
    assert!(result.is_err());
}

#[test]
fn run_accepts_input_and_config_flags() {
    let cli = build_cli();
    let m = cli
        .try_get_matches_from(["trellis", "run", "ir.json", "--config-dir", "conf", "-v"])
        .unwrap();
    let (name, sub) = m.subcommand().unwrap();
    assert_eq!(name, "run");
    assert_eq!(sub.get_one::<PathBuf>("input").unwrap(), &PathBuf::from("ir.json"));
    assert_eq!(sub.get_one::<PathBuf>("config_dir").unwrap(), &PathBuf::from("conf"));
    assert!(sub.get_flag("verbose"));
}

#[test]
fn run_defaults_root_to_trellis_toml() {
    let cli = build_cli();
    let m = cli.try_get_matches_from(["trellis", "run", "ir.json"]).unwrap();
    let (_, sub) = m.subcommand().unwrap();
    assert_eq!(sub.get_one::<PathBuf>("root").unwrap(), &PathBuf::from("trellis.toml"));
}

#[test]
fn check_needs_no_positional_input() {
    let cli = build_cli();
    let result = cli.try_get_matches_from(["trellis", "check"]);
    assert!(result.is_ok());
}
