//! Shared `clap::Arg` builders. Each flag is its own small function so
//! commands can pick exactly the ones they need (and, where a flag doesn't
//! apply to a command, hide rather than omit it so `--help` stays uniform).

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction};

/// Directory configuration paths are resolved relative to (§6, §12).
pub fn config_dir_arg() -> Arg {
    Arg::new("config_dir")
        .short('C')
        .long("config-dir")
        .value_name("DIR")
        .value_parser(value_parser!(PathBuf))
        .default_value(".")
        .help("directory configuration document paths are resolved against")
}

/// Root configuration document, relative to `config_dir`.
pub fn root_arg() -> Arg {
    Arg::new("root")
        .long("root")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .default_value("trellis.toml")
        .help("root configuration document")
}

/// Optional extension configuration document, amending the root.
pub fn extension_arg() -> Arg {
    Arg::new("extension")
        .long("extension")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("extension configuration document")
}

/// IR document to transform, or `-` for stdin.
pub fn input_arg() -> Arg {
    Arg::new("input")
        .value_name("IR")
        .value_parser(value_parser!(PathBuf))
        .help("IR document (JSON); '-' reads stdin")
        .required(true)
}

/// Where to write the transformed IR document; stdout if omitted.
pub fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("write the transformed IR document here instead of stdout")
}

pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("emit debug-level tracing to stderr")
}
