//! CLI surface: argument builders plus the assembled `Command`.

mod args;

#[cfg(test)]
mod mod_tests;

use clap::Command;

use args::*;

/// Build the complete CLI with both subcommands.
pub fn build_cli() -> Command {
    Command::new("trellis")
        .about("Source-to-source transformation engine for directive-annotated IR")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(run_command())
        .subcommand(check_command())
}

/// Run the full pipeline against an IR document.
pub fn run_command() -> Command {
    Command::new("run")
        .about("Apply the configured transformations to an IR document")
        .arg(input_arg())
        .arg(output_arg())
        .arg(config_dir_arg())
        .arg(root_arg())
        .arg(extension_arg())
        .arg(verbose_arg())
}

/// Validate a configuration document without transforming anything.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Load and validate a configuration document")
        .arg(config_dir_arg())
        .arg(root_arg())
        .arg(extension_arg())
        .arg(verbose_arg())
}
