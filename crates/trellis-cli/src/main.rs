//! CLI driver binary: parses arguments, initializes tracing, and dispatches
//! to the `run`/`check` subcommands.

mod cli;
mod commands;
mod util;

use std::path::PathBuf;

fn main() {
    let matches = cli::build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", m)) => {
            util::init_tracing(m.get_flag("verbose"));
            let args = commands::run::RunArgs {
                input: m.get_one::<PathBuf>("input").expect("required").clone(),
                output: m.get_one::<PathBuf>("output").cloned(),
                config_dir: m.get_one::<PathBuf>("config_dir").expect("has default").clone(),
                root: m.get_one::<PathBuf>("root").expect("has default").clone(),
                extension: m.get_one::<PathBuf>("extension").cloned(),
            };
            commands::run::run(args);
        }
        Some(("check", m)) => {
            util::init_tracing(m.get_flag("verbose"));
            let args = commands::check::CheckArgs {
                config_dir: m.get_one::<PathBuf>("config_dir").expect("has default").clone(),
                root: m.get_one::<PathBuf>("root").expect("has default").clone(),
                extension: m.get_one::<PathBuf>("extension").cloned(),
            };
            commands::check::run(args);
        }
        _ => unreachable!("clap should have caught this"),
    }
}
