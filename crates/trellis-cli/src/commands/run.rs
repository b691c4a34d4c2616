use std::path::PathBuf;

use crate::util::{load_program, read_input};

pub struct RunArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub config_dir: PathBuf,
    pub root: PathBuf,
    pub extension: Option<PathBuf>,
}

pub fn run(args: RunArgs) {
    let config = match trellis_engine::config::load(&args.config_dir, &args.root, args.extension.as_deref())
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let text = read_input(&args.input).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    });

    let mut program = load_program(&text).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    });

    let outcome = trellis_engine::run(&mut program, &config);

    for (severity, message, span) in program.diagnostics.iter() {
        eprintln!("{:?}: {} ({})", severity, message, span);
    }

    if let Err(e) = outcome {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    let output_raw = trellis_core::raw::dump(&program);
    let json = trellis_core::raw::to_json(&output_raw).expect("serializing a raw tree never fails");

    match args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        None => println!("{}", json),
    }
}
