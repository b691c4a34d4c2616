use std::path::PathBuf;

pub struct CheckArgs {
    pub config_dir: PathBuf,
    pub root: PathBuf,
    pub extension: Option<PathBuf>,
}

pub fn run(args: CheckArgs) {
    match trellis_engine::config::load(&args.config_dir, &args.root, args.extension.as_deref()) {
        Ok(_) => {
            // Silent on success (like cargo check).
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
