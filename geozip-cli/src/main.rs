//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = geozip_cli::run() {
        eprintln!("geozip: {err}");
        std::process::exit(1);
    }
}
