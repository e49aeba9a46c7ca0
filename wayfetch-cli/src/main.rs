//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use wayfetch_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match wayfetch_cli::run() {
        Ok(()) => {}
        // Help and version requests are reported through clap's own exit path.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("wayfetch: {err}");
            std::process::exit(1);
        }
    }
}
