use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use snash::config::{Config, ConfigLoader};
use snash::error::{quote, report_error};
use snash::repl;

fn load_config() -> Config {
    let Some(path) = std::env::var_os("SNASH_CONFIG") else {
        return ConfigLoader::default_config();
    };
    ConfigLoader::load_from_file(&path).unwrap_or_else(|e| {
        report_error(&format!(
            "Could not load config {}: {}",
            quote(&path.to_string_lossy()),
            e
        ));
        ConfigLoader::default_config()
    })
}

fn main() {
    // Quiet unless RUST_LOG asks for more
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .init();

    let config = load_config();

    // Positional arguments are scripts
    let scripts: Vec<String> = std::env::args().skip(1).collect();
    let status = if scripts.is_empty() {
        repl::run(&config)
    } else {
        repl::run_scripts(&config, &scripts)
    };
    process::exit(status);
}
