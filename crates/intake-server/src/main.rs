use std::path::Path;

use clap::Parser;
use intake_server::ServerBuilder;
use intake_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use intake_server::observability::{apply_logging_level, init_tracing};

#[derive(Parser)]
#[command(name = "intake-server")]
#[command(about = "Patient intake service with real-time message relay")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "INTAKE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    // Initialize tracing early with the default level
    init_tracing();

    let cfg = match load_config(Some(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    apply_logging_level(&cfg.logging.level);
    tracing::info!(
        path = %cli.config,
        file_found = Path::new(&cli.config).exists(),
        backend = ?cfg.storage.backend,
        "Configuration loaded"
    );

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Server initialization failed: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "Server error");
        std::process::exit(1);
    }
}
