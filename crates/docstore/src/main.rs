//! Docstore - Entry point

use std::path::PathBuf;

use tracing::{error, info, warn};

use docstore::config::{ConfigLoader, DocstoreConfig};
use docstore::server::ShutdownCoordinator;
use docstore::telemetry::{init_logging, LogConfig};

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,

    /// Path to a `.env` file.
    env_file: PathBuf,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut env_file = PathBuf::from(".env");

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--env-file" | "-e" => {
                    if let Some(path) = args.next() {
                        env_file = PathBuf::from(path);
                    }
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("docstore {}", docstore::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config, env_file }
    }
}

fn print_help() {
    println!(
        r#"Docstore - HTTP document store

USAGE:
    docstore [OPTIONS]

OPTIONS:
    -c, --config <PATH>      Path to configuration file (TOML or JSON)
    -e, --env-file <PATH>    Path to a .env file (default: .env)
    -h, --help               Print help information
    -v, --version            Print version information

ENVIRONMENT VARIABLES:
    PORT                     Listen port (required)
    DATABASE_URL             mongodb://, sqlite: or memory:// URL (required)
    MONGO_STRING             Legacy alias for DATABASE_URL
    LOG_LEVEL                Log filter directive (default: info)
    DOCSTORE__SECTION__KEY   Override any configuration field

ROUTES:
    POST /base/create         Create a document from {{"Data": ...}}
    GET  /base/{{id}}           Fetch a document
    GET  /base/delete/{{id}}    Delete a document
    GET  /base/since/{{date}}   List documents created after a UTC date
    *    /shutdown            Drain and stop the server

EXAMPLES:
    PORT=8080 DATABASE_URL=sqlite://docstore.db docstore
    docstore --config /etc/docstore/docstore.toml
"#
    );
}

fn load_config(args: &Args) -> Result<DocstoreConfig, docstore::config::ConfigError> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_file(path)?,
        None => ConfigLoader::new(),
    };
    loader.with_dotenv(&args.env_file)?.with_env()?.load()
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&LogConfig::from(&config.logging)) {
        eprintln!("Failed to initialise logging: {e}");
        std::process::exit(1);
    }

    info!(version = docstore::VERSION, "Starting docstore");

    let server = match docstore::build_server(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = format!("{e:#}"), "Failed to start server");
            std::process::exit(1);
        }
    };

    let coordinator = ShutdownCoordinator::new(server.config().shutdown_timeout());

    match server.run(coordinator).await {
        Ok(report) => {
            if report.outcome.is_timeout() {
                warn!(outcome = ?report.outcome, "Requests were still running at exit");
            }
            info!(
                trigger = %report.trigger,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Server gracefully shutdown"
            );
        }
        Err(e) => {
            error!(error = %e, "Server error");
            std::process::exit(1);
        }
    }
}
