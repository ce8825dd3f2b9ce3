//! Connecter probe: attempt one outbound connection and report the outcome.

use clap::{ArgAction, Parser};
use connecter::error::ErrorCategory;
use connecter::net::{connect_blocking, Connecter, Endpoint};
use connecter::ConnectOptions;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Exit codes of `connecter-probe`.
struct ExitCode;

impl ExitCode {
    /// Connection established.
    const SUCCESS: i32 = 0;
    /// The network refused or dropped the attempt; retrying may help.
    const CONNECT_FAILED: i32 = 1;
    /// Bad arguments, address, or environment configuration.
    const USAGE_ERROR: i32 = 2;
    /// The connecter reported an invariant violation.
    const INTERNAL_ERROR: i32 = 3;
}

#[derive(Parser, Debug)]
#[command(
    name = "connecter-probe",
    version,
    about = "Attempt one outbound stream connection"
)]
struct Cli {
    /// Target as protocol://address, e.g. tcp://127.0.0.1:5555 or ipc:///tmp/app.sock
    uri: String,

    /// Give up after this many milliseconds
    #[arg(long = "timeout-ms", default_value_t = 5000)]
    timeout_ms: u64,

    /// Leave Nagle's algorithm enabled
    #[arg(long = "no-nodelay", action = ArgAction::SetTrue)]
    no_nodelay: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbosity: u8,
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn exit_code_for(err: &connecter::Error) -> i32 {
    match err.category() {
        ErrorCategory::Config => ExitCode::USAGE_ERROR,
        ErrorCategory::Invariant => ExitCode::INTERNAL_ERROR,
        ErrorCategory::Network | ErrorCategory::Resource => ExitCode::CONNECT_FAILED,
    }
}

fn run(cli: &Cli) -> i32 {
    let options = match ConnectOptions::from_env() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::USAGE_ERROR;
        }
    };
    let options = if cli.no_nodelay {
        options.nodelay(false)
    } else {
        options
    };

    let endpoint = match Endpoint::parse_uri(&cli.uri) {
        Ok(endpoint) => endpoint,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_code_for(&err);
        }
    };

    let mut connecter = Connecter::for_endpoint(endpoint.clone(), options);
    let started = Instant::now();
    match connect_blocking(&mut connecter, Duration::from_millis(cli.timeout_ms)) {
        Ok(connection) => {
            println!(
                "connected to {endpoint} ({:?}) in {:.3}ms",
                connection.family(),
                started.elapsed().as_secs_f64() * 1000.0
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            exit_code_for(&err)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    std::process::exit(run(&cli));
}
